//! # Order Store
//!
//! In-memory store for the full order lifecycle: placement, status
//! progression, priority, item edits, cancellation, and the kitchen queue.
//!
//! ## Locking
//! One mutex guards the order map. Every operation takes the lock, works,
//! and releases before returning; nothing here awaits while holding it.
//! Events go out on the [`UpdateBus`] after the mutation is committed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use splitease_core::{
    validation, ChargeSchedule, CoreError, KitchenTicket, MenuCatalog, Order, OrderItem,
    OrderPriority, OrderStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::events::{LiveUpdate, UpdateBus};

// =============================================================================
// Requests
// =============================================================================

/// One requested line on a new order or an item addition.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: String,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub modifications: Vec<String>,
}

impl NewOrderItem {
    pub fn new(menu_item_id: impl Into<String>, quantity: i64) -> Self {
        NewOrderItem {
            menu_item_id: menu_item_id.into(),
            quantity,
            instructions: None,
            modifications: Vec::new(),
        }
    }
}

/// A new order request.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub table_number: u32,
    pub customer_id: Option<String>,
    pub waiter_id: Option<String>,
    pub priority: OrderPriority,
    pub items: Vec<NewOrderItem>,
}

// =============================================================================
// Order Store
// =============================================================================

/// Order lifecycle store.
///
/// Cheap to clone handles are not provided; wrap in [`Arc`] and share.
#[derive(Debug)]
pub struct OrderStore {
    catalog: Arc<MenuCatalog>,
    schedule: ChargeSchedule,
    orders: Mutex<HashMap<String, Order>>,
    bus: Arc<UpdateBus>,
}

impl OrderStore {
    /// Creates a store with the order-time estimate schedule (8% tax,
    /// 5% service).
    pub fn new(catalog: Arc<MenuCatalog>, bus: Arc<UpdateBus>) -> Self {
        Self::with_schedule(catalog, bus, ChargeSchedule::ORDER_ESTIMATE)
    }

    /// Creates a store with an explicit charge schedule. A venue that wants
    /// order totals to match the final invoice passes
    /// [`ChargeSchedule::INVOICE`] here.
    pub fn with_schedule(
        catalog: Arc<MenuCatalog>,
        bus: Arc<UpdateBus>,
        schedule: ChargeSchedule,
    ) -> Self {
        OrderStore {
            catalog,
            schedule,
            orders: Mutex::new(HashMap::new()),
            bus,
        }
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Places a new order for a table.
    ///
    /// Validates the table number and every line, snapshots menu prices onto
    /// the order, and computes the estimated ready time from the slowest
    /// dish on the ticket.
    pub fn create_order(&self, req: NewOrder) -> StoreResult<Order> {
        validation::validate_table_number(req.table_number).map_err(CoreError::from)?;
        if req.items.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        validation::validate_order_size(req.items.len().saturating_sub(1))
            .map_err(CoreError::from)?;

        let mut items = Vec::with_capacity(req.items.len());
        for line in &req.items {
            items.push(self.snapshot_line(line)?);
        }

        let now = Utc::now();
        let mut order = Order {
            id: Uuid::new_v4().to_string(),
            table_number: req.table_number,
            customer_id: req.customer_id,
            waiter_id: req.waiter_id,
            items,
            status: OrderStatus::Pending,
            priority: req.priority,
            subtotal_cents: 0,
            tax_cents: 0,
            service_cents: 0,
            total_cents: 0,
            notes: None,
            created_at: now,
            updated_at: now,
            estimated_ready_at: None,
            actual_ready_at: None,
            served_at: None,
        };
        order.recompute_totals(self.schedule);
        self.refresh_estimate(&mut order);

        info!(
            order_id = %order.id,
            table = order.table_number,
            items = order.items.len(),
            total_cents = order.total_cents,
            "Order placed"
        );

        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());

        self.bus.publish(LiveUpdate::OrderPlaced {
            order_id: order.id.clone(),
            table_number: order.table_number,
        });

        Ok(order)
    }

    /// Validates one requested line and freezes menu data onto it.
    fn snapshot_line(&self, line: &NewOrderItem) -> StoreResult<OrderItem> {
        validation::validate_quantity(line.quantity).map_err(CoreError::from)?;
        if let Some(text) = &line.instructions {
            validation::validate_instructions(text).map_err(CoreError::from)?;
        }

        let menu_item = self.catalog.get_available(&line.menu_item_id)?;
        Ok(OrderItem {
            id: Uuid::new_v4().to_string(),
            menu_item_id: menu_item.id.clone(),
            name: menu_item.name.clone(),
            unit_price_cents: menu_item.price_cents,
            quantity: line.quantity,
            line_total_cents: menu_item.price_cents * line.quantity,
            instructions: line.instructions.clone(),
            modifications: line.modifications.clone(),
        })
    }

    /// Estimated ready time: placement time plus the slowest dish.
    fn refresh_estimate(&self, order: &mut Order) {
        let minutes = order.longest_prep_minutes(|id| self.catalog.prep_minutes(id));
        order.estimated_ready_at = Some(order.created_at + Duration::minutes(i64::from(minutes)));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetches one order by id.
    pub fn get(&self, order_id: &str) -> StoreResult<Order> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// All orders, newest first.
    pub fn list(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.lock().unwrap().values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders for one table, newest first.
    pub fn by_table(&self, table_number: u32) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.table_number == table_number)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders that have not reached a terminal state, newest first.
    pub fn active(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| !o.status.is_terminal())
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Kitchen display queue: confirmed and preparing orders, most urgent
    /// first, oldest first within a priority band.
    pub fn kitchen_queue(&self) -> Vec<KitchenTicket> {
        let mut tickets: Vec<KitchenTicket> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter_map(KitchenTicket::project)
            .collect();
        tickets.sort_by(|a, b| {
            b.priority
                .rank()
                .cmp(&a.priority.rank())
                .then(a.placed_at.cmp(&b.placed_at))
        });
        tickets
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Moves an order to the next status.
    ///
    /// Same-status updates are an idempotent touch: `updated_at` moves,
    /// nothing else changes and no event is published. Entering Ready stamps
    /// `actual_ready_at`; entering Served stamps `served_at`.
    pub fn update_status(&self, order_id: &str, next: OrderStatus) -> StoreResult<Order> {
        let (order, from) = self.with_order_mut(order_id, |order| {
            let from = order.status;
            if !from.can_transition_to(next) {
                return Err(CoreError::InvalidStatusTransition {
                    order_id: order.id.clone(),
                    from,
                    to: next,
                }
                .into());
            }

            let now = Utc::now();
            order.updated_at = now;
            if from == next {
                return Ok(None);
            }

            order.status = next;
            match next {
                OrderStatus::Ready => order.actual_ready_at = Some(now),
                OrderStatus::Served => order.served_at = Some(now),
                _ => {}
            }
            Ok(Some(from))
        })?;

        if let Some(from) = from {
            info!(order_id = %order.id, status = %order.status, "Order status changed");
            self.bus.publish(LiveUpdate::OrderStatusChanged {
                order_id: order.id.clone(),
                table_number: order.table_number,
                from,
                to: next,
            });
        }
        Ok(order)
    }

    /// Changes the kitchen priority of an order.
    pub fn update_priority(&self, order_id: &str, priority: OrderPriority) -> StoreResult<Order> {
        let (order, changed) = self.with_order_mut(order_id, |order| {
            if order.status.is_terminal() {
                return Err(CoreError::OrderLocked {
                    order_id: order.id.clone(),
                    status: order.status,
                }
                .into());
            }
            let changed = order.priority != priority;
            order.priority = priority;
            order.updated_at = Utc::now();
            Ok(changed)
        })?;

        if changed {
            self.bus.publish(LiveUpdate::OrderPriorityChanged {
                order_id: order.id.clone(),
                priority,
            });
        }
        Ok(order)
    }

    /// Adds a line to an order that the kitchen has not started.
    pub fn add_item(&self, order_id: &str, line: NewOrderItem) -> StoreResult<Order> {
        let item = self.snapshot_line(&line)?;
        let (order, _) = self.with_order_mut(order_id, |order| {
            ensure_editable(order)?;
            validation::validate_order_size(order.items.len()).map_err(CoreError::from)?;

            order.items.push(item);
            order.recompute_totals(self.schedule);
            // Slowest dish may have changed.
            let minutes = order.longest_prep_minutes(|id| self.catalog.prep_minutes(id));
            order.estimated_ready_at =
                Some(order.created_at + Duration::minutes(i64::from(minutes)));
            order.updated_at = Utc::now();
            Ok(())
        })?;
        Ok(order)
    }

    /// Removes a line from an order that the kitchen has not started.
    ///
    /// Removing the last line is rejected; cancel the order instead.
    pub fn remove_item(&self, order_id: &str, item_id: &str) -> StoreResult<Order> {
        let (order, _) = self.with_order_mut(order_id, |order| {
            ensure_editable(order)?;
            if order.item(item_id).is_none() {
                return Err(CoreError::ItemNotInOrder {
                    order_id: order.id.clone(),
                    item_id: item_id.to_string(),
                }
                .into());
            }
            if order.items.len() == 1 {
                return Err(CoreError::EmptyOrder.into());
            }

            order.items.retain(|i| i.id != item_id);
            order.recompute_totals(self.schedule);
            order.updated_at = Utc::now();
            Ok(true)
        })?;
        Ok(order)
    }

    /// Cancels an order with a reason.
    ///
    /// Served orders cannot be cancelled; the rejection comes back as an
    /// [`CoreError::InvalidStatusTransition`]. The reason is appended to the
    /// order notes.
    pub fn cancel_order(&self, order_id: &str, reason: &str) -> StoreResult<Order> {
        let (order, _) = self.with_order_mut(order_id, |order| {
            if !order.status.can_transition_to(OrderStatus::Cancelled) {
                return Err(CoreError::InvalidStatusTransition {
                    order_id: order.id.clone(),
                    from: order.status,
                    to: OrderStatus::Cancelled,
                }
                .into());
            }
            order.status = OrderStatus::Cancelled;
            order.append_note(&format!("cancelled: {reason}"));
            order.updated_at = Utc::now();
            Ok(true)
        })?;

        info!(order_id = %order.id, reason, "Order cancelled");
        self.bus.publish(LiveUpdate::OrderCancelled {
            order_id: order.id.clone(),
            table_number: order.table_number,
            reason: reason.to_string(),
        });
        Ok(order)
    }

    // =========================================================================
    // Persistence hooks
    // =========================================================================

    /// Every order, unsorted. Feed for the snapshot writer.
    pub fn export(&self) -> Vec<Order> {
        self.orders.lock().unwrap().values().cloned().collect()
    }

    /// Replaces the store contents from a loaded snapshot.
    pub fn restore(&self, orders: Vec<Order>) {
        let mut map = self.orders.lock().unwrap();
        map.clear();
        for order in orders {
            map.insert(order.id.clone(), order);
        }
    }

    /// Drops every order. Explicit and loud, never a silent fallback.
    pub fn reset(&self) {
        self.orders.lock().unwrap().clear();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Runs a closure against one order under the lock, returning the
    /// updated order and the closure's result.
    fn with_order_mut<T>(
        &self,
        order_id: &str,
        f: impl FnOnce(&mut Order) -> StoreResult<T>,
    ) -> StoreResult<(Order, T)> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::from(CoreError::OrderNotFound(order_id.to_string())))?;
        let value = f(order)?;
        Ok((order.clone(), value))
    }
}

/// Item edits are only allowed before the kitchen starts cooking.
fn ensure_editable(order: &Order) -> StoreResult<()> {
    match order.status {
        OrderStatus::Pending | OrderStatus::Confirmed => Ok(()),
        status => Err(CoreError::OrderLocked {
            order_id: order.id.clone(),
            status,
        }
        .into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
