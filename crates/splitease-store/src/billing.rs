//! # Billing Store
//!
//! Bill generation from served orders, discounts, splitting, payment
//! settlement through the gateway, and refunds.
//!
//! ## Concurrency
//! One mutex guards the bill map and is never held across an `.await`.
//! Before anything else a payment claims the bill's in-flight slot; a
//! second payment request for the same bill fails immediately with
//! [`StoreError::PaymentInFlight`] instead of racing the first one to a
//! double charge. The status read and the final mutation both happen
//! with the slot held, so a bill can never be observed Pending by two
//! settlements.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Payment Settlement                                   │
//! │                                                                         │
//! │  process_payment(bill)                                                  │
//! │    1. claim in-flight slot (fail fast if taken)                         │
//! │    2. lock bills ── check status, read amount ── unlock                 │
//! │    3. gateway charge (lock NOT held, retries inside)                    │
//! │    4. lock bills ── re-check status, record, mark paid ── unlock        │
//! │    5. release in-flight slot (also on failure)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use splitease_core::{
    validation, Bill, BillItem, BillStatus, ChargeSchedule, CoreError, Money, Order, OrderStatus,
    PaymentMethod, PaymentRecord, SplitDetails, SplitKind,
};
use splitease_gateway::{
    charge_with_retry, GatewayReceipt, GatewayResult, PaymentGateway, RetryPolicy,
};

use crate::error::{StoreError, StoreResult};
use crate::events::{LiveUpdate, UpdateBus};
use crate::orders::OrderStore;
use crate::split::{self, SplitPlan};

// =============================================================================
// Billing Store
// =============================================================================

/// Bill and payment store, generic over the payment gateway.
#[derive(Debug)]
pub struct BillingStore<G> {
    orders: Arc<OrderStore>,
    gateway: G,
    retry: RetryPolicy,
    schedule: ChargeSchedule,
    bills: Mutex<HashMap<String, Bill>>,
    in_flight: Mutex<HashSet<String>>,
    bus: Arc<UpdateBus>,
}

impl<G: PaymentGateway> BillingStore<G> {
    pub fn new(orders: Arc<OrderStore>, gateway: G, bus: Arc<UpdateBus>) -> Self {
        Self::with_schedule(orders, gateway, bus, ChargeSchedule::INVOICE)
    }

    pub fn with_schedule(
        orders: Arc<OrderStore>,
        gateway: G,
        bus: Arc<UpdateBus>,
        schedule: ChargeSchedule,
    ) -> Self {
        BillingStore {
            orders,
            gateway,
            retry: RetryPolicy::default(),
            schedule,
            bills: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            bus,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Generates a bill for a table.
    ///
    /// With `order_ids` empty, every served, not-yet-billed order at the
    /// table goes on the bill; orders already referenced by a live bill are
    /// skipped, so calling twice never double-bills. With ids given, exactly
    /// those orders are billed, which lets one sitting be settled across
    /// several bills. Each named order must exist at the table, be served,
    /// and not sit on a live bill already.
    ///
    /// Line items are copied from the orders, and the store's charge
    /// schedule (10% tax, 12% service by default) is applied to the
    /// combined subtotal.
    pub fn generate_bill(&self, table_number: u32, order_ids: &[String]) -> StoreResult<Bill> {
        validation::validate_table_number(table_number).map_err(CoreError::from)?;

        let billed: HashSet<String> = self
            .bills
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.status != BillStatus::Refunded)
            .flat_map(|b| b.order_ids.iter().cloned())
            .collect();

        let at_table = self.orders.by_table(table_number);
        let orders: Vec<Order> = if order_ids.is_empty() {
            at_table
                .into_iter()
                .filter(|o| o.status == OrderStatus::Served && !billed.contains(&o.id))
                .collect()
        } else {
            let mut picked = Vec::with_capacity(order_ids.len());
            for id in order_ids {
                let order = at_table
                    .iter()
                    .find(|o| &o.id == id)
                    .cloned()
                    .ok_or_else(|| CoreError::OrderNotFound(id.clone()))?;
                if order.status != OrderStatus::Served {
                    return Err(CoreError::OrderNotBillable {
                        order_id: order.id,
                        status: order.status,
                    }
                    .into());
                }
                if billed.contains(&order.id) {
                    return Err(CoreError::OrderAlreadyBilled(order.id).into());
                }
                picked.push(order);
            }
            picked
        };
        if orders.is_empty() {
            return Err(CoreError::NoOrdersToBill {
                table: table_number,
            }
            .into());
        }

        let mut items = Vec::new();
        for order in &orders {
            for line in &order.items {
                items.push(BillItem {
                    id: Uuid::new_v4().to_string(),
                    order_id: order.id.clone(),
                    menu_item_id: line.menu_item_id.clone(),
                    name: line.name.clone(),
                    unit_price_cents: line.unit_price_cents,
                    quantity: line.quantity,
                    line_total_cents: line.line_total_cents,
                    assigned_to: None,
                });
            }
        }

        let subtotal: Money = items.iter().map(BillItem::line_total).sum();
        let breakdown = self.schedule.breakdown(subtotal);

        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            table_number,
            order_ids: orders.iter().map(|o| o.id.clone()).collect(),
            items,
            subtotal_cents: breakdown.subtotal.cents(),
            tax_cents: breakdown.tax.cents(),
            service_cents: breakdown.service.cents(),
            discount_cents: 0,
            total_cents: breakdown.total.cents(),
            status: BillStatus::Pending,
            split: None,
            payments: Vec::new(),
            created_at: Utc::now(),
            paid_at: None,
        };

        info!(
            bill_id = %bill.id,
            table = table_number,
            orders = bill.order_ids.len(),
            total_cents = bill.total_cents,
            "Bill generated"
        );

        self.bills
            .lock()
            .unwrap()
            .insert(bill.id.clone(), bill.clone());

        self.bus.publish(LiveUpdate::BillGenerated {
            bill_id: bill.id.clone(),
            table_number,
            total_cents: bill.total_cents,
        });

        Ok(bill)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, bill_id: &str) -> StoreResult<Bill> {
        self.bills
            .lock()
            .unwrap()
            .get(bill_id)
            .cloned()
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()).into())
    }

    /// All bills, newest first.
    pub fn list(&self) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self.bills.lock().unwrap().values().cloned().collect();
        bills.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bills
    }

    /// Bills for one table, newest first.
    pub fn by_table(&self, table_number: u32) -> Vec<Bill> {
        let mut bills: Vec<Bill> = self
            .bills
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.table_number == table_number)
            .cloned()
            .collect();
        bills.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bills
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Sets the discount on a pending bill and recomputes the total.
    ///
    /// Zero clears a previous discount. The total clamps at zero; a discount
    /// can make a bill free, never negative.
    pub fn apply_discount(&self, bill_id: &str, discount_cents: i64) -> StoreResult<Bill> {
        validation::validate_discount_cents(discount_cents).map_err(CoreError::from)?;

        let (bill, _) = self.with_bill_mut(bill_id, |bill| {
            ensure_status(bill, BillStatus::Pending)?;
            bill.discount_cents = discount_cents;
            bill.recompute_total();
            Ok(())
        })?;

        self.bus.publish(LiveUpdate::DiscountApplied {
            bill_id: bill.id.clone(),
            discount_cents,
        });
        Ok(bill)
    }

    // =========================================================================
    // Whole-Bill Payment
    // =========================================================================

    /// Settles a pending bill in full.
    ///
    /// A paid bill rejects with [`CoreError::AlreadyPaid`]; a split bill
    /// must go through [`BillingStore::pay_share`] instead. While the
    /// gateway call is outstanding the bill is marked in flight and any
    /// concurrent payment attempt fails fast.
    pub async fn process_payment(
        &self,
        bill_id: &str,
        method: PaymentMethod,
    ) -> StoreResult<Bill> {
        // The slot is claimed before the status read; a payment can only
        // observe Pending while no other payment holds the bill.
        self.claim_in_flight(bill_id)?;
        let result = self.settle_bill(bill_id, method).await;
        self.release_in_flight(bill_id);
        let (bill, receipt) = match result {
            Ok(settled) => settled,
            Err(err) => {
                warn!(bill_id, %err, "Payment failed");
                return Err(err);
            }
        };

        info!(
            bill_id = %bill.id,
            transaction_id = %receipt.transaction_id,
            amount_cents = bill.total_cents,
            %method,
            "Payment settled"
        );
        self.bus.publish(LiveUpdate::PaymentSettled {
            bill_id: bill.id.clone(),
            amount_cents: bill.total_cents,
            method,
        });
        Ok(bill)
    }

    // =========================================================================
    // Splitting
    // =========================================================================

    /// Starts a split on a pending bill.
    ///
    /// Equal, custom, and percentage plans compute their share amounts here;
    /// a by-item plan creates zeroed shares that fill in at finalization.
    /// The bill moves to [`BillStatus::Split`].
    pub fn initiate_split(&self, bill_id: &str, plan: SplitPlan) -> StoreResult<Bill> {
        let (bill, shares) = self.with_bill_mut(bill_id, |bill| {
            ensure_status(bill, BillStatus::Pending)?;
            let shares = split::plan_shares(bill, &plan)?;
            let count = shares.len();
            bill.split = Some(SplitDetails {
                kind: plan.kind(),
                shares,
                finalized: false,
            });
            bill.status = BillStatus::Split;
            Ok(count)
        })?;

        info!(bill_id = %bill.id, kind = ?plan.kind(), shares, "Split initiated");
        self.bus.publish(LiveUpdate::SplitInitiated {
            bill_id: bill.id.clone(),
            shares,
        });
        Ok(bill)
    }

    /// Assigns a bill line to a customer in a by-item split.
    ///
    /// When the assignment completes the picture (no line left unowned) the
    /// share amounts are recomputed so the table sees live totals before
    /// the split is finalized.
    pub fn assign_item(
        &self,
        bill_id: &str,
        item_id: &str,
        customer: &str,
    ) -> StoreResult<Bill> {
        let (bill, _) = self.with_bill_mut(bill_id, |bill| {
            let id = bill.id.clone();
            let split = bill
                .split
                .as_ref()
                .ok_or_else(|| CoreError::SplitNotInitiated(id.clone()))?;
            if split.finalized {
                return Err(CoreError::SplitAlreadyFinalized(id).into());
            }
            if split.kind != SplitKind::ByItem {
                return Err(CoreError::SplitKindMismatch {
                    bill_id: id,
                    expected: SplitKind::ByItem,
                    actual: split.kind,
                }
                .into());
            }
            if split.share(customer).is_none() {
                return Err(CoreError::ShareNotFound {
                    bill_id: id,
                    customer: customer.to_string(),
                }
                .into());
            }

            let item = bill.item_mut(item_id).ok_or_else(|| CoreError::ItemNotOnBill {
                bill_id: bill_id.to_string(),
                item_id: item_id.to_string(),
            })?;
            item.assigned_to = Some(customer.to_string());

            // Once every line has an owner the share amounts can be shown
            // live; until then they stay at zero.
            if bill.items.iter().all(|i| i.assigned_to.is_some()) {
                let customers: Vec<String> = bill
                    .split
                    .as_ref()
                    .map(|s| s.shares.iter().map(|s| s.customer.clone()).collect())
                    .unwrap_or_default();
                let shares = split::compute_by_item_shares(bill, &customers)?;
                if let Some(split) = bill.split.as_mut() {
                    split.shares = shares;
                }
            }
            Ok(())
        })?;
        Ok(bill)
    }

    /// Locks the split in. After this, shares are payable and neither the
    /// plan nor the assignments can change.
    ///
    /// By-item splits compute their share amounts here; every plan is then
    /// checked to cover the bill total within one cent.
    pub fn finalize_split(&self, bill_id: &str) -> StoreResult<Bill> {
        let (bill, _) = self.with_bill_mut(bill_id, |bill| {
            let id = bill.id.clone();
            let split = bill
                .split
                .as_ref()
                .ok_or_else(|| CoreError::SplitNotInitiated(id.clone()))?;
            if split.finalized {
                return Err(CoreError::SplitAlreadyFinalized(id).into());
            }

            if split.kind == SplitKind::ByItem {
                let customers: Vec<String> =
                    split.shares.iter().map(|s| s.customer.clone()).collect();
                let shares = split::compute_by_item_shares(bill, &customers)?;
                if let Some(split) = bill.split.as_mut() {
                    split.shares = shares;
                }
            }

            let split = bill.split.as_ref().ok_or(CoreError::SplitNotInitiated(id))?;
            split::check_shares_cover_total(bill, &split.shares)?;
            if let Some(split) = bill.split.as_mut() {
                split.finalized = true;
            }
            Ok(())
        })?;

        info!(bill_id = %bill.id, "Split finalized");
        self.bus.publish(LiveUpdate::SplitFinalized {
            bill_id: bill.id.clone(),
        });
        Ok(bill)
    }

    /// Settles one customer's share of a finalized split.
    ///
    /// When the last share settles the bill flips to Paid and `paid_at` is
    /// stamped. The same per-bill in-flight guard as whole-bill payment
    /// applies, so two people at the table cannot race the gateway.
    pub async fn pay_share(
        &self,
        bill_id: &str,
        customer: &str,
        method: PaymentMethod,
    ) -> StoreResult<Bill> {
        self.claim_in_flight(bill_id)?;
        let result = self.settle_share(bill_id, customer, method).await;
        self.release_in_flight(bill_id);
        let (bill, amount, fully_paid) = match result {
            Ok(settled) => settled,
            Err(err) => {
                warn!(bill_id, customer, %err, "Share payment failed");
                return Err(err);
            }
        };

        info!(
            bill_id = %bill.id,
            customer,
            amount_cents = amount.cents(),
            fully_paid,
            "Share settled"
        );
        self.bus.publish(LiveUpdate::SharePaid {
            bill_id: bill.id.clone(),
            customer: customer.to_string(),
            amount_cents: amount.cents(),
        });
        if fully_paid {
            self.bus.publish(LiveUpdate::PaymentSettled {
                bill_id: bill.id.clone(),
                amount_cents: bill.total_cents,
                method,
            });
        }
        Ok(bill)
    }

    // =========================================================================
    // Refunds
    // =========================================================================

    /// Refunds a paid bill in full, one gateway refund per settled payment.
    ///
    /// Cash payments are marked refunded locally; they settle at the till.
    pub async fn refund_bill(&self, bill_id: &str) -> StoreResult<Bill> {
        self.claim_in_flight(bill_id)?;
        let result = self.settle_refund(bill_id).await;
        self.release_in_flight(bill_id);
        let bill = result?;

        info!(bill_id = %bill.id, amount_cents = bill.total_cents, "Bill refunded");
        self.bus.publish(LiveUpdate::BillRefunded {
            bill_id: bill.id.clone(),
            amount_cents: bill.total_cents,
        });
        Ok(bill)
    }

    // =========================================================================
    // Persistence hooks
    // =========================================================================

    /// Every bill, unsorted. Feed for the snapshot writer.
    pub fn export(&self) -> Vec<Bill> {
        self.bills.lock().unwrap().values().cloned().collect()
    }

    /// Replaces the store contents from a loaded snapshot.
    pub fn restore(&self, bills: Vec<Bill>) {
        let mut map = self.bills.lock().unwrap();
        map.clear();
        for bill in bills {
            map.insert(bill.id.clone(), bill);
        }
    }

    /// Drops every bill.
    pub fn reset(&self) {
        self.bills.lock().unwrap().clear();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Routes a charge: card and wallet go to the gateway with retries,
    /// cash settles at the till and only mints a local receipt.
    async fn settle(&self, amount: Money, method: PaymentMethod) -> GatewayResult<GatewayReceipt> {
        match method {
            PaymentMethod::Cash => Ok(GatewayReceipt {
                transaction_id: format!("till-{}", Uuid::new_v4()),
                amount,
                method,
                settled_at: Utc::now(),
            }),
            PaymentMethod::Card | PaymentMethod::MobileWallet => {
                charge_with_retry(&self.gateway, amount, method, &self.retry).await
            }
        }
    }

    /// Refund body. Runs while the in-flight slot is held; the Paid status
    /// is checked again under the final lock before the flip to Refunded.
    async fn settle_refund(&self, bill_id: &str) -> StoreResult<Bill> {
        let payments = {
            let bills = self.bills.lock().unwrap();
            let bill = bills
                .get(bill_id)
                .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
            if bill.status != BillStatus::Paid {
                return Err(CoreError::InvalidBillStatus {
                    bill_id: bill.id.clone(),
                    status: bill.status,
                }
                .into());
            }
            bill.payments.clone()
        };

        for payment in &payments {
            if payment.method == PaymentMethod::Cash {
                continue;
            }
            let outcome = self
                .gateway
                .refund(&payment.transaction_id, Money::from_cents(payment.amount_cents))
                .await;
            if let Err(err) = outcome {
                warn!(bill_id, transaction_id = %payment.transaction_id, %err, "Refund failed");
                return Err(err.into());
            }
        }

        let (bill, _) = self.with_bill_mut(bill_id, |bill| {
            if bill.status != BillStatus::Paid {
                return Err(CoreError::InvalidBillStatus {
                    bill_id: bill.id.clone(),
                    status: bill.status,
                }
                .into());
            }
            bill.status = BillStatus::Refunded;
            Ok(())
        })?;
        Ok(bill)
    }

    /// Share settlement body. Runs while the in-flight slot is held; the
    /// share is checked again under the final lock before it is marked paid.
    async fn settle_share(
        &self,
        bill_id: &str,
        customer: &str,
        method: PaymentMethod,
    ) -> StoreResult<(Bill, Money, bool)> {
        let amount = {
            let bills = self.bills.lock().unwrap();
            let bill = bills
                .get(bill_id)
                .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
            share_amount_for_payment(bill, customer)?
        };

        let receipt = self.settle(amount, method).await?;

        let (bill, fully_paid) = self.with_bill_mut(bill_id, |bill| {
            record_share_payment(bill, customer, method, &receipt)
        })?;
        Ok((bill, amount, fully_paid))
    }

    /// Whole-bill settlement body. Runs while the in-flight slot is held;
    /// the status is checked again under the final lock before the bill is
    /// marked paid.
    async fn settle_bill(
        &self,
        bill_id: &str,
        method: PaymentMethod,
    ) -> StoreResult<(Bill, GatewayReceipt)> {
        let amount = {
            let bills = self.bills.lock().unwrap();
            let bill = bills
                .get(bill_id)
                .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;
            ensure_status(bill, BillStatus::Pending)?;
            bill.total()
        };

        let receipt = self.settle(amount, method).await?;

        let (bill, _) = self.with_bill_mut(bill_id, |bill| {
            ensure_status(bill, BillStatus::Pending)?;
            bill.payments.push(PaymentRecord {
                id: Uuid::new_v4().to_string(),
                method,
                amount_cents: receipt.amount.cents(),
                transaction_id: receipt.transaction_id.clone(),
                customer: None,
                paid_at: receipt.settled_at,
            });
            bill.status = BillStatus::Paid;
            bill.paid_at = Some(receipt.settled_at);
            Ok(())
        })?;
        Ok((bill, receipt))
    }

    fn claim_in_flight(&self, bill_id: &str) -> StoreResult<()> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(bill_id.to_string()) {
            return Err(StoreError::PaymentInFlight {
                bill_id: bill_id.to_string(),
            });
        }
        Ok(())
    }

    fn release_in_flight(&self, bill_id: &str) {
        self.in_flight.lock().unwrap().remove(bill_id);
    }

    fn with_bill_mut<T>(
        &self,
        bill_id: &str,
        f: impl FnOnce(&mut Bill) -> StoreResult<T>,
    ) -> StoreResult<(Bill, T)> {
        let mut bills = self.bills.lock().unwrap();
        let bill = bills
            .get_mut(bill_id)
            .ok_or_else(|| StoreError::from(CoreError::BillNotFound(bill_id.to_string())))?;
        let value = f(bill)?;
        Ok((bill.clone(), value))
    }
}

fn ensure_status(bill: &Bill, expected: BillStatus) -> StoreResult<()> {
    if bill.status == expected {
        return Ok(());
    }
    if bill.status == BillStatus::Paid {
        return Err(CoreError::AlreadyPaid(bill.id.clone()).into());
    }
    Err(CoreError::InvalidBillStatus {
        bill_id: bill.id.clone(),
        status: bill.status,
    }
    .into())
}

/// Pre-charge checks for a share payment; returns the amount to charge.
fn share_amount_for_payment(bill: &Bill, customer: &str) -> StoreResult<Money> {
    let split = bill
        .split
        .as_ref()
        .ok_or_else(|| CoreError::SplitNotInitiated(bill.id.clone()))?;
    if !split.finalized {
        return Err(CoreError::SplitNotFinalized(bill.id.clone()).into());
    }
    let share = split.share(customer).ok_or_else(|| CoreError::ShareNotFound {
        bill_id: bill.id.clone(),
        customer: customer.to_string(),
    })?;
    if share.is_paid() {
        return Err(CoreError::ShareAlreadyPaid {
            bill_id: bill.id.clone(),
            customer: customer.to_string(),
        }
        .into());
    }
    Ok(share.amount())
}

/// Marks the share paid and records the payment. Returns whether the bill
/// is now fully settled.
fn record_share_payment(
    bill: &mut Bill,
    customer: &str,
    method: PaymentMethod,
    receipt: &GatewayReceipt,
) -> StoreResult<bool> {
    let bill_id = bill.id.clone();
    let split = bill
        .split
        .as_mut()
        .ok_or_else(|| CoreError::SplitNotInitiated(bill_id.clone()))?;
    let share = split.share_mut(customer).ok_or_else(|| CoreError::ShareNotFound {
        bill_id: bill_id.clone(),
        customer: customer.to_string(),
    })?;
    if share.is_paid() {
        return Err(CoreError::ShareAlreadyPaid {
            bill_id,
            customer: customer.to_string(),
        }
        .into());
    }

    share.status = splitease_core::ShareStatus::Paid;
    share.paid_at = Some(receipt.settled_at);

    bill.payments.push(PaymentRecord {
        id: Uuid::new_v4().to_string(),
        method,
        amount_cents: receipt.amount.cents(),
        transaction_id: receipt.transaction_id.clone(),
        customer: Some(customer.to_string()),
        paid_at: receipt.settled_at,
    });

    let fully_paid = bill
        .split
        .as_ref()
        .map(|s| s.all_paid())
        .unwrap_or(false);
    if fully_paid {
        bill.status = BillStatus::Paid;
        bill.paid_at = Some(receipt.settled_at);
    }
    Ok(fully_paid)
}

// =============================================================================
// Unit Tests
// =============================================================================
