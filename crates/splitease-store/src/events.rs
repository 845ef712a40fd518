//! # Live Update Bus
//!
//! Fan-out of store events to any number of subscribers (order tracker,
//! kitchen display, billing screen). Built on `tokio::sync::broadcast`:
//! slow subscribers lag and skip rather than blocking the stores.
//!
//! A bounded history of recent notifications is kept so late subscribers
//! (a screen that just connected) can render something immediately.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use splitease_core::{OrderPriority, OrderStatus, PaymentMethod, NOTIFICATION_HISTORY};

// =============================================================================
// Events
// =============================================================================

/// A store event, broadcast to every subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveUpdate {
    OrderPlaced {
        order_id: String,
        table_number: u32,
    },
    OrderStatusChanged {
        order_id: String,
        table_number: u32,
        from: OrderStatus,
        to: OrderStatus,
    },
    OrderPriorityChanged {
        order_id: String,
        priority: OrderPriority,
    },
    OrderCancelled {
        order_id: String,
        table_number: u32,
        reason: String,
    },
    BillGenerated {
        bill_id: String,
        table_number: u32,
        total_cents: i64,
    },
    DiscountApplied {
        bill_id: String,
        discount_cents: i64,
    },
    SplitInitiated {
        bill_id: String,
        shares: usize,
    },
    SplitFinalized {
        bill_id: String,
    },
    PaymentSettled {
        bill_id: String,
        amount_cents: i64,
        method: PaymentMethod,
    },
    SharePaid {
        bill_id: String,
        customer: String,
        amount_cents: i64,
    },
    BillRefunded {
        bill_id: String,
        amount_cents: i64,
    },
}

/// Severity shown on the notification feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
}

/// A human-readable notification derived from a [`LiveUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
    pub update: LiveUpdate,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    fn from_update(update: LiveUpdate) -> Notification {
        let (level, message) = describe(&update);
        Notification {
            id: Uuid::new_v4().to_string(),
            level,
            message,
            update,
            created_at: Utc::now(),
        }
    }
}

fn describe(update: &LiveUpdate) -> (NotificationLevel, String) {
    use LiveUpdate::*;
    match update {
        OrderPlaced { table_number, .. } => (
            NotificationLevel::Info,
            format!("New order placed for table {table_number}"),
        ),
        OrderStatusChanged {
            table_number, to, ..
        } => (
            NotificationLevel::Info,
            format!("Order for table {table_number} is now {to}"),
        ),
        OrderPriorityChanged { priority, .. } => (
            NotificationLevel::Info,
            format!("Order priority set to {priority:?}"),
        ),
        OrderCancelled {
            table_number,
            reason,
            ..
        } => (
            NotificationLevel::Warning,
            format!("Order for table {table_number} cancelled: {reason}"),
        ),
        BillGenerated {
            table_number,
            total_cents,
            ..
        } => (
            NotificationLevel::Info,
            format!(
                "Bill generated for table {table_number}: €{}.{:02}",
                total_cents / 100,
                total_cents % 100
            ),
        ),
        DiscountApplied { discount_cents, .. } => (
            NotificationLevel::Info,
            format!(
                "Discount of €{}.{:02} applied",
                discount_cents / 100,
                discount_cents % 100
            ),
        ),
        SplitInitiated { shares, .. } => (
            NotificationLevel::Info,
            format!("Bill split between {shares} customers"),
        ),
        SplitFinalized { .. } => (NotificationLevel::Info, "Bill split locked in".to_string()),
        PaymentSettled {
            amount_cents,
            method,
            ..
        } => (
            NotificationLevel::Success,
            format!(
                "Payment of €{}.{:02} settled via {method}",
                amount_cents / 100,
                amount_cents % 100
            ),
        ),
        SharePaid {
            customer,
            amount_cents,
            ..
        } => (
            NotificationLevel::Success,
            format!(
                "{customer} paid their share of €{}.{:02}",
                amount_cents / 100,
                amount_cents % 100
            ),
        ),
        BillRefunded { amount_cents, .. } => (
            NotificationLevel::Warning,
            format!(
                "Bill refunded: €{}.{:02}",
                amount_cents / 100,
                amount_cents % 100
            ),
        ),
    }
}

// =============================================================================
// Update Bus
// =============================================================================

/// Broadcast channel capacity. Subscribers slower than this lag and skip.
const CHANNEL_CAPACITY: usize = 256;

/// Event fan-out plus a capped notification history.
#[derive(Debug)]
pub struct UpdateBus {
    sender: broadcast::Sender<Notification>,
    history: Mutex<VecDeque<Notification>>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        UpdateBus::new()
    }
}

impl UpdateBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        UpdateBus {
            sender,
            history: Mutex::new(VecDeque::with_capacity(NOTIFICATION_HISTORY)),
        }
    }

    /// Subscribes to future notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publishes an event: records it in history, then broadcasts.
    ///
    /// The send result is ignored on purpose: an empty restaurant with no
    /// screens connected is not an error.
    pub fn publish(&self, update: LiveUpdate) {
        let notification = Notification::from_update(update);
        debug!(message = %notification.message, "Publishing live update");

        {
            let mut history = self.history.lock().unwrap();
            if history.len() == NOTIFICATION_HISTORY {
                history.pop_front();
            }
            history.push_back(notification.clone());
        }

        let _ = self.sender.send(notification);
    }

    /// Recent notifications, oldest first. At most
    /// [`NOTIFICATION_HISTORY`] entries are retained.
    pub fn recent(&self) -> Vec<Notification> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
