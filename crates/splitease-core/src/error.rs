//! # Error Types
//!
//! Domain-specific error types for splitease-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  splitease-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  splitease-gateway errors (separate crate)                             │
//! │  └── GatewayError     - Declined / fraud-hold / timeout / unavailable  │
//! │                                                                         │
//! │  splitease-store errors (separate crate)                               │
//! │  └── StoreError       - Wraps all of the above for the service layer   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, table, amounts)
//! 3. Errors are enum variants, never String
//! 4. Nothing in the domain silently no-ops: a missing id is an error

use thiserror::Error;

use crate::types::{BillStatus, OrderStatus, SplitKind};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations in the ordering and billing domain.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order id does not exist in the store.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Bill id does not exist in the store.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Menu item id is not in the catalog.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// Menu item exists but is flagged unavailable.
    #[error("Menu item is not available: {0}")]
    MenuItemUnavailable(String),

    /// Line item id is not on the given order.
    #[error("Item {item_id} is not on order {order_id}")]
    ItemNotInOrder { order_id: String, item_id: String },

    /// Orders must carry at least one line item.
    #[error("Order has no items")]
    EmptyOrder,

    /// The requested status change breaks the order lifecycle.
    ///
    /// ## When This Occurs
    /// - Moving backwards (ready → pending)
    /// - Skipping states (pending → preparing)
    /// - Cancelling a served order
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Item mutations are only allowed before the kitchen is done.
    #[error("Order {order_id} is {status}, items can no longer change")]
    OrderLocked {
        order_id: String,
        status: OrderStatus,
    },

    /// Only served orders can be billed.
    #[error("Order {order_id} is {status}, only served orders can be billed")]
    OrderNotBillable {
        order_id: String,
        status: OrderStatus,
    },

    /// Explicitly requested order is already on a live bill.
    #[error("Order {0} is already on a bill")]
    OrderAlreadyBilled(String),

    /// Bill generation matched no orders.
    #[error("No billable orders for table {table}")]
    NoOrdersToBill { table: u32 },

    /// The bill has already been settled; re-payment is rejected.
    #[error("Bill {0} is already paid")]
    AlreadyPaid(String),

    /// The bill is in a state that does not admit the operation.
    #[error("Bill {bill_id} is {status}, cannot perform operation")]
    InvalidBillStatus {
        bill_id: String,
        status: BillStatus,
    },

    /// Bill line id is not on the given bill.
    #[error("Item {item_id} is not on bill {bill_id}")]
    ItemNotOnBill { bill_id: String, item_id: String },

    /// A split operation was requested but no split exists.
    #[error("Bill {0} has no split in progress")]
    SplitNotInitiated(String),

    /// The operation only applies to a different split kind
    /// (e.g. assigning items on an equal split).
    #[error("Split on bill {bill_id} is {actual:?}, operation needs {expected:?}")]
    SplitKindMismatch {
        bill_id: String,
        expected: SplitKind,
        actual: SplitKind,
    },

    /// The split is finalized; assignments can no longer change.
    #[error("Split on bill {0} is already finalized")]
    SplitAlreadyFinalized(String),

    /// Shares can only be paid after the split is finalized.
    #[error("Split on bill {0} is not finalized")]
    SplitNotFinalized(String),

    /// The named customer has no share on this bill.
    #[error("No share for customer {customer} on bill {bill_id}")]
    ShareNotFound { bill_id: String, customer: String },

    /// The customer's share has already been paid.
    #[error("Share for customer {customer} on bill {bill_id} is already paid")]
    ShareAlreadyPaid { bill_id: String, customer: String },

    /// Share amounts do not add up to the bill total within tolerance.
    #[error("Split shares total {actual_cents} cents, bill total is {expected_cents} cents")]
    SharesDoNotCoverTotal {
        expected_cents: i64,
        actual_cents: i64,
    },

    /// A by-item split requires every line to be assigned to a customer.
    #[error("{count} bill item(s) are not assigned to any customer")]
    UnassignedItems { count: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format or composition.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The same customer appears twice in a split plan.
    #[error("customer '{0}' appears more than once")]
    DuplicateCustomer(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidStatusTransition {
            order_id: "o-1".to_string(),
            from: OrderStatus::Served,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Order o-1 cannot move from served to cancelled");

        let err = CoreError::SharesDoNotCoverTotal {
            expected_cents: 4941,
            actual_cents: 4900,
        };
        assert_eq!(
            err.to_string(),
            "Split shares total 4900 cents, bill total is 4941 cents"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer".to_string(),
        };
        assert_eq!(err.to_string(), "customer is required");

        let err = ValidationError::OutOfRange {
            field: "table".to_string(),
            min: 1,
            max: 500,
        };
        assert_eq!(err.to_string(), "table must be between 1 and 500");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
