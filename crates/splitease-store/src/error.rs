//! Store-level error type.
//!
//! Wraps the domain errors from `splitease-core`, gateway failures, and
//! snapshot I/O into one surface for callers.

use thiserror::Error;

use splitease_core::CoreError;
use splitease_gateway::GatewayError;

use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// A payment for this bill is already awaiting a gateway answer.
    /// Rejecting the second request up front is what prevents the
    /// double-charge race the old flow allowed.
    #[error("a payment for bill {bill_id} is already in flight")]
    PaymentInFlight { bill_id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
