//! # splitease-gateway: Payment Provider Boundary
//!
//! The billing store settles money through this crate and nothing else.
//! The [`PaymentGateway`] trait is the single integration point for a real
//! provider; [`mock::MockGateway`] is the deterministic stand-in used by
//! tests and the demo.
//!
//! ## Charge Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Charge Flow                                     │
//! │                                                                         │
//! │  BillingStore::process_payment                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  charge_with_retry(gateway, amount, method, policy)                    │
//! │       │                                                                 │
//! │       ├── Ok(receipt) ───────────────────────► bill marked paid        │
//! │       │                                                                 │
//! │       ├── Err(Timeout | Unavailable) ──► backoff, retry (bounded)      │
//! │       │                                                                 │
//! │       └── Err(Declined | FraudHold) ──► fail fast, bill stays pending  │
//! │                                                                         │
//! │  Declined and FraudHold are final answers from the provider;           │
//! │  retrying them would re-ask a question that was already answered.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use splitease_core::{Money, PaymentMethod};

pub mod mock;

pub use mock::MockGateway;

// =============================================================================
// Gateway Error
// =============================================================================

/// Typed failure taxonomy from the payment provider.
///
/// Replaces the "roll a die, fail 10% of the time" placeholder: every
/// failure names its cause and carries a retry classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The provider declined the charge (insufficient funds, bad card).
    #[error("payment declined: {code}")]
    Declined { code: String },

    /// The charge was held for fraud review; the outcome is pending
    /// manual action on the provider side.
    #[error("payment held for fraud review")]
    FraudHold,

    /// The provider did not answer in time.
    #[error("gateway timed out")]
    Timeout,

    /// The provider is temporarily unavailable.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// The referenced transaction does not exist (refund path).
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),
}

impl GatewayError {
    /// Whether retrying the same request can possibly succeed.
    ///
    /// Timeouts and outages are transient; declines and fraud holds are
    /// decisions, not glitches.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Timeout | GatewayError::Unavailable(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// Receipt
// =============================================================================

/// Proof of a settled charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReceipt {
    /// Provider transaction reference; stored on the bill's payment record
    /// and required for refunds.
    pub transaction_id: String,

    pub amount: Money,
    pub method: PaymentMethod,
    pub settled_at: DateTime<Utc>,
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// The payment provider interface.
///
/// One in-flight call per bill is enforced by the billing store, not here;
/// implementations only need to be safe for concurrent calls across
/// different bills.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount. A successful return means the money moved.
    async fn charge(&self, amount: Money, method: PaymentMethod) -> GatewayResult<GatewayReceipt>;

    /// Refunds a previously settled transaction in full or in part.
    async fn refund(&self, transaction_id: &str, amount: Money) -> GatewayResult<GatewayReceipt>;
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Bounded exponential backoff for transient gateway failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_backoff: Duration,

    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,

    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; used where the caller wants a single
    /// authoritative answer (e.g. refunds).
    pub fn no_retries() -> Self {
        RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }
}

/// Charges through the gateway, retrying transient failures per `policy`.
///
/// Declined and fraud-hold outcomes return immediately; timeouts and
/// outages sleep on an exponential backoff and try again, up to
/// `policy.max_retries` additional attempts.
pub async fn charge_with_retry<G: PaymentGateway>(
    gateway: &G,
    amount: Money,
    method: PaymentMethod,
    policy: &RetryPolicy,
) -> GatewayResult<GatewayReceipt> {
    let mut backoff = policy.backoff();
    let mut attempt: u32 = 0;

    loop {
        match gateway.charge(amount, method).await {
            Ok(receipt) => {
                if attempt > 0 {
                    info!(
                        transaction_id = %receipt.transaction_id,
                        attempts = attempt + 1,
                        "Charge succeeded after retry"
                    );
                }
                return Ok(receipt);
            }
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
                warn!(
                    %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient gateway failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(GatewayError::Timeout.is_retryable());
        assert!(GatewayError::Unavailable("503".into()).is_retryable());
        assert!(!GatewayError::Declined { code: "insufficient_funds".into() }.is_retryable());
        assert!(!GatewayError::FraudHold.is_retryable());
        assert!(!GatewayError::UnknownTransaction("txn-1".into()).is_retryable());
    }

    #[tokio::test]
    async fn test_charge_with_retry_recovers_from_timeouts() {
        let gateway = MockGateway::new();
        gateway.script_outcomes(vec![
            Err(GatewayError::Timeout),
            Err(GatewayError::Unavailable("maintenance".into())),
            Ok(()),
        ]);

        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            max_retries: 3,
        };

        let receipt =
            charge_with_retry(&gateway, Money::from_cents(4941), PaymentMethod::Card, &policy)
                .await
                .expect("third attempt succeeds");
        assert_eq!(receipt.amount.cents(), 4941);
        assert_eq!(gateway.charge_attempts(), 3);
    }

    #[tokio::test]
    async fn test_charge_with_retry_fails_fast_on_decline() {
        let gateway = MockGateway::new();
        gateway.script_outcomes(vec![Err(GatewayError::Declined {
            code: "insufficient_funds".into(),
        })]);

        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            max_retries: 5,
        };

        let err =
            charge_with_retry(&gateway, Money::from_cents(1000), PaymentMethod::Card, &policy)
                .await
                .expect_err("declines are final");
        assert!(matches!(err, GatewayError::Declined { .. }));
        assert_eq!(gateway.charge_attempts(), 1);
    }

    #[tokio::test]
    async fn test_charge_with_retry_exhausts_budget() {
        let gateway = MockGateway::new();
        gateway.script_outcomes(vec![
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
        ]);

        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            max_retries: 2,
        };

        let err =
            charge_with_retry(&gateway, Money::from_cents(1000), PaymentMethod::Card, &policy)
                .await
                .expect_err("budget exhausted");
        assert_eq!(err, GatewayError::Timeout);
        assert_eq!(gateway.charge_attempts(), 3); // initial + 2 retries
    }
}
