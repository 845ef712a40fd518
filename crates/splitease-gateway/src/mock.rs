//! Deterministic in-memory gateway for tests and demos.
//!
//! Outcomes are scripted up front with [`MockGateway::script_outcomes`];
//! once the script is exhausted every charge succeeds. No timers, no
//! randomness, so tests assert exact attempt counts and transaction ids.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use splitease_core::{Money, PaymentMethod};

use crate::{GatewayError, GatewayReceipt, GatewayResult, PaymentGateway};

/// Scripted payment gateway. Charges settle instantly and mint sequential
/// transaction ids (`txn-000001`, `txn-000002`, ...).
#[derive(Debug, Default)]
pub struct MockGateway {
    script: Mutex<VecDeque<Result<(), GatewayError>>>,
    counter: AtomicU64,
    attempts: AtomicU64,
    settled: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        MockGateway::default()
    }

    /// Queues outcomes for the next charges, in order. `Ok(())` settles,
    /// `Err` fails with that error.
    pub fn script_outcomes(&self, outcomes: Vec<Result<(), GatewayError>>) {
        let mut script = self.script.lock().unwrap();
        script.extend(outcomes);
    }

    /// Total charge calls seen, including failed attempts.
    pub fn charge_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n:06}")
    }
}

impl PaymentGateway for MockGateway {
    async fn charge(&self, amount: Money, method: PaymentMethod) -> GatewayResult<GatewayReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let outcome = self.script.lock().unwrap().pop_front();
        if let Some(Err(err)) = outcome {
            return Err(err);
        }

        let transaction_id = self.next_id("txn");
        self.settled.lock().unwrap().push(transaction_id.clone());

        Ok(GatewayReceipt {
            transaction_id,
            amount,
            method,
            settled_at: Utc::now(),
        })
    }

    async fn refund(&self, transaction_id: &str, amount: Money) -> GatewayResult<GatewayReceipt> {
        let known = self
            .settled
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == transaction_id);
        if !known {
            return Err(GatewayError::UnknownTransaction(transaction_id.to_string()));
        }

        Ok(GatewayReceipt {
            transaction_id: self.next_id("rfd"),
            amount,
            method: PaymentMethod::Card,
            settled_at: Utc::now(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_transaction_ids() {
        let gateway = MockGateway::new();
        let a = gateway
            .charge(Money::from_cents(100), PaymentMethod::Cash)
            .await
            .unwrap();
        let b = gateway
            .charge(Money::from_cents(200), PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(a.transaction_id, "txn-000001");
        assert_eq!(b.transaction_id, "txn-000002");
    }

    #[tokio::test]
    async fn test_scripted_failures_drain_in_order() {
        let gateway = MockGateway::new();
        gateway.script_outcomes(vec![Err(GatewayError::FraudHold), Ok(())]);

        let first = gateway
            .charge(Money::from_cents(100), PaymentMethod::Card)
            .await;
        assert_eq!(first, Err(GatewayError::FraudHold));

        let second = gateway
            .charge(Money::from_cents(100), PaymentMethod::Card)
            .await;
        assert!(second.is_ok());

        // Script exhausted, charges succeed from here on.
        let third = gateway
            .charge(Money::from_cents(100), PaymentMethod::Card)
            .await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_refund_requires_known_transaction() {
        let gateway = MockGateway::new();
        let err = gateway
            .refund("txn-999999", Money::from_cents(100))
            .await
            .expect_err("nothing settled yet");
        assert_eq!(err, GatewayError::UnknownTransaction("txn-999999".into()));

        let receipt = gateway
            .charge(Money::from_cents(4941), PaymentMethod::Card)
            .await
            .unwrap();
        let refund = gateway
            .refund(&receipt.transaction_id, Money::from_cents(4941))
            .await
            .unwrap();
        assert!(refund.transaction_id.starts_with("rfd-"));
    }
}
