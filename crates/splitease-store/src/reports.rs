//! # End-of-Day Reports
//!
//! Pure aggregations over the bill list. Everything here takes a slice and
//! returns numbers; the billing store exposes thin wrappers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use splitease_core::{Bill, BillStatus, PaymentMethod};

/// Revenue summary for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,

    /// Bills settled that day (still paid, not refunded).
    pub bills_paid: usize,

    /// Sum of settled bill totals in cents.
    pub gross_cents: i64,

    /// Discounts given on those bills in cents.
    pub discount_cents: i64,

    /// Totals of bills paid that day and later refunded, in cents.
    pub refunded_cents: i64,
}

impl DailyRevenue {
    /// Gross minus refunds.
    pub fn net_cents(&self) -> i64 {
        self.gross_cents - self.refunded_cents
    }
}

/// Revenue for one day, keyed on `paid_at`.
///
/// Refunded bills count into `refunded_cents` on the day they were paid;
/// there is no separate refund timestamp on a bill.
pub fn daily_revenue(bills: &[Bill], date: NaiveDate) -> DailyRevenue {
    let mut report = DailyRevenue {
        date,
        bills_paid: 0,
        gross_cents: 0,
        discount_cents: 0,
        refunded_cents: 0,
    };

    for bill in bills {
        let Some(paid_at) = bill.paid_at else { continue };
        if paid_at.date_naive() != date {
            continue;
        }
        match bill.status {
            BillStatus::Paid => {
                report.bills_paid += 1;
                report.gross_cents += bill.total_cents;
                report.discount_cents += bill.discount_cents;
            }
            BillStatus::Refunded => {
                report.gross_cents += bill.total_cents;
                report.refunded_cents += bill.total_cents;
            }
            BillStatus::Pending | BillStatus::Split => {}
        }
    }
    report
}

/// Count and volume per payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodStats {
    pub payments: usize,
    pub total_cents: i64,
}

/// Settled payment volume per method, optionally limited to one day.
///
/// Individual payments are counted, so a split bill contributes one entry
/// per paid share. With `date` set, only payments stamped that day are
/// included.
pub fn payment_method_stats(
    bills: &[Bill],
    date: Option<NaiveDate>,
) -> BTreeMap<String, MethodStats> {
    let mut stats: BTreeMap<String, MethodStats> = BTreeMap::new();
    for bill in bills {
        for payment in &bill.payments {
            if let Some(date) = date {
                if payment.paid_at.date_naive() != date {
                    continue;
                }
            }
            let entry = stats.entry(payment.method.to_string()).or_default();
            entry.payments += 1;
            entry.total_cents += payment.amount_cents;
        }
    }
    stats
}

/// Convenience: stats for one method out of the aggregate map.
pub fn stats_for(stats: &BTreeMap<String, MethodStats>, method: PaymentMethod) -> MethodStats {
    stats.get(&method.to_string()).copied().unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use splitease_core::PaymentRecord;

    fn bill(total_cents: i64, status: BillStatus, paid_day: Option<u32>) -> Bill {
        let paid_at = paid_day.map(|d| Utc.with_ymd_and_hms(2026, 8, d, 20, 0, 0).unwrap());
        Bill {
            id: uuid::Uuid::new_v4().to_string(),
            table_number: 1,
            order_ids: Vec::new(),
            items: Vec::new(),
            subtotal_cents: total_cents,
            tax_cents: 0,
            service_cents: 0,
            discount_cents: 0,
            total_cents,
            status,
            split: None,
            payments: paid_at
                .map(|ts| {
                    vec![PaymentRecord {
                        id: uuid::Uuid::new_v4().to_string(),
                        method: PaymentMethod::Card,
                        amount_cents: total_cents,
                        transaction_id: "txn-000001".to_string(),
                        customer: None,
                        paid_at: ts,
                    }]
                })
                .unwrap_or_default(),
            created_at: Utc::now(),
            paid_at,
        }
    }

    #[test]
    fn test_daily_revenue_filters_by_day_and_status() {
        let bills = vec![
            bill(4941, BillStatus::Paid, Some(29)),
            bill(2000, BillStatus::Paid, Some(29)),
            bill(3000, BillStatus::Paid, Some(28)), // other day
            bill(1500, BillStatus::Refunded, Some(29)),
            bill(9999, BillStatus::Pending, None),
        ];

        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let report = daily_revenue(&bills, date);
        assert_eq!(report.bills_paid, 2);
        assert_eq!(report.gross_cents, 4941 + 2000 + 1500);
        assert_eq!(report.refunded_cents, 1500);
        assert_eq!(report.net_cents(), 4941 + 2000);
    }

    #[test]
    fn test_payment_method_stats_counts_individual_payments() {
        let mut split_bill = bill(4941, BillStatus::Paid, Some(29));
        split_bill.payments.push(PaymentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            method: PaymentMethod::Cash,
            amount_cents: 2470,
            transaction_id: "till-1".to_string(),
            customer: Some("ben".to_string()),
            paid_at: Utc::now(),
        });

        let bills = vec![split_bill, bill(2000, BillStatus::Paid, Some(29))];
        let stats = payment_method_stats(&bills, None);

        let card = stats_for(&stats, PaymentMethod::Card);
        assert_eq!(card.payments, 2);
        assert_eq!(card.total_cents, 4941 + 2000);

        let cash = stats_for(&stats, PaymentMethod::Cash);
        assert_eq!(cash.payments, 1);
        assert_eq!(cash.total_cents, 2470);

        assert_eq!(stats_for(&stats, PaymentMethod::MobileWallet), MethodStats::default());
    }

    #[test]
    fn test_payment_method_stats_day_filter() {
        let bills = vec![
            bill(4941, BillStatus::Paid, Some(29)),
            bill(3000, BillStatus::Paid, Some(28)),
        ];

        let date = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        let stats = payment_method_stats(&bills, Some(date));

        let card = stats_for(&stats, PaymentMethod::Card);
        assert_eq!(card.payments, 1);
        assert_eq!(card.total_cents, 4941);
    }
}
