//! # Bill Splitting Engine
//!
//! Pure share planning: given a bill and a split plan, produce the shares.
//! All arithmetic is integer cents; equal and percentage splits use the
//! exact division helpers on `Money`, so the shares always sum to the bill
//! total. The one-cent tolerance only applies to customer-typed custom
//! amounts.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Split Plans                                       │
//! │                                                                         │
//! │  Equal       €49.41 / 2  ──►  €24.71 + €24.70  (extra cent leads)      │
//! │  ByItem      assigned lines + proportional overhead                    │
//! │  Custom      typed amounts, must cover the total within 1 cent         │
//! │  Percentage  basis points, must sum to 100%                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use splitease_core::{
    validation, Bill, CoreError, CoreResult, Money, Share, ShareStatus, SplitKind,
    SPLIT_TOLERANCE_CENTS,
};

// =============================================================================
// Split Plan
// =============================================================================

/// How a caller wants a bill divided.
#[derive(Debug, Clone)]
pub enum SplitPlan {
    /// Even n-way division among the named customers.
    Equal { customers: Vec<String> },

    /// Per-line assignment. Shares start at zero; items are assigned one by
    /// one and the amounts are computed at finalization.
    ByItem { customers: Vec<String> },

    /// Flat amounts in cents, one per customer.
    Custom { amounts: Vec<(String, i64)> },

    /// Percentages in basis points (2500 = 25%), one per customer.
    Percentage { shares: Vec<(String, u32)> },
}

impl SplitPlan {
    pub fn kind(&self) -> SplitKind {
        match self {
            SplitPlan::Equal { .. } => SplitKind::Equal,
            SplitPlan::ByItem { .. } => SplitKind::ByItem,
            SplitPlan::Custom { .. } => SplitKind::Custom,
            SplitPlan::Percentage { .. } => SplitKind::Percentage,
        }
    }
}

// =============================================================================
// Share Planning
// =============================================================================

fn pending_share(customer: &str, amount: Money) -> Share {
    Share {
        customer: customer.to_string(),
        amount_cents: amount.cents(),
        status: ShareStatus::Pending,
        paid_at: None,
    }
}

/// Builds the initial share list for a plan.
///
/// Equal, Custom, and Percentage plans produce their final amounts here.
/// ByItem produces zeroed shares; amounts come from
/// [`compute_by_item_shares`] once every line is assigned.
pub fn plan_shares(bill: &Bill, plan: &SplitPlan) -> CoreResult<Vec<Share>> {
    let total = bill.total();
    match plan {
        SplitPlan::Equal { customers } => {
            validation::validate_split_customers(customers)?;
            let amounts = total.split_even(customers.len());
            Ok(customers
                .iter()
                .zip(amounts)
                .map(|(c, amount)| pending_share(c, amount))
                .collect())
        }
        SplitPlan::ByItem { customers } => {
            validation::validate_split_customers(customers)?;
            Ok(customers
                .iter()
                .map(|c| pending_share(c, Money::zero()))
                .collect())
        }
        SplitPlan::Custom { amounts } => {
            let customers: Vec<String> = amounts.iter().map(|(c, _)| c.clone()).collect();
            validation::validate_split_customers(&customers)?;

            let sum: i64 = amounts.iter().map(|(_, cents)| *cents).sum();
            if (sum - total.cents()).abs() > SPLIT_TOLERANCE_CENTS {
                return Err(CoreError::SharesDoNotCoverTotal {
                    expected_cents: total.cents(),
                    actual_cents: sum,
                });
            }
            Ok(amounts
                .iter()
                .map(|(c, cents)| pending_share(c, Money::from_cents(*cents)))
                .collect())
        }
        SplitPlan::Percentage { shares } => {
            validation::validate_percentage_shares(shares)?;
            let weights: Vec<i64> = shares.iter().map(|(_, bps)| i64::from(*bps)).collect();
            let amounts = total.allocate(&weights);
            Ok(shares
                .iter()
                .zip(amounts)
                .map(|((c, _), amount)| pending_share(c, amount))
                .collect())
        }
    }
}

/// Computes by-item share amounts from the bill's line assignments.
///
/// Each customer owes their assigned lines at face value, plus a slice of
/// the overhead (tax + service - discount) proportional to those lines.
/// The overhead is allocated with largest-remainder rounding so the shares
/// sum to the bill total exactly.
///
/// Fails with [`CoreError::UnassignedItems`] if any line has no customer,
/// and with [`CoreError::ShareNotFound`] if a line names a customer that
/// is not part of the split.
pub fn compute_by_item_shares(bill: &Bill, customers: &[String]) -> CoreResult<Vec<Share>> {
    let unassigned = bill.items.iter().filter(|i| i.assigned_to.is_none()).count();
    if unassigned > 0 {
        return Err(CoreError::UnassignedItems { count: unassigned });
    }

    let mut bases: Vec<i64> = vec![0; customers.len()];
    for item in &bill.items {
        // Checked above, every line has an assignee.
        let Some(assignee) = item.assigned_to.as_deref() else {
            continue;
        };
        let idx = customers
            .iter()
            .position(|c| c == assignee)
            .ok_or_else(|| CoreError::ShareNotFound {
                bill_id: bill.id.clone(),
                customer: assignee.to_string(),
            })?;
        bases[idx] += item.line_total_cents;
    }

    let base_total: i64 = bases.iter().sum();
    let overhead = Money::from_cents(bill.total_cents - base_total);

    // A bill of free items still carries overhead; fall back to even weights.
    let weights: Vec<i64> = if base_total == 0 {
        vec![1; customers.len()]
    } else {
        bases.clone()
    };
    let overhead_slices = overhead.allocate(&weights);

    Ok(customers
        .iter()
        .zip(bases.iter().zip(overhead_slices))
        .map(|(customer, (base, slice))| {
            pending_share(customer, Money::from_cents(*base) + slice)
        })
        .collect())
}

/// Verifies that finalized shares cover the bill total within tolerance.
pub fn check_shares_cover_total(bill: &Bill, shares: &[Share]) -> CoreResult<()> {
    let sum: i64 = shares.iter().map(|s| s.amount_cents).sum();
    if (sum - bill.total_cents).abs() > SPLIT_TOLERANCE_CENTS {
        return Err(CoreError::SharesDoNotCoverTotal {
            expected_cents: bill.total_cents,
            actual_cents: sum,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use splitease_core::{BillItem, BillStatus};

    fn bill_with_total(total_cents: i64) -> Bill {
        Bill {
            id: "bill-1".to_string(),
            table_number: 7,
            order_ids: vec!["order-1".to_string()],
            items: Vec::new(),
            subtotal_cents: total_cents,
            tax_cents: 0,
            service_cents: 0,
            discount_cents: 0,
            total_cents,
            status: BillStatus::Pending,
            split: None,
            payments: Vec::new(),
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    fn line(id: &str, cents: i64, assigned_to: Option<&str>) -> BillItem {
        BillItem {
            id: id.to_string(),
            order_id: "order-1".to_string(),
            menu_item_id: format!("menu-{id}"),
            name: format!("Item {id}"),
            unit_price_cents: cents,
            quantity: 1,
            line_total_cents: cents,
            assigned_to: assigned_to.map(str::to_string),
        }
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equal_split_two_ways() {
        // €49.41 between two: first share carries the extra cent.
        let bill = bill_with_total(4941);
        let shares = plan_shares(&bill, &SplitPlan::Equal { customers: names(&["anna", "ben"]) })
            .unwrap();
        assert_eq!(shares[0].amount_cents, 2471);
        assert_eq!(shares[1].amount_cents, 2470);
        check_shares_cover_total(&bill, &shares).unwrap();
    }

    #[test]
    fn test_equal_split_rejects_duplicate_customers() {
        let bill = bill_with_total(1000);
        let err = plan_shares(&bill, &SplitPlan::Equal { customers: names(&["anna", "anna"]) });
        assert!(err.is_err());
    }

    #[test]
    fn test_custom_split_tolerance() {
        let bill = bill_with_total(4941);

        let exact = SplitPlan::Custom {
            amounts: vec![("anna".to_string(), 3000), ("ben".to_string(), 1941)],
        };
        assert!(plan_shares(&bill, &exact).is_ok());

        // One cent short is within tolerance.
        let near = SplitPlan::Custom {
            amounts: vec![("anna".to_string(), 3000), ("ben".to_string(), 1940)],
        };
        assert!(plan_shares(&bill, &near).is_ok());

        let off = SplitPlan::Custom {
            amounts: vec![("anna".to_string(), 3000), ("ben".to_string(), 1000)],
        };
        assert!(matches!(
            plan_shares(&bill, &off),
            Err(CoreError::SharesDoNotCoverTotal { .. })
        ));
    }

    #[test]
    fn test_percentage_split_allocates_exactly() {
        let bill = bill_with_total(4941);
        let shares = plan_shares(
            &bill,
            &SplitPlan::Percentage {
                shares: vec![
                    ("anna".to_string(), 5000),
                    ("ben".to_string(), 3000),
                    ("cara".to_string(), 2000),
                ],
            },
        )
        .unwrap();

        let sum: i64 = shares.iter().map(|s| s.amount_cents).sum();
        assert_eq!(sum, 4941);
        check_shares_cover_total(&bill, &shares).unwrap();
    }

    #[test]
    fn test_percentage_split_rejects_bad_sum() {
        let bill = bill_with_total(1000);
        let err = plan_shares(
            &bill,
            &SplitPlan::Percentage {
                shares: vec![("anna".to_string(), 6000), ("ben".to_string(), 3000)],
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_by_item_shares_start_at_zero() {
        let bill = bill_with_total(4941);
        let shares =
            plan_shares(&bill, &SplitPlan::ByItem { customers: names(&["anna", "ben"]) }).unwrap();
        assert!(shares.iter().all(|s| s.amount_cents == 0));
    }

    #[test]
    fn test_by_item_computation_splits_overhead_proportionally() {
        let mut bill = bill_with_total(0);
        bill.items = vec![
            line("a", 3000, Some("anna")),
            line("b", 1000, Some("ben")),
        ];
        bill.subtotal_cents = 4000;
        bill.tax_cents = 400;
        bill.service_cents = 480;
        bill.total_cents = 4880;

        let shares = compute_by_item_shares(&bill, &names(&["anna", "ben"])).unwrap();
        // Overhead of 880 splits 3:1 with the line totals.
        assert_eq!(shares[0].amount_cents, 3000 + 660);
        assert_eq!(shares[1].amount_cents, 1000 + 220);
        check_shares_cover_total(&bill, &shares).unwrap();
    }

    #[test]
    fn test_by_item_rejects_unassigned_lines() {
        let mut bill = bill_with_total(4000);
        bill.items = vec![line("a", 3000, Some("anna")), line("b", 1000, None)];

        let err = compute_by_item_shares(&bill, &names(&["anna", "ben"]));
        assert!(matches!(err, Err(CoreError::UnassignedItems { count: 1 })));
    }

    #[test]
    fn test_by_item_rejects_unknown_assignee() {
        let mut bill = bill_with_total(3000);
        bill.items = vec![line("a", 3000, Some("zoe"))];

        let err = compute_by_item_shares(&bill, &names(&["anna", "ben"]));
        assert!(matches!(err, Err(CoreError::ShareNotFound { .. })));
    }
}
