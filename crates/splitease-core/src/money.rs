//! # Money Module
//!
//! Monetary values and percentage rates for orders and bills.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004                    │
//! │                                                                         │
//! │  Splitting a €49.41 bill two ways in floats gives €24.705 each -       │
//! │  a sub-cent amount no card terminal can charge.                         │
//! │                                                                         │
//! │  OUR SOLUTION: integer euro-cents, with explicit remainder handling:    │
//! │    4941 cents / 2 = 2471 + 2470  (the extra cent goes to share #1)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every split algorithm in this crate sums back to the original amount
//! exactly; nothing is lost or invented.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in euro-cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and discounts
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: amounts enter the system as cents, full stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from euros and cents.
    ///
    /// For negative amounts only the euro part carries the sign:
    /// `from_euros_cents(-5, 50)` is -€5.50.
    #[inline]
    pub const fn from_euros_cents(euros: i64, cents: i64) -> Self {
        if euros < 0 {
            Money(euros * 100 - cents)
        } else {
            Money(euros * 100 + cents)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the euro (major unit) portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent (minor unit) portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps the value to zero or above.
    ///
    /// Used when a flat discount exceeds a bill total: the bill bottoms out
    /// at €0.00, it never goes negative.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Splits the amount into `n` shares that sum back exactly.
    ///
    /// Each share gets `total / n` cents; the remainder cents (at most
    /// `n - 1` of them) go to the earliest shares, one each. This is the
    /// round-half-up policy for even splits:
    ///
    /// ```rust
    /// use splitease_core::money::Money;
    ///
    /// let shares = Money::from_cents(4941).split_even(2); // €49.41
    /// assert_eq!(shares[0].cents(), 2471); // €24.71
    /// assert_eq!(shares[1].cents(), 2470); // €24.70
    /// ```
    ///
    /// ## Panics
    /// Panics if `n == 0`. Callers validate customer counts first.
    pub fn split_even(&self, n: usize) -> Vec<Money> {
        assert!(n > 0, "cannot split into zero shares");
        let n_i = n as i64;
        let base = self.0.div_euclid(n_i);
        let remainder = self.0.rem_euclid(n_i);
        (0..n_i)
            .map(|i| Money(base + i64::from(i < remainder)))
            .collect()
    }

    /// Allocates the amount proportionally to `weights`, summing back exactly.
    ///
    /// Largest-remainder method: every share gets its floor allocation, then
    /// the leftover cents go to the shares with the largest truncated
    /// remainders (ties broken by position). Used for by-item splits, where
    /// line totals are the weights and the bill total (tax and service
    /// included) is the amount being divided.
    ///
    /// ## Panics
    /// Panics if `weights` is empty or sums to zero. Callers reject empty
    /// and zero-subtotal splits before allocating.
    pub fn allocate(&self, weights: &[i64]) -> Vec<Money> {
        // Mirror negative amounts so remainder distribution always works on
        // positive cents (a heavily discounted bill can owe negative overhead).
        if self.0 < 0 {
            return Money(-self.0)
                .allocate(weights)
                .into_iter()
                .map(|m| Money(-m.0))
                .collect();
        }

        let total_weight: i64 = weights.iter().sum();
        assert!(
            !weights.is_empty() && total_weight > 0,
            "allocation weights must be non-empty and positive"
        );

        let mut shares: Vec<i64> = Vec::with_capacity(weights.len());
        let mut remainders: Vec<(usize, i64)> = Vec::with_capacity(weights.len());
        for (idx, &w) in weights.iter().enumerate() {
            // i128 to avoid overflow on amount*weight
            let scaled = self.0 as i128 * w as i128;
            shares.push((scaled / total_weight as i128) as i64);
            remainders.push((idx, (scaled % total_weight as i128) as i64));
        }

        let allocated: i64 = shares.iter().sum();
        let mut leftover = self.0 - allocated;

        remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (idx, _) in remainders {
            if leftover <= 0 {
                break;
            }
            shares[idx] += 1;
            leftover -= 1;
        }

        shares.into_iter().map(Money).collect()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Rates
// =============================================================================

/// A percentage rate in basis points (1 bps = 0.01%).
///
/// 800 bps = 8%, 1200 bps = 12%. Basis points keep rate arithmetic in
/// integers all the way down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBps(u32);

impl RateBps {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RateBps(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Applies the rate to an amount, rounding half up.
    ///
    /// Integer math: `(cents * bps + 5000) / 10000`, computed in i128 to
    /// rule out overflow on large amounts.
    pub fn apply(&self, amount: Money) -> Money {
        let cents = (amount.cents() as i128 * self.0 as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Charge Schedule
// =============================================================================

/// The tax and service-charge rates applied to a subtotal.
///
/// ## Why two published defaults?
/// The product historically computed order totals at 8% tax / 5% service and
/// bill totals at 10% tax / 12% service. We read that divergence as
/// order-time *estimate* vs final *invoice* rate and make it explicit
/// configuration: each store is constructed with its schedule, and a venue
/// wanting one canonical rate simply passes the same schedule twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSchedule {
    /// Tax rate applied to the subtotal.
    pub tax: RateBps,
    /// Service charge applied to the subtotal (distinct from tax).
    pub service: RateBps,
}

impl ChargeSchedule {
    /// Order-time estimate schedule: 8% tax, 5% service.
    pub const ORDER_ESTIMATE: ChargeSchedule = ChargeSchedule {
        tax: RateBps::from_bps(800),
        service: RateBps::from_bps(500),
    };

    /// Final invoice schedule: 10% tax, 12% service.
    pub const INVOICE: ChargeSchedule = ChargeSchedule {
        tax: RateBps::from_bps(1000),
        service: RateBps::from_bps(1200),
    };

    pub const fn new(tax: RateBps, service: RateBps) -> Self {
        ChargeSchedule { tax, service }
    }

    /// Computes the full charge breakdown for a subtotal.
    pub fn breakdown(&self, subtotal: Money) -> ChargeBreakdown {
        let tax = self.tax.apply(subtotal);
        let service = self.service.apply(subtotal);
        ChargeBreakdown {
            subtotal,
            tax,
            service,
            total: subtotal + tax + service,
        }
    }
}

/// Subtotal, tax, service charge, and their sum.
///
/// Invariant: `total == subtotal + tax + service` (by construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub service: Money,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1250);
        assert_eq!(money.cents(), 1250);
        assert_eq!(money.euros(), 12);
        assert_eq!(money.cents_part(), 50);
    }

    #[test]
    fn test_from_euros_cents() {
        assert_eq!(Money::from_euros_cents(12, 50).cents(), 1250);
        assert_eq!(Money::from_euros_cents(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1250)), "€12.50");
        assert_eq!(format!("{}", Money::from_cents(500)), "€5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((b * 3).cents(), 750);

        let sum: Money = [a, b, b].into_iter().sum();
        assert_eq!(sum.cents(), 1500);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-100).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(100).clamp_non_negative().cents(), 100);
    }

    #[test]
    fn test_split_even_exact() {
        let shares = Money::from_cents(3000).split_even(3);
        assert_eq!(
            shares.iter().map(Money::cents).collect::<Vec<_>>(),
            vec![1000, 1000, 1000]
        );
    }

    #[test]
    fn test_split_even_remainder_goes_to_earliest_shares() {
        // €49.41 split two ways -> €24.71 / €24.70
        let shares = Money::from_cents(4941).split_even(2);
        assert_eq!(shares[0].cents(), 2471);
        assert_eq!(shares[1].cents(), 2470);

        // €10.00 three ways -> 334, 333, 333
        let shares = Money::from_cents(1000).split_even(3);
        assert_eq!(
            shares.iter().map(Money::cents).collect::<Vec<_>>(),
            vec![334, 333, 333]
        );
    }

    #[test]
    fn test_split_even_sums_back_exactly() {
        for n in 1..=9 {
            let total = Money::from_cents(4941);
            let sum: Money = total.split_even(n).into_iter().sum();
            assert_eq!(sum, total, "split into {} shares lost cents", n);
        }
    }

    #[test]
    fn test_allocate_proportional() {
        // Weights 2:1:1 on €10.00 -> 500, 250, 250
        let shares = Money::from_cents(1000).allocate(&[200, 100, 100]);
        assert_eq!(
            shares.iter().map(Money::cents).collect::<Vec<_>>(),
            vec![500, 250, 250]
        );
    }

    #[test]
    fn test_allocate_largest_remainder() {
        // €1.00 over weights 1:1:1 -> 34, 33, 33 and sums back exactly
        let total = Money::from_cents(100);
        let shares = total.allocate(&[1, 1, 1]);
        assert_eq!(
            shares.iter().map(Money::cents).collect::<Vec<_>>(),
            vec![34, 33, 33]
        );
        let sum: Money = shares.into_iter().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_allocate_negative_amount_mirrors() {
        let total = Money::from_cents(-100);
        let shares = total.allocate(&[1, 1, 1]);
        assert_eq!(
            shares.iter().map(Money::cents).collect::<Vec<_>>(),
            vec![-34, -33, -33]
        );
    }

    #[test]
    fn test_allocate_sums_back_exactly_on_awkward_weights() {
        let total = Money::from_cents(4941);
        let shares = total.allocate(&[1299, 2150, 650, 842]);
        let sum: Money = shares.iter().copied().sum();
        assert_eq!(sum, total);
    }

    #[test]
    fn test_rate_apply_rounds_half_up() {
        // €10.00 at 8.25% = €0.825 -> €0.83
        let rate = RateBps::from_bps(825);
        assert_eq!(rate.apply(Money::from_cents(1000)).cents(), 83);

        // €40.50 at 12% = €4.86 exactly
        let rate = RateBps::from_bps(1200);
        assert_eq!(rate.apply(Money::from_cents(4050)).cents(), 486);
    }

    #[test]
    fn test_invoice_schedule_scenario() {
        // €40.50 subtotal -> tax €4.05, service €4.86, total €49.41
        let breakdown = ChargeSchedule::INVOICE.breakdown(Money::from_cents(4050));
        assert_eq!(breakdown.tax.cents(), 405);
        assert_eq!(breakdown.service.cents(), 486);
        assert_eq!(breakdown.total.cents(), 4941);
    }

    #[test]
    fn test_order_estimate_schedule() {
        // €40.50 subtotal -> tax €3.24, service €2.03 (rounded up from 2.025)
        let breakdown = ChargeSchedule::ORDER_ESTIMATE.breakdown(Money::from_cents(4050));
        assert_eq!(breakdown.tax.cents(), 324);
        assert_eq!(breakdown.service.cents(), 203);
        assert_eq!(breakdown.total.cents(), 4050 + 324 + 203);
    }

    #[test]
    fn test_breakdown_invariant() {
        let b = ChargeSchedule::INVOICE.breakdown(Money::from_cents(12345));
        assert_eq!(b.total, b.subtotal + b.tax + b.service);
    }
}
