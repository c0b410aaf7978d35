//! # Money Module
//!
//! Provides the `Money` type for handling monetary values in soles.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE INTEGER CENTS PROBLEM (for IGV-inclusive prices)                   │
//! │    S/ 500.00 / 1.18 = 423.7288135...                                    │
//! │    Cents would force rounding BEFORE igv = total - base is computed     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, rounded only at the boundary            │
//! │    gravada = 423.7288135593220338983050847                              │
//! │    igv     =  76.2711864406779661016949153                              │
//! │    gravada + igv == 500 exactly; round2() only for payload/receipt      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use facturador_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_cents(10_000); // S/ 100.00
//! let line_total = price * Decimal::from(5);
//! assert_eq!(line_total, Money::from_cents(50_000));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Number of decimal places shown on receipts and sent to the backend.
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in soles (or dollars for USD documents).
///
/// ## Design Decisions
/// - **Decimal, not f64**: no binary representation error
/// - **Unrounded by default**: intermediate math keeps full precision
/// - **`round2()` at the edge**: payload, receipt and regime amounts
///
/// ## Where Money is Used
/// ```text
/// Product.unit_price ──► LineItem.unit_price ──► LineItem.line_total
///                                                      │
///                      Σ line_total = subtotal ◄───────┘
///                                │
///              subtotal - global discount = adjusted_total
///                                │
///                 ┌──────────────┼──────────────┐
///                 ▼              ▼              ▼
///              gravada          IGV     detracción/retención
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use facturador_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // S/ 10.99
    /// assert_eq!(price.to_string(), "S/ 10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_SCALE))
    }

    /// Creates a Money value from whole soles.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns the zero amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the amount at zero.
    #[inline]
    pub fn max_zero(self) -> Self {
        if self.is_negative() {
            Money::zero()
        } else {
            self
        }
    }

    /// Rounds to 2 decimals, midpoint away from zero.
    ///
    /// Matches what the cashier sees on a receipt: 0.125 → 0.13.
    /// Call this only at presentation/serialization boundaries.
    ///
    /// ## Example
    /// ```rust
    /// use facturador_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let raw = Money::new(Decimal::new(423_728_8, 4)); // 423.7288
    /// assert_eq!(raw.round2(), Money::from_cents(42373));
    /// ```
    pub fn round2(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns `self * percent / 100`, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use facturador_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let total = Money::from_units(750);
    /// assert_eq!(total.percent(Decimal::from(3)), Money::new(Decimal::new(2250, 2)));
    /// ```
    pub fn percent(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Applies a rate on top of the amount (`self * rate`), unrounded.
    pub fn apply_rate(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.as_fraction())
    }

    /// Splits a tax-inclusive amount into `(base, tax)`.
    ///
    /// ## Formula
    /// ```text
    /// base = amount / (1 + rate)       e.g. 118.00 / 1.18 = 100.00
    /// tax  = amount - base             e.g. 118.00 - 100.00 = 18.00
    /// ```
    /// `base + tax == amount` holds exactly because `tax` is the remainder.
    pub fn split_included_tax(&self, rate: TaxRate) -> (Money, Money) {
        let base = Money(self.0 / rate.divisor());
        (base, *self - base)
    }

    /// Absolute difference between two amounts.
    #[inline]
    pub fn distance(&self, other: Money) -> Money {
        (*self - other).abs()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money the way Peruvian receipts do: `S/ 1234.50`.
///
/// ## Note
/// This is for logs and tests. Thousands separators and localization are the
/// renderer's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round2().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{}S/ {:.2}", sign, rounded.abs())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a decimal quantity (line totals).
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
        assert_eq!(Money::from_units(7), Money::new(dec!(7)));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "S/ 10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "S/ 5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-S/ 5.50");
        assert_eq!(format!("{}", Money::zero()), "S/ 0.00");
        assert_eq!(format!("{}", Money::new(dec!(423.7288))), "S/ 423.73");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(a * dec!(3), Money::from_cents(3000));
        assert_eq!(-a, Money::from_cents(-1000));

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total, Money::from_cents(2000));
    }

    #[test]
    fn test_round2_midpoint_away_from_zero() {
        assert_eq!(Money::new(dec!(0.125)).round2(), Money::new(dec!(0.13)));
        assert_eq!(Money::new(dec!(0.124)).round2(), Money::new(dec!(0.12)));
        assert_eq!(Money::new(dec!(-0.125)).round2(), Money::new(dec!(-0.13)));
    }

    #[test]
    fn test_split_included_tax_is_exact() {
        let total = Money::from_units(500);
        let (base, tax) = total.split_included_tax(TaxRate::from_bps(1800));

        assert_eq!(base + tax, total);
        assert_eq!(base.round2(), Money::new(dec!(423.73)));
        assert_eq!(tax.round2(), Money::new(dec!(76.27)));
    }

    #[test]
    fn test_percent_and_rate() {
        let total = Money::from_units(750);
        assert_eq!(total.percent(dec!(3)), Money::new(dec!(22.50)));
        assert_eq!(
            total.apply_rate(TaxRate::from_bps(300)),
            Money::new(dec!(22.50))
        );
        assert_eq!(total.percent(dec!(12)).round2(), Money::new(dec!(90)));
    }

    #[test]
    fn test_max_zero_and_checks() {
        assert_eq!(Money::from_cents(-1).max_zero(), Money::zero());
        assert_eq!(Money::from_cents(1).max_zero(), Money::from_cents(1));

        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs(), Money::from_cents(100));
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Money::from_cents(2250)).unwrap();
        assert_eq!(json, "22.5");
    }
}
