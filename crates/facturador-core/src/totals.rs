//! # Totals Calculator
//!
//! Pure functions turning the cart into the numbers printed on the
//! comprobante.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  items ──► compute_totals() ──► subtotal, discount, has_discount        │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │  global discount ──► compute_adjusted() ──► adjusted_total (>= 0)       │
//! │  (if the operation                 │                                    │
//! │   type allows it)                  ▼                                    │
//! │                     compute_tax() ──► gravada = adjusted / 1.18         │
//! │                                       igv     = adjusted − gravada      │
//! │                                                                         │
//! │  Nothing here rounds. InvoiceTotals::rounded() is the only 2-dp copy.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-line discounts are reported (`discount`, `has_discount`) but do not
//! reduce `adjusted_total`; only the global discount does.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItem;
use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Result Types
// =============================================================================

/// Sums over the cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub has_discount: bool,
}

/// Gravada/IGV split of a tax-inclusive amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxBreakdown {
    pub gravada: Money,
    pub igv: Money,
}

/// Everything the draft needs to show and submit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub has_discount: bool,
    /// Global discount as actually applied (zero when not applicable).
    pub global_discount: Money,
    pub adjusted_total: Money,
    pub gravada: Money,
    pub igv: Money,
}

impl InvoiceTotals {
    /// Presentation copy with every amount rounded to 2 decimals.
    ///
    /// `igv` is re-derived as `adjusted − gravada` after rounding so the
    /// printed figures still add up.
    pub fn rounded(&self) -> InvoiceTotals {
        let adjusted_total = self.adjusted_total.round2();
        let gravada = self.gravada.round2();
        InvoiceTotals {
            subtotal: self.subtotal.round2(),
            discount: self.discount.round2(),
            has_discount: self.has_discount,
            global_discount: self.global_discount.round2(),
            adjusted_total,
            gravada,
            igv: adjusted_total - gravada,
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Sums line totals and per-line discounts.
pub fn compute_totals(items: &[LineItem]) -> CartTotals {
    let subtotal: Money = items.iter().map(|i| i.line_total).sum();
    let discount: Money = items.iter().map(|i| i.discount).sum();

    CartTotals {
        subtotal,
        discount,
        has_discount: discount.is_positive(),
    }
}

/// Applies the global discount when the operation type allows it.
///
/// Idempotent and never negative.
///
/// ## Example
/// ```rust
/// use facturador_core::money::Money;
/// use facturador_core::totals::compute_adjusted;
///
/// let subtotal = Money::from_units(100);
/// assert_eq!(compute_adjusted(subtotal, Money::from_units(30), true), Money::from_units(70));
/// assert_eq!(compute_adjusted(subtotal, Money::from_units(130), true), Money::zero());
/// assert_eq!(compute_adjusted(subtotal, Money::from_units(30), false), subtotal);
/// ```
pub fn compute_adjusted(subtotal: Money, global_discount: Money, applicable: bool) -> Money {
    if applicable {
        (subtotal - global_discount).max_zero()
    } else {
        subtotal
    }
}

/// Splits an IGV-inclusive total into gravada and IGV.
pub fn compute_tax(adjusted_total: Money, igv_rate: TaxRate) -> TaxBreakdown {
    let (gravada, igv) = adjusted_total.split_included_tax(igv_rate);
    TaxBreakdown { gravada, igv }
}

/// Runs the whole pipeline.
pub fn compute_invoice_totals(
    items: &[LineItem],
    global_discount: Money,
    applicable: bool,
    igv_rate: TaxRate,
) -> InvoiceTotals {
    let cart = compute_totals(items);
    let adjusted_total = compute_adjusted(cart.subtotal, global_discount, applicable);
    let tax = compute_tax(adjusted_total, igv_rate);

    InvoiceTotals {
        subtotal: cart.subtotal,
        discount: cart.discount,
        has_discount: cart.has_discount,
        global_discount: cart.subtotal - adjusted_total,
        adjusted_total,
        gravada: tax.gravada,
        igv: tax.igv,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::types::Product;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const IGV: TaxRate = TaxRate::from_bps(1800);

    fn cart_with(price_cents: i64, quantity: Decimal, discount: Decimal) -> Cart {
        let mut cart = Cart::new(IGV);
        let product = Product {
            id: 1,
            description: "Producto".to_string(),
            unit_price: Money::from_cents(price_cents),
            stock: 1_000,
            unit: None,
            category: None,
        };
        cart.add_product(&product).unwrap();
        cart.update_item(
            0,
            crate::cart::LineItemPatch {
                quantity: Some(quantity),
                discount_percent: Some(discount),
                unit_price: None,
            },
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_five_units_of_one_hundred() {
        let cart = cart_with(10000, dec!(5), dec!(0));
        let totals = compute_invoice_totals(cart.items(), Money::zero(), true, IGV);
        let rounded = totals.rounded();

        assert_eq!(rounded.subtotal, Money::from_units(500));
        assert_eq!(rounded.adjusted_total, Money::from_units(500));
        assert_eq!(rounded.gravada, Money::from_cents(42373));
        assert_eq!(rounded.igv, Money::from_cents(7627));
        assert!(!rounded.has_discount);
    }

    #[test]
    fn test_line_discount_is_reported_not_subtracted() {
        let cart = cart_with(10000, dec!(2), dec!(10));
        let totals = compute_invoice_totals(cart.items(), Money::zero(), true, IGV);

        assert!(totals.has_discount);
        assert_eq!(totals.discount, Money::from_units(20));
        assert_eq!(totals.adjusted_total, Money::from_units(200));
    }

    #[test]
    fn test_global_discount_only_when_applicable() {
        let cart = cart_with(10000, dec!(2), dec!(0));

        let applied = compute_invoice_totals(cart.items(), Money::from_units(50), true, IGV);
        assert_eq!(applied.adjusted_total, Money::from_units(150));
        assert_eq!(applied.global_discount, Money::from_units(50));

        let ignored = compute_invoice_totals(cart.items(), Money::from_units(50), false, IGV);
        assert_eq!(ignored.adjusted_total, Money::from_units(200));
        assert_eq!(ignored.global_discount, Money::zero());
    }

    #[test]
    fn test_global_discount_larger_than_subtotal_floors_at_zero() {
        let cart = cart_with(1000, dec!(1), dec!(0));
        let totals = compute_invoice_totals(cart.items(), Money::from_units(25), true, IGV);

        assert_eq!(totals.adjusted_total, Money::zero());
        assert_eq!(totals.gravada, Money::zero());
        assert_eq!(totals.igv, Money::zero());
        assert_eq!(totals.global_discount, Money::from_units(10));
    }

    #[test]
    fn test_empty_cart() {
        let totals = compute_invoice_totals(&[], Money::zero(), true, IGV);
        assert_eq!(totals, InvoiceTotals::default());
    }

    #[test]
    fn test_rounded_figures_add_up() {
        let cart = cart_with(333, dec!(7), dec!(0));
        let rounded = compute_invoice_totals(cart.items(), Money::zero(), true, IGV).rounded();
        assert_eq!(rounded.gravada + rounded.igv, rounded.adjusted_total);
    }

    proptest! {
        #[test]
        fn prop_adjusted_is_idempotent_and_non_negative(
            subtotal in 0i64..10_000_000,
            discount in 0i64..20_000_000,
            applicable in any::<bool>(),
        ) {
            let subtotal = Money::from_cents(subtotal);
            let discount = Money::from_cents(discount);

            let first = compute_adjusted(subtotal, discount, applicable);
            let second = compute_adjusted(subtotal, discount, applicable);

            prop_assert_eq!(first, second);
            prop_assert!(!first.is_negative());
            prop_assert!(first <= subtotal);
        }

        #[test]
        fn prop_line_fields_are_consistent(
            price in 0i64..1_000_000,
            quantity in 1i64..500,
        ) {
            let cart = cart_with(price, Decimal::from(quantity), dec!(0));
            let line = &cart.items()[0];

            prop_assert_eq!(line.line_total, Money::from_cents(price) * Decimal::from(quantity));
            prop_assert_eq!(line.sale_base, Money::new(line.line_total.amount() / IGV.divisor()));
            prop_assert_eq!(line.igv, line.line_total - line.sale_base);
            prop_assert_eq!(line.sale_base + line.igv, line.line_total);
        }
    }
}
