//! # Line Item Store
//!
//! The cart of a comprobante being edited.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action              Method                  Cart Change             │
//! │  ─────────              ──────                  ───────────             │
//! │                                                                         │
//! │  Click product ───────► add_product() ────────► push or quantity += 1   │
//! │                                                                         │
//! │  Free-text line ──────► add_free_text() ──────► push (no product id)    │
//! │                                                                         │
//! │  Edit qty/discount ───► update_item() ────────► items[i] patched        │
//! │                                                                         │
//! │  "−" button ──────────► decrement() ──────────► qty -= 1 (0 removes)    │
//! │                                                                         │
//! │  Edit dialog ─────────► edit_line_details() ──► items[i] replaced       │
//! │                                                                         │
//! │  Trash icon ──────────► remove_item() ────────► items.remove(line_id)   │
//! │                                                                         │
//! │  NOTE: Every method validates first and mutates last. A returned error  │
//! │        means the cart is exactly as it was.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::MAX_CART_ITEMS;
use crate::validation::{
    validate_cart_size, validate_description, validate_discount_percent, validate_quantity,
    validate_unit_price,
};

// =============================================================================
// Line Item
// =============================================================================

/// One line of the comprobante.
///
/// ## Derived Fields
/// `line_total`, `sale_base`, `igv` and `discount` are re-derived by
/// [`LineItem::recompute`] after every change and are never edited directly.
/// Prices are IGV-inclusive:
/// ```text
/// line_total = unit_price × quantity
/// sale_base  = line_total / 1.18
/// igv        = line_total − sale_base
/// discount   = line_total × discount_percent / 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Identity of the line inside the cart (UUID v4).
    pub line_id: String,

    /// `None` for free-text lines.
    pub product_id: Option<i64>,

    pub description: String,

    pub unit: Option<String>,

    #[ts(type = "number")]
    pub quantity: Decimal,

    /// IGV-inclusive unit price, frozen when the line is added.
    pub unit_price: Money,

    #[ts(type = "number")]
    pub discount_percent: Decimal,

    /// Stock known when the product was added; `None` means untracked.
    pub stock_available: Option<i64>,

    pub line_total: Money,
    pub sale_base: Money,
    pub igv: Money,
    pub discount: Money,
}

impl LineItem {
    /// Creates a line from a product at quantity 1.
    pub fn from_product(product: &Product, igv_rate: TaxRate) -> Self {
        let mut item = LineItem {
            line_id: Uuid::new_v4().to_string(),
            product_id: Some(product.id),
            description: product.description.clone(),
            unit: product.unit.clone(),
            quantity: Decimal::ONE,
            unit_price: product.unit_price,
            discount_percent: Decimal::ZERO,
            stock_available: Some(product.stock),
            line_total: Money::zero(),
            sale_base: Money::zero(),
            igv: Money::zero(),
            discount: Money::zero(),
        };
        item.recompute(igv_rate);
        item
    }

    /// Creates a free-text line (services, ad-hoc charges).
    pub fn free_text(
        description: &str,
        unit_price: Money,
        quantity: Decimal,
        igv_rate: TaxRate,
    ) -> Self {
        let mut item = LineItem {
            line_id: Uuid::new_v4().to_string(),
            product_id: None,
            description: description.trim().to_string(),
            unit: None,
            quantity,
            unit_price,
            discount_percent: Decimal::ZERO,
            stock_available: None,
            line_total: Money::zero(),
            sale_base: Money::zero(),
            igv: Money::zero(),
            discount: Money::zero(),
        };
        item.recompute(igv_rate);
        item
    }

    /// Re-derives `line_total`, `sale_base`, `igv` and `discount`.
    pub fn recompute(&mut self, igv_rate: TaxRate) {
        self.line_total = self.unit_price * self.quantity;
        let (base, igv) = self.line_total.split_included_tax(igv_rate);
        self.sale_base = base;
        self.igv = igv;
        self.discount = self.line_total.percent(self.discount_percent);
    }

    /// Fails with `InsufficientStock` if `quantity` exceeds the known stock.
    pub fn check_stock(&self, quantity: Decimal) -> CoreResult<()> {
        match self.stock_available {
            Some(available) if quantity > Decimal::from(available) => {
                Err(CoreError::InsufficientStock {
                    description: self.description.clone(),
                    available,
                    requested: quantity.normalize().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Edit Payloads
// =============================================================================

/// Partial update from inline cart controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    /// Zero removes the line.
    #[ts(type = "number | null")]
    pub quantity: Option<Decimal>,

    #[ts(type = "number | null")]
    pub discount_percent: Option<Decimal>,

    pub unit_price: Option<Money>,
}

/// Full replacement from the edit dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineDetails {
    pub unit_price: Money,
    #[ts(type = "number")]
    pub quantity: Decimal,
    #[ts(type = "number")]
    pub discount_percent: Decimal,
    pub description: String,
}

/// What an update did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Updated,
    Removed,
}

// =============================================================================
// Cart
// =============================================================================

/// The ordered list of lines on the draft.
///
/// ## Invariants
/// - At most one line per product id (adding again increases quantity)
/// - `0 < quantity <= stock_available` for every line
/// - Derived fields are always in sync with quantity/price/discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<LineItem>,
    igv_rate: TaxRate,
}

impl Cart {
    /// Creates an empty cart that derives IGV at `igv_rate`.
    pub fn new(igv_rate: TaxRate) -> Self {
        Cart {
            items: Vec::new(),
            igv_rate,
        }
    }

    /// Lines in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity + 1, bounded by stock
    /// - Product not in cart: new line at quantity 1 (needs stock >= 1)
    ///
    /// ## Returns
    /// The index of the affected line. On `InsufficientStock` the cart is
    /// unchanged; the caller shows it as a warning.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<usize> {
        if let Some(index) = self
            .items
            .iter()
            .position(|i| i.product_id == Some(product.id))
        {
            let rate = self.igv_rate;
            let item = &mut self.items[index];
            let quantity = item.quantity + Decimal::ONE;
            // Bound by the stock the catalog reports now, not at first add.
            let restocked = LineItem {
                stock_available: Some(product.stock),
                ..item.clone()
            };
            restocked.check_stock(quantity)?;
            item.stock_available = restocked.stock_available;
            item.quantity = quantity;
            item.recompute(rate);
            return Ok(index);
        }

        self.ensure_capacity()?;

        let item = LineItem::from_product(product, self.igv_rate);
        item.check_stock(Decimal::ONE)?;
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    /// Adds a free-text line with untracked stock.
    pub fn add_free_text(
        &mut self,
        description: &str,
        unit_price: Money,
        quantity: Decimal,
    ) -> CoreResult<usize> {
        validate_description(description)?;
        validate_unit_price(unit_price)?;
        validate_quantity(quantity)?;
        self.ensure_capacity()?;

        self.items.push(LineItem::free_text(
            description,
            unit_price,
            quantity,
            self.igv_rate,
        ));
        Ok(self.items.len() - 1)
    }

    /// Applies an inline patch to the line at `index`.
    ///
    /// A quantity of zero removes the line.
    pub fn update_item(&mut self, index: usize, patch: LineItemPatch) -> CoreResult<LineChange> {
        let item = self.line(index)?;

        if patch.quantity == Some(Decimal::ZERO) {
            self.items.remove(index);
            return Ok(LineChange::Removed);
        }

        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
            item.check_stock(quantity)?;
        }
        if let Some(percent) = patch.discount_percent {
            validate_discount_percent(percent)?;
        }
        if let Some(price) = patch.unit_price {
            validate_unit_price(price)?;
        }

        let rate = self.igv_rate;
        let item = &mut self.items[index];
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(percent) = patch.discount_percent {
            item.discount_percent = percent;
        }
        if let Some(price) = patch.unit_price {
            item.unit_price = price;
        }
        item.recompute(rate);
        Ok(LineChange::Updated)
    }

    /// Decreases the quantity of the line at `index` by one.
    ///
    /// Reaching zero (or less, for fractional quantities) removes the line.
    pub fn decrement(&mut self, index: usize) -> CoreResult<LineChange> {
        let quantity = self.line(index)?.quantity - Decimal::ONE;
        if quantity <= Decimal::ZERO {
            self.items.remove(index);
            return Ok(LineChange::Removed);
        }

        let rate = self.igv_rate;
        let item = &mut self.items[index];
        item.quantity = quantity;
        item.recompute(rate);
        Ok(LineChange::Updated)
    }

    /// Replaces price, quantity, discount and description of a line.
    pub fn edit_line_details(&mut self, index: usize, details: LineDetails) -> CoreResult<()> {
        let item = self.line(index)?;

        validate_unit_price(details.unit_price)?;
        validate_quantity(details.quantity)?;
        validate_discount_percent(details.discount_percent)?;
        validate_description(&details.description)?;
        item.check_stock(details.quantity)?;

        let rate = self.igv_rate;
        let item = &mut self.items[index];
        item.unit_price = details.unit_price;
        item.quantity = details.quantity;
        item.discount_percent = details.discount_percent;
        item.description = details.description.trim().to_string();
        item.recompute(rate);
        Ok(())
    }

    /// Removes a line by identity.
    pub fn remove_item(&mut self, line_id: &str) -> CoreResult<LineItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.line_id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn ensure_capacity(&self) -> CoreResult<()> {
        validate_cart_size(self.items.len())
            .map_err(|_| CoreError::CartTooLarge { max: MAX_CART_ITEMS })
    }

    fn line(&self, index: usize) -> CoreResult<&LineItem> {
        self.items
            .get(index)
            .ok_or_else(|| CoreError::LineNotFound(format!("#{}", index)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
