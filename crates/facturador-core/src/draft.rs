//! # Invoice Draft
//!
//! The comprobante being edited: header fields, the cart and the regime.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InvoiceDraft                                                           │
//! │  ├── document_type, issue_date, currency                                │
//! │  ├── client, reference (NC), advance (NP/OT)                            │
//! │  ├── operation_type ──► decides detracción and global discount          │
//! │  ├── cart ──────────► totals                                            │
//! │  ├── regime ────────► NONE | DETRACCION | RETENCION                     │
//! │  ├── payment_method, observations                                       │
//! │  └── idempotency_key (kept across retries, new after success)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::money::Money;
use crate::regime::TaxRegime;
use crate::totals::{compute_invoice_totals, InvoiceTotals};
use crate::types::{
    Client, Currency, DocumentReference, DocumentType, OperationType, PaymentMethod, TaxRate,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub document_type: DocumentType,
    pub client: Option<Client>,
    pub operation_type: Option<OperationType>,
    pub cart: Cart,
    /// As entered; applied only when the operation type allows it.
    pub global_discount: Money,
    pub regime: TaxRegime,
    pub payment_method: PaymentMethod,
    pub observations: String,
    pub currency: Currency,
    pub reference: Option<DocumentReference>,
    pub advance: Option<Money>,
    pub issue_date: NaiveDate,
    pub idempotency_key: Uuid,
}

impl InvoiceDraft {
    /// Creates an empty BOLETA draft with a fresh idempotency key.
    pub fn new(igv_rate: TaxRate, issue_date: NaiveDate) -> Self {
        InvoiceDraft {
            document_type: DocumentType::default(),
            client: None,
            operation_type: None,
            cart: Cart::new(igv_rate),
            global_discount: Money::zero(),
            regime: TaxRegime::None,
            payment_method: PaymentMethod::default(),
            observations: String::new(),
            currency: Currency::default(),
            reference: None,
            advance: None,
            issue_date,
            idempotency_key: Uuid::new_v4(),
        }
    }

    /// Code of the selected operation type.
    pub fn operation_code(&self) -> Option<&str> {
        self.operation_type.as_ref().map(|op| op.codigo.as_str())
    }

    /// Without an operation type the global discount applies.
    pub fn global_discount_applicable(&self) -> bool {
        self.operation_type
            .as_ref()
            .map_or(true, |op| op.allows_global_discount)
    }

    /// Recomputes the totals from scratch.
    pub fn totals(&self, igv_rate: TaxRate) -> InvoiceTotals {
        compute_invoice_totals(
            self.cart.items(),
            self.global_discount,
            self.global_discount_applicable(),
            igv_rate,
        )
    }
}
