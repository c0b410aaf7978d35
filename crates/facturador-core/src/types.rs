//! # Domain Types
//!
//! Catalog and reference types shared by the cart, the regime resolver and
//! the submission assembler.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Client      │   │ OperationType   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  name           │   │  codigo (0101,  │       │
//! │  │  unit_price     │   │  document_number│   │   0112, ...)    │       │
//! │  │  stock          │   │  DNI / RUC      │   │  descripcion    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  DocumentType   │   │  PaymentTerms   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  FACTURA        │   │  CONTADO        │       │
//! │  │  1800 = 18%     │   │  BOLETA, ...    │   │  CREDITO        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (IGV), 300 bps = 3% (Retención)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (`18` → 1800 bps).
    ///
    /// Returns `None` for negative or out-of-range percentages.
    pub fn from_percent(percent: Decimal) -> Option<Self> {
        (percent * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
            .map(TaxRate)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a fraction (`0.18`).
    #[inline]
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// Returns the rate as a percentage (`18.00`).
    #[inline]
    pub fn as_percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }

    /// Returns `1 + rate`, the divisor for extracting an included tax.
    #[inline]
    pub fn divisor(&self) -> Decimal {
        Decimal::ONE + self.as_fraction()
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product as returned by the backend's product search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Name shown to the cashier and printed on the receipt.
    pub description: String,

    /// IGV-inclusive unit price.
    pub unit_price: Money,

    /// Units currently available.
    pub stock: i64,

    /// Unit of measure (NIU, KGM, ZZ...).
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub category: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Kind of identity document, inferred from its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentKind {
    /// 8-digit national identity document.
    Dni,
    /// 11-digit taxpayer registry number.
    Ruc,
}

impl DocumentKind {
    /// Classifies a document number: 8 digits → DNI, 11 digits → RUC.
    ///
    /// ## Example
    /// ```rust
    /// use facturador_core::types::DocumentKind;
    ///
    /// assert_eq!(DocumentKind::classify("87654321"), Some(DocumentKind::Dni));
    /// assert_eq!(DocumentKind::classify("20123456789"), Some(DocumentKind::Ruc));
    /// assert_eq!(DocumentKind::classify("2012345678A"), None);
    /// ```
    pub fn classify(number: &str) -> Option<Self> {
        let number = number.trim();
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match number.len() {
            8 => Some(DocumentKind::Dni),
            11 => Some(DocumentKind::Ruc),
            _ => None,
        }
    }
}

/// The buyer on a comprobante.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: Option<i64>,

    /// Full name or razón social.
    pub name: String,

    /// DNI (8 digits) or RUC (11 digits).
    #[serde(default)]
    pub document_number: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

impl Client {
    /// Returns the document kind, if the number is a valid DNI or RUC.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        DocumentKind::classify(&self.document_number)
    }

    /// A client counts as selected once it has a non-blank name.
    pub fn is_selected(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

// =============================================================================
// Catalogs
// =============================================================================

/// "Tipo de operación" catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OperationType {
    pub id: i64,

    /// SUNAT catalog 51 code, e.g. `0101` (venta interna), `0112`.
    pub codigo: String,

    pub descripcion: String,

    /// Whether a global discount may be applied under this operation.
    #[serde(default = "default_true")]
    pub allows_global_discount: bool,
}

fn default_true() -> bool {
    true
}

/// "Tipo de detracción" catalog entry (goods/services subject to SPOT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipoDetraccion {
    pub id: i64,
    pub codigo: String,
    pub descripcion: String,
    /// Percentage withheld, e.g. `12` for 12%.
    #[ts(type = "number")]
    pub porcentaje: Decimal,
}

/// Payment channel for the detracción deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MedioPagoDetraccion {
    pub id: i64,
    pub codigo: String,
    pub descripcion: String,
}

// =============================================================================
// Company
// =============================================================================

/// The issuing company, as far as the engine cares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub ruc: String,
    pub razon_social: String,
    /// Registered by SUNAT as a retention agent.
    #[serde(default)]
    pub es_agente_retencion: bool,
}

// =============================================================================
// Document Type
// =============================================================================

/// Kind of comprobante being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DocumentType {
    #[serde(rename = "FACTURA")]
    Factura,
    #[default]
    #[serde(rename = "BOLETA")]
    Boleta,
    #[serde(rename = "NOTA DE CREDITO")]
    NotaCredito,
    #[serde(rename = "NOTA DE DEBITO")]
    NotaDebito,
    #[serde(rename = "TICKET")]
    Ticket,
    #[serde(rename = "COTIZACIÓN")]
    Cotizacion,
    /// Nota de pedido.
    #[serde(rename = "NP")]
    NotaPedido,
    /// Orden de trabajo.
    #[serde(rename = "OT")]
    OrdenTrabajo,
}

impl DocumentType {
    /// Display label, identical to the wire name.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Factura => "FACTURA",
            DocumentType::Boleta => "BOLETA",
            DocumentType::NotaCredito => "NOTA DE CREDITO",
            DocumentType::NotaDebito => "NOTA DE DEBITO",
            DocumentType::Ticket => "TICKET",
            DocumentType::Cotizacion => "COTIZACIÓN",
            DocumentType::NotaPedido => "NP",
            DocumentType::OrdenTrabajo => "OT",
        }
    }

    /// NP and OT may carry an advance payment (adelanto).
    pub fn accepts_advance(&self) -> bool {
        matches!(self, DocumentType::NotaPedido | DocumentType::OrdenTrabajo)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reference to the document a credit note amends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub serie: String,
    pub correlativo: String,
    #[serde(default)]
    pub motivo: Option<String>,
}

// =============================================================================
// Payment
// =============================================================================

/// How the customer pays at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Efectivo,
    Tarjeta,
    Transferencia,
    Yape,
    Plin,
}

/// Cash sale or sale on credit with installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentTerms {
    #[default]
    Contado,
    Credito,
}

/// One credit installment (cuota).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub amount: Money,
    /// `None` until the cashier picks a date; required before saving.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
}

impl Installment {
    pub fn new(amount: Money, due_date: NaiveDate) -> Self {
        Installment {
            amount,
            due_date: Some(due_date),
        }
    }
}

/// Document currency. Drives the leyenda wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Pen,
    Usd,
}

impl Currency {
    /// Currency name as spelled in the leyenda.
    pub fn leyenda_name(&self) -> &'static str {
        match self {
            Currency::Pen => "SOLES",
            Currency::Usd => "DÓLARES AMERICANOS",
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
