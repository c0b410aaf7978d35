//! # Backend Interfaces
//!
//! The collaborators the invoice screen talks to, as async traits.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait              Operations                      REST                │
//! │  ─────────────────  ──────────────────────────────  ──────────────────  │
//! │  ProductCatalog     search_products                 GET /productos      │
//! │  ClientDirectory    search_clients                  GET /clientes       │
//! │                     lookup_by_document              GET /clientes/dni/n │
//! │                                                     GET /clientes/ruc/n │
//! │  CatalogSource      operation_types                 GET /tipos-operacion│
//! │                     tipos_detraccion                GET /tipos-detracc. │
//! │                     medios_pago_detraccion          GET /medios-pago-.. │
//! │  InvoiceGateway     submit                          POST /comprobantes  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`HttpBackend`](crate::http::HttpBackend) implements all four. Tests use
//! in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use facturador_core::{
    Client, DocumentKind, MedioPagoDetraccion, OperationType, Product, SubmissionPayload,
    TipoDetraccion,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Pagination
// =============================================================================

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Total matches across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty(page: u32, limit: u32) -> Self {
        Page {
            items: Vec::new(),
            page,
            limit,
            total: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.limit) < self.total
    }
}

/// Product search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductQuery {
    pub text: String,
    pub category_id: Option<i64>,
    pub page: u32,
    pub limit: u32,
}

impl ProductQuery {
    pub fn new(text: impl Into<String>, limit: u32) -> Self {
        ProductQuery {
            text: text.into(),
            category_id: None,
            page: 1,
            limit,
        }
    }
}

// =============================================================================
// Submission Receipt
// =============================================================================

/// What the backend returns for an accepted comprobante.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Numbering series, e.g. `F001`.
    pub serie: String,
    pub correlativo: u64,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// SUNAT status reported by the backend, if already known.
    #[serde(default)]
    pub sunat_status: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

impl SubmissionReceipt {
    /// `F001-00000123`.
    pub fn number(&self) -> String {
        format!("{}-{:08}", self.serie, self.correlativo)
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Product search.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn search_products(&self, query: &ProductQuery) -> ClientResult<Page<Product>>;
}

/// Client search and identity lookup.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn search_clients(&self, query: &str) -> ClientResult<Vec<Client>>;

    /// Looks a client up by DNI or RUC.
    async fn find_by_document(&self, kind: DocumentKind, number: &str)
        -> ClientResult<Option<Client>>;

    /// Classifies `document` and looks it up.
    ///
    /// Numbers that are neither 8 nor 11 digits are rejected without a
    /// backend call.
    async fn lookup_by_document(&self, document: &str) -> ClientResult<Option<Client>> {
        let number = document.trim();
        let kind = DocumentKind::classify(number)
            .ok_or_else(|| ClientError::InvalidDocument(number.to_string()))?;
        self.find_by_document(kind, number).await
    }
}

/// Reference catalogs for the header and the detracción dialog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn operation_types(&self) -> ClientResult<Vec<OperationType>>;

    async fn tipos_detraccion(&self) -> ClientResult<Vec<TipoDetraccion>>;

    async fn medios_pago_detraccion(&self) -> ClientResult<Vec<MedioPagoDetraccion>>;
}

/// Comprobante submission.
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    /// Sends `payload`. Repeating the call with the same key must not issue
    /// a second comprobante.
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: Uuid,
    ) -> ClientResult<SubmissionReceipt>;
}
