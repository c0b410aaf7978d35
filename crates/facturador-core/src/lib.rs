//! # facturador-core: Pure Invoice Engine
//!
//! The calculation core of the "Nuevo Comprobante" screen: the cart, the
//! IGV split, the Detracción/Retención regimes and the submission payload.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Facturador Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    SPA (Nuevo Comprobante)                      │   │
//! │  │    Search ──► Cart ──► Detracción/Retención dialog ──► Emitir   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    facturador-client                            │   │
//! │  │    InvoiceSession, SupersedingSearch, HttpBackend, config      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ facturador-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │   cart   │ │  totals  │ │  regime  │ │   submission     │  │   │
//! │  │   │ LineItem │ │ gravada  │ │ detracc. │ │ validate/assemble│  │   │
//! │  │   │  stock   │ │   IGV    │ │ retención│ │ leyenda, receipt │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                  engine: one recompute() per mutation           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal money, rounded only at the boundary
//! - [`types`] - Catalog and reference types (Product, Client, DocumentType...)
//! - [`settings`] - IGV rate, detracción code, thresholds
//! - [`cart`] - Line item store
//! - [`totals`] - Subtotal, adjusted total, gravada/IGV
//! - [`regime`] - Detracción/Retención resolver and dialogs
//! - [`draft`] - The comprobante being edited
//! - [`submission`] - Cross-field validation and the backend payload
//! - [`receipt`] - Read-only view for printing
//! - [`words`] - Amount in words for the leyenda
//! - [`engine`] - The state container tying it together
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use facturador_core::{CompanyProfile, InvoiceEngine, Money, Product, TaxSettings};
//!
//! let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
//! let mut engine = InvoiceEngine::new(TaxSettings::default(), CompanyProfile::default(), today);
//!
//! engine
//!     .add_product(&Product {
//!         id: 1,
//!         description: "Cemento Sol 42.5kg".to_string(),
//!         unit_price: Money::from_units(100),
//!         stock: 10,
//!         unit: None,
//!         category: None,
//!     })
//!     .unwrap();
//!
//! let totals = engine.totals().rounded();
//! assert_eq!(totals.gravada, Money::from_cents(8475));
//! assert_eq!(totals.igv, Money::from_cents(1525));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod draft;
pub mod engine;
pub mod error;
pub mod money;
pub mod receipt;
pub mod regime;
pub mod settings;
pub mod submission;
pub mod totals;
pub mod types;
pub mod validation;
pub mod words;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, LineDetails, LineItem, LineItemPatch};
pub use draft::InvoiceDraft;
pub use engine::{InvoiceEngine, Recomputation};
pub use error::{CoreError, DraftRejection, RegimeError, ValidationError};
pub use money::Money;
pub use receipt::ReceiptView;
pub use regime::{DetraccionForm, RegimeSignal, RegimeStatus, RetencionForm, TaxRegime};
pub use settings::TaxSettings;
pub use submission::SubmissionPayload;
pub use totals::InvoiceTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed on a single comprobante.
pub const MAX_CART_ITEMS: usize = 100;
