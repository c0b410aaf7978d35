//! # Error Types
//!
//! Domain-specific error types for facturador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  facturador-core errors (this file)                                    │
//! │  ├── CoreError        - Cart operations (stock, lines, limits)         │
//! │  ├── ValidationError  - Field-level input rules                        │
//! │  ├── RegimeError      - Detracción/Retención dialog save failures      │
//! │  └── DraftRejection   - Why a draft cannot be submitted                │
//! │                                                                         │
//! │  facturador-client errors (separate crate)                             │
//! │  └── ClientError      - HTTP, config, session guards                   │
//! │                                                                         │
//! │  None of these is fatal: every variant is a user-facing alert that the │
//! │  cashier resolves by correcting input.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Cart errors.
///
/// A failed cart operation never mutates the cart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Not enough stock for the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Click product (already 3 in cart, stock 3)
    ///      │
    ///      ▼
    /// InsufficientStock { description: "Cemento Sol", available: 3, requested: "4" }
    ///      │
    ///      ▼
    /// UI shows a warning, cart unchanged
    /// ```
    #[error("Insufficient stock for {description}: available {available}, requested {requested}")]
    InsufficientStock {
        description: String,
        available: i64,
        requested: String,
    },

    /// No line at the given index or with the given id.
    #[error("Line not found in cart: {0}")]
    LineNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },
}

// =============================================================================
// Regime Error
// =============================================================================

/// Errors raised when saving the Detracción/Retención configuration dialog.
///
/// These block only the save action. The previously saved regime is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegimeError {
    #[error("Detracción can only be configured for operation type {code}")]
    NotDetraccionOperation { code: String },

    #[error("Retención cannot be applied to an operation subject to detracción")]
    RetencionUnderDetraccion,

    #[error("Select the detracción type")]
    MissingTipoDetraccion,

    #[error("Select the detracción payment method")]
    MissingMedioPago,

    #[error("Enter the Banco de la Nación account number")]
    MissingCuentaBancoNacion,

    #[error("Retención only applies to totals of at least {threshold}")]
    RetencionBelowThreshold { threshold: Money },

    #[error("The {regime} amount must be greater than zero")]
    NonPositiveAmount { regime: &'static str },

    #[error("Credit sales require at least one installment")]
    NoInstallments,

    #[error("Installment {number} must have an amount greater than zero")]
    InstallmentAmount { number: usize },

    #[error("Installment {number} is missing its due date")]
    InstallmentDueDate { number: usize },

    #[error("Installments add up to {actual} but must equal {expected}")]
    InstallmentSumMismatch { expected: Money, actual: Money },

    #[error("Cannot split into {count} installments")]
    InvalidInstallmentCount { count: usize },
}

// =============================================================================
// Draft Rejection
// =============================================================================

/// Why a draft cannot be submitted.
///
/// Checked in a fixed order; the first failing check is reported. Each
/// variant carries a user-facing message and a stable machine code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftRejection {
    #[error("A FACTURA requires a client with an 11-digit RUC; DNI {document} is only valid for BOLETA")]
    FacturaWithDni { document: String },

    #[error("A FACTURA requires a client with an 11-digit RUC")]
    FacturaRequiresRuc,

    #[error("A NOTA DE CREDITO requires the serie and correlativo of the referenced document")]
    MissingCreditNoteReference,

    #[error("Select a client")]
    MissingClient,

    #[error("Add at least one product")]
    EmptyCart,

    #[error("Configure the detracción before issuing this document")]
    DetraccionNotConfigured,

    #[error("Operations subject to detracción require a total of at least {threshold} (current total {total})")]
    DetraccionBelowThreshold { threshold: Money, total: Money },

    #[error("The retención amount must be greater than zero")]
    RetencionAmount,

    #[error("The advance payment ({advance}) cannot exceed the total ({total})")]
    AdvanceExceedsTotal { advance: Money, total: Money },

    #[error("Invalid payment schedule: {0}")]
    Installments(RegimeError),
}

impl DraftRejection {
    /// Machine-readable code for the SPA.
    pub fn code(&self) -> &'static str {
        match self {
            DraftRejection::FacturaWithDni { .. } => "FACTURA_WITH_DNI",
            DraftRejection::FacturaRequiresRuc => "FACTURA_REQUIRES_RUC",
            DraftRejection::MissingCreditNoteReference => "MISSING_REFERENCE",
            DraftRejection::MissingClient => "MISSING_CLIENT",
            DraftRejection::EmptyCart => "EMPTY_CART",
            DraftRejection::DetraccionNotConfigured => "DETRACCION_NOT_CONFIGURED",
            DraftRejection::DetraccionBelowThreshold { .. } => "DETRACCION_BELOW_THRESHOLD",
            DraftRejection::RetencionAmount => "RETENCION_AMOUNT",
            DraftRejection::AdvanceExceedsTotal { .. } => "ADVANCE_EXCEEDS_TOTAL",
            DraftRejection::Installments(_) => "INSTALLMENTS",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with RegimeError.
pub type RegimeResult<T> = Result<T, RegimeError>;

// =============================================================================
// Unit Tests
// =============================================================================
