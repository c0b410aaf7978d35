//! # Client Error Types
//!
//! Errors raised by the session, the HTTP backend and the configuration layer.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ClientError Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐         │
//! │  │   Transport     │  │   Backend       │  │ Configuration   │         │
//! │  │                 │  │                 │  │                 │         │
//! │  │ • Http          │  │ • Status        │  │ • Config        │         │
//! │  │ • Timeout       │  │ • Decode        │  │ • InvalidUrl    │         │
//! │  │                 │  │ • Rejected      │  │ • Io            │         │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐         │
//! │  │   Session       │  │   Draft         │  │   Lookup        │         │
//! │  │                 │  │                 │  │                 │         │
//! │  │ • Superseded    │  │ • Core          │  │ • InvalidDoc.   │         │
//! │  │ • Submission    │  │ • Regime        │  │ • NotFound      │         │
//! │  │   InProgress    │  │ • Draft         │  │                 │         │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is recoverable. A failed submission leaves the draft intact.

use facturador_core::{CoreError, DraftRejection, RegimeError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The backend did not answer in time.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-success HTTP status.
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    /// The backend refused the comprobante (4xx with a reason).
    #[error("Comprobante rejected by backend: {0}")]
    Rejected(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// A newer search replaced this one before it resolved.
    #[error("Search superseded by a newer query")]
    Superseded,

    /// `submit` was called while a submission is still in flight.
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    // =========================================================================
    // Draft Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Regime(#[from] RegimeError),

    #[error(transparent)]
    Draft(#[from] DraftRejection),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Document numbers must have 8 (DNI) or 11 (RUC) digits.
    #[error("Document number must have 8 (DNI) or 11 (RUC) digits, got {0:?}")]
    InvalidDocument(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
}

/// Convenience type alias for Results with ClientError.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

// =============================================================================
// Error Classification
// =============================================================================

impl ClientError {
    /// Returns true if the same request may succeed when retried.
    ///
    /// ## Transient Errors
    /// - Connection failures and timeouts
    /// - 5xx, 408 and 429 responses
    ///
    /// ## Permanent Errors
    /// - Any other 4xx, backend rejections
    /// - Draft, configuration and decode errors
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::Config(_) | ClientError::InvalidUrl(_) | ClientError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ClientError::Http("connection reset".into()).is_transient());
        assert!(ClientError::Timeout(15).is_transient());
        assert!(ClientError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(ClientError::Status {
            status: 429,
            body: String::new()
        }
        .is_transient());

        assert!(!ClientError::Status {
            status: 422,
            body: String::new()
        }
        .is_transient());
        assert!(!ClientError::Rejected("RUC inválido".into()).is_transient());
        assert!(!ClientError::Draft(DraftRejection::EmptyCart).is_transient());
        assert!(!ClientError::Superseded.is_transient());
    }

    #[test]
    fn test_config_errors() {
        assert!(ClientError::Config("bad".into()).is_config_error());
        assert!(ClientError::InvalidUrl("nope".into()).is_config_error());
        assert!(!ClientError::Superseded.is_config_error());
    }

    #[test]
    fn test_draft_errors_keep_their_message() {
        let err = ClientError::from(DraftRejection::MissingClient);
        assert_eq!(err.to_string(), "Select a client");

        let err = ClientError::from(CoreError::LineNotFound("abc".into()));
        assert_eq!(err.to_string(), "Line not found in cart: abc");
    }
}
