//! # facturador-client: Backend Collaborators and Invoice Session
//!
//! Everything around the pure engine that waits on the network, the clock or
//! the file system.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      facturador-client                                  │
//! │                                                                         │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────────────┐  │
//! │  │  session.rs  │───►│   api.rs     │◄───│        http.rs           │  │
//! │  │ InvoiceSession│   │ async traits │    │ HttpBackend (reqwest)    │  │
//! │  │ submit+retry │    │ Page, Receipt│    │ REST + bearer token      │  │
//! │  └──────┬───────┘    └──────▲───────┘    └──────────────────────────┘  │
//! │         │                   │                                           │
//! │  ┌──────▼───────┐    ┌──────┴───────┐    ┌──────────────────────────┐  │
//! │  │ catalogs.rs  │    │  search.rs   │    │ config.rs / logging.rs   │  │
//! │  │ load once    │    │ debounce +   │    │ TOML + env, EnvFilter    │  │
//! │  │ id lookups   │    │ supersede    │    │                          │  │
//! │  └──────────────┘    └──────────────┘    └──────────────────────────┘  │
//! │                                                                         │
//! │  Wraps: facturador-core::InvoiceEngine                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring
//! ```rust,no_run
//! use std::sync::Arc;
//! use facturador_client::{AppConfig, Catalogs, HttpBackend, InvoiceSession, SearchService};
//!
//! # async fn wire() -> facturador_client::ClientResult<()> {
//! facturador_client::logging::init_tracing();
//! let config = AppConfig::load(None)?;
//! let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!
//! let catalogs = Catalogs::load(backend.as_ref()).await?;
//! let search = SearchService::new(backend.clone(), backend.clone(), &config.search);
//! let today = chrono::Local::now().date_naive();
//! let session = InvoiceSession::new(&config, backend, today);
//! # let _ = (catalogs, search, session);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod catalogs;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod search;
pub mod session;

pub use api::{
    CatalogSource, ClientDirectory, InvoiceGateway, Page, ProductCatalog, ProductQuery,
    SubmissionReceipt,
};
pub use catalogs::Catalogs;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use search::{SearchService, SupersedingSearch};
pub use session::{DateSource, InvoiceSession, RetryPolicy, SubmissionOutcome};
