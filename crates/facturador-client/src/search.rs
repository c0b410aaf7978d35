//! # Superseding Search
//!
//! Search-as-you-type where only the latest query may deliver results.
//!
//! ## Timeline
//! ```text
//! keystroke  "ce"      "cem"          "ceme"
//!              │          │               │
//!              ▼          ▼               ▼
//! gen          1          2               3
//!              │ debounce │ debounce      │ debounce
//!              ╳ ◄────────┘               │
//!         Superseded      ╳ ◄─────────────┘
//!                    Superseded           │ fetch ──► results
//! ```
//!
//! Each call bumps a generation counter on a `watch` channel. A call whose
//! generation is no longer current resolves to [`ClientError::Superseded`],
//! whether it is still debouncing or already waiting on the backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use facturador_core::validation::validate_search_query;
use facturador_core::{Client, Product};
use tokio::sync::watch;
use tracing::debug;

use crate::api::{ClientDirectory, Page, ProductCatalog, ProductQuery};
use crate::config::SearchSettings;
use crate::error::{ClientError, ClientResult};

/// Generation gate for one search box.
#[derive(Debug)]
pub struct SupersedingSearch {
    generation: watch::Sender<u64>,
    debounce: Duration,
}

impl SupersedingSearch {
    pub fn new(debounce: Duration) -> Self {
        let (generation, _) = watch::channel(0);
        SupersedingSearch {
            generation,
            debounce,
        }
    }

    /// Current generation, i.e. the number of searches started so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Supersedes every pending call without starting a new one.
    pub fn cancel(&self) {
        self.generation.send_modify(|g| *g += 1);
    }

    /// Debounces, then runs `fetch` unless a newer call arrives first.
    pub async fn run<T, F, Fut>(&self, fetch: F) -> ClientResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut mine = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            mine = *g;
        });
        let mut rx = self.generation.subscribe();
        if *rx.borrow() != mine {
            return Err(ClientError::Superseded);
        }

        if !self.debounce.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.debounce) => {}
                _ = rx.changed() => {
                    debug!(generation = mine, "Search superseded while debouncing");
                    return Err(ClientError::Superseded);
                }
            }
        }

        tokio::select! {
            result = fetch() => {
                if self.generation() != mine {
                    return Err(ClientError::Superseded);
                }
                result
            }
            _ = rx.changed() => {
                debug!(generation = mine, "Search superseded while fetching");
                Err(ClientError::Superseded)
            }
        }
    }
}

// =============================================================================
// Search Boxes
// =============================================================================

/// The product and client search boxes of the invoice screen.
///
/// The two boxes supersede independently.
pub struct SearchService {
    products: Arc<dyn ProductCatalog>,
    clients: Arc<dyn ClientDirectory>,
    product_gate: SupersedingSearch,
    client_gate: SupersedingSearch,
    page_size: u32,
}

impl SearchService {
    pub fn new(
        products: Arc<dyn ProductCatalog>,
        clients: Arc<dyn ClientDirectory>,
        settings: &SearchSettings,
    ) -> Self {
        SearchService {
            products,
            clients,
            product_gate: SupersedingSearch::new(settings.debounce()),
            client_gate: SupersedingSearch::new(settings.debounce()),
            page_size: settings.page_size,
        }
    }

    /// Searches products; an empty query returns the first page.
    pub async fn search_products(
        &self,
        text: &str,
        category_id: Option<i64>,
        page: u32,
    ) -> ClientResult<Page<Product>> {
        let query = ProductQuery {
            text: validate_search_query(text)?,
            category_id,
            page: page.max(1),
            limit: self.page_size,
        };
        let catalog = Arc::clone(&self.products);
        self.product_gate
            .run(|| async move { catalog.search_products(&query).await })
            .await
    }

    /// Searches clients by name or document.
    ///
    /// A blank query clears the results without calling the backend.
    pub async fn search_clients(&self, text: &str) -> ClientResult<Vec<Client>> {
        let query = validate_search_query(text)?;
        if query.is_empty() {
            self.client_gate.cancel();
            return Ok(Vec::new());
        }
        let directory = Arc::clone(&self.clients);
        self.client_gate
            .run(|| async move { directory.search_clients(&query).await })
            .await
    }
}
