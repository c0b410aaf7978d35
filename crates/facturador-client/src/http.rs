//! # HTTP Backend
//!
//! REST implementation of every backend trait over `reqwest`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  endpoint(path) ──► GET/POST + Bearer token + timeout                   │
//! │                              │                                          │
//! │              ┌───────────────┼─────────────────┬──────────────┐         │
//! │              ▼               ▼                 ▼              ▼         │
//! │           2xx JSON      404 on lookup     400/409/422     5xx/other     │
//! │           decode         → None           → Rejected      → Status      │
//! │                                                                         │
//! │  connect/timeout failures → Http / Timeout (transient)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use facturador_core::{
    Client, DocumentKind, MedioPagoDetraccion, OperationType, Product, SubmissionPayload,
    TipoDetraccion,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::api::{
    CatalogSource, ClientDirectory, InvoiceGateway, Page, ProductCatalog, ProductQuery,
    SubmissionReceipt,
};
use crate::config::BackendSettings;
use crate::error::{ClientError, ClientResult};

/// Header carrying the draft's idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// REST client for the business backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<String>,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpBackend {
            client,
            base_url: settings.url()?,
            api_token: settings.api_token.clone(),
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Resolves `path` against the base URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else {
                ClientError::from(e)
            }
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let response = self.send(self.client.get(url)).await?;
        let response = error_for_status(response).await?;
        Ok(response.json().await?)
    }

    /// Like `get_json`, but a 404 means "no such record".
    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> ClientResult<Option<T>> {
        debug!(%url, "GET");
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response).await?;
        Ok(Some(response.json().await?))
    }
}

// =============================================================================
// Response Handling
// =============================================================================

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "mensaje")]
    message: String,
}

/// Pulls a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Maps a status and body to the matching error.
fn status_error(status: StatusCode, body: &str) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Rejected(error_message(body))
        }
        _ => ClientError::Status {
            status: status.as_u16(),
            body: error_message(body),
        },
    }
}

async fn error_for_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "Backend returned an error");
    Err(status_error(status, &body))
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl ProductCatalog for HttpBackend {
    async fn search_products(&self, query: &ProductQuery) -> ClientResult<Page<Product>> {
        let mut url = self.endpoint("productos")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query.text.trim());
            if let Some(category) = query.category_id {
                pairs.append_pair("categoria", &category.to_string());
            }
            pairs.append_pair("page", &query.page.max(1).to_string());
            pairs.append_pair("limit", &query.limit.to_string());
        }
        self.get_json(url).await
    }
}

#[async_trait]
impl ClientDirectory for HttpBackend {
    async fn search_clients(&self, query: &str) -> ClientResult<Vec<Client>> {
        let mut url = self.endpoint("clientes")?;
        url.query_pairs_mut().append_pair("q", query.trim());
        self.get_json(url).await
    }

    async fn find_by_document(
        &self,
        kind: DocumentKind,
        number: &str,
    ) -> ClientResult<Option<Client>> {
        let path = match kind {
            DocumentKind::Dni => format!("clientes/dni/{}", number),
            DocumentKind::Ruc => format!("clientes/ruc/{}", number),
        };
        self.get_optional(self.endpoint(&path)?).await
    }
}

#[async_trait]
impl CatalogSource for HttpBackend {
    async fn operation_types(&self) -> ClientResult<Vec<OperationType>> {
        self.get_json(self.endpoint("tipos-operacion")?).await
    }

    async fn tipos_detraccion(&self) -> ClientResult<Vec<TipoDetraccion>> {
        self.get_json(self.endpoint("tipos-detraccion")?).await
    }

    async fn medios_pago_detraccion(&self) -> ClientResult<Vec<MedioPagoDetraccion>> {
        self.get_json(self.endpoint("medios-pago-detraccion")?).await
    }
}

#[async_trait]
impl InvoiceGateway for HttpBackend {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        idempotency_key: Uuid,
    ) -> ClientResult<SubmissionReceipt> {
        let url = self.endpoint("comprobantes")?;
        debug!(%url, %idempotency_key, "POST comprobante");

        let request = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(payload);

        let response = error_for_status(self.send(request).await?).await?;
        Ok(response.json().await?)
    }
}
