//! # Client Configuration
//!
//! Configuration for the backend connection, the issuing company, the tax
//! settings and search behaviour.
//!
//! ## Configuration Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Load Order                             │
//! │                                                                         │
//! │  1. Defaults (compiled in)                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  2. Config file (facturador.toml)                                      │
//! │     • Linux:   ~/.config/facturador/facturador.toml                    │
//! │     • macOS:   ~/Library/Application Support/pe.facturador.pos/        │
//! │     • Windows: %APPDATA%\facturador\pos\config\                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  3. Environment variables (FACTURADOR_*)                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  4. validate()                                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Environment Variables
//! - `FACTURADOR_BASE_URL`: backend base URL
//! - `FACTURADOR_API_TOKEN`: bearer token
//! - `FACTURADOR_TIMEOUT_SECS`: request timeout
//! - `FACTURADOR_MAX_RETRIES`: submission retries on transient errors
//! - `FACTURADOR_COMPANY_RUC`: issuing company RUC
//! - `FACTURADOR_AGENTE_RETENCION`: `true`/`false`

use std::path::PathBuf;
use std::time::Duration;

use facturador_core::{CompanyProfile, DocumentKind, TaxSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Backend Settings
// =============================================================================

/// Connection to the business backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL, e.g. `https://api.mitienda.pe/v1/`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token. Acquiring it is the login screen's job.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries of a transient submission failure (0 = no retry).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on a single retry delay (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/".to_string()
}
fn default_timeout() -> u64 {
    15
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    500
}
fn default_max_backoff() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    /// Parses `base_url`, forcing a trailing slash so relative joins keep
    /// the path prefix.
    pub fn url(&self) -> ClientResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}

// =============================================================================
// Company Settings
// =============================================================================

/// The issuing company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanySettings {
    #[serde(default)]
    pub ruc: String,

    #[serde(default)]
    pub razon_social: String,

    /// Registered by SUNAT as a retention agent.
    #[serde(default)]
    pub es_agente_retencion: bool,
}

impl CompanySettings {
    pub fn profile(&self) -> CompanyProfile {
        CompanyProfile {
            ruc: self.ruc.trim().to_string(),
            razon_social: self.razon_social.trim().to_string(),
            es_agente_retencion: self.es_agente_retencion,
        }
    }
}

// =============================================================================
// Search Settings
// =============================================================================

/// Search-as-you-type behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Quiet period before a query is sent (milliseconds).
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Products per result page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_debounce() -> u64 {
    300
}
fn default_page_size() -> u32 {
    20
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            debounce_ms: default_debounce(),
            page_size: default_page_size(),
        }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete client configuration.
///
/// ## Example Config File
/// ```toml
/// [backend]
/// base_url = "https://api.mitienda.pe/v1/"
/// timeout_secs = 15
/// max_retries = 3
///
/// [company]
/// ruc = "20100000001"
/// razon_social = "Ferretería Central SAC"
/// es_agente_retencion = true
///
/// [tax]
/// igv_rate_bps = 1800
/// detraccion_operation_code = "0112"
/// regime_threshold = 700.0
///
/// [search]
/// debounce_ms = 300
/// page_size = 20
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub company: CompanySettings,

    #[serde(default)]
    pub tax: TaxSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (facturador.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> ClientResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.backend.url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.search.page_size == 0 {
            return Err(ClientError::Config(
                "page_size must be greater than 0".into(),
            ));
        }

        let ruc = self.company.ruc.trim();
        if !ruc.is_empty() && DocumentKind::classify(ruc) != Some(DocumentKind::Ruc) {
            return Err(ClientError::Config(format!(
                "company RUC must have 11 digits, got: {}",
                ruc
            )));
        }

        if self.tax.detraccion_operation_code.trim().is_empty() {
            return Err(ClientError::Config(
                "detraccion_operation_code cannot be empty".into(),
            ));
        }

        if self.tax.regime_threshold.is_negative() || self.tax.installment_tolerance.is_negative()
        {
            return Err(ClientError::Config(
                "tax thresholds cannot be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies `FACTURADOR_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FACTURADOR_BASE_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Some(token) = lookup("FACTURADOR_API_TOKEN") {
            self.backend.api_token = Some(token);
        }

        if let Some(secs) = lookup("FACTURADOR_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.backend.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid FACTURADOR_TIMEOUT_SECS"),
            }
        }

        if let Some(retries) = lookup("FACTURADOR_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(r) => self.backend.max_retries = r,
                Err(_) => warn!(value = %retries, "Ignoring invalid FACTURADOR_MAX_RETRIES"),
            }
        }

        if let Some(ruc) = lookup("FACTURADOR_COMPANY_RUC") {
            debug!(ruc = %ruc, "Overriding company RUC from environment");
            self.company.ruc = ruc;
        }

        if let Some(flag) = lookup("FACTURADOR_AGENTE_RETENCION") {
            match flag.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.company.es_agente_retencion = true,
                "false" | "0" | "no" => self.company.es_agente_retencion = false,
                _ => warn!(value = %flag, "Unknown FACTURADOR_AGENTE_RETENCION value"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("pe", "facturador", "pos")
            .map(|dirs| dirs.config_dir().join("facturador.toml"))
    }
}
