//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `API_PROVIDER` - Active backend, `mock` or `magento` (default: mock;
//!   unrecognized values fall back to mock)
//! - `API_TIMEOUT_SECS` - Upstream request timeout in seconds (default: 15)
//! - `DERMASTORE_DATA_DIR` - Directory for file-backed client state
//!   (default: in-memory only)
//!
//! ## Required when `API_PROVIDER=magento`
//! - `MAGENTO_GRAPHQL_URL` - Magento GraphQL endpoint URL
//!
//! ## Optional for Magento
//! - `MAGENTO_STORE_CODE` - Store-view selector header value
//! - `MAGENTO_API_TOKEN` - Integration bearer token attached server-side

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which provider implementation backs the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    #[default]
    Mock,
    Magento,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Magento => "magento",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock" => Ok(Self::Mock),
            "magento" => Ok(Self::Magento),
            _ => Err(()),
        }
    }
}

/// Top-level API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Active provider backend.
    pub provider: ProviderKind,
    /// Magento connection settings, present when the magento provider
    /// is selected.
    pub magento: Option<MagentoConfig>,
    /// Directory for file-backed client state stores.
    pub data_dir: Option<PathBuf>,
}

/// Magento GraphQL connection settings.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct MagentoConfig {
    /// GraphQL endpoint URL.
    pub graphql_url: Url,
    /// Store-view code sent as the `Store` header.
    pub store_code: Option<String>,
    /// Integration bearer token, attached to every request when set.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for MagentoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoConfig")
            .field("graphql_url", &self.graphql_url.as_str())
            .field("store_code", &self.store_code)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    /// An unrecognized `API_PROVIDER` value falls back to the mock
    /// provider rather than failing startup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the magento provider is selected
    /// without a valid `MAGENTO_GRAPHQL_URL`, or if a numeric variable
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let provider = match get_optional_env("API_PROVIDER") {
            None => ProviderKind::Mock,
            Some(raw) => raw.parse().unwrap_or_else(|()| {
                tracing::warn!(value = %raw, "unrecognized API_PROVIDER, using mock");
                ProviderKind::Mock
            }),
        };

        let magento = if provider == ProviderKind::Magento {
            Some(MagentoConfig::from_env()?)
        } else {
            None
        };

        let data_dir = get_optional_env("DERMASTORE_DATA_DIR").map(PathBuf::from);

        Ok(Self {
            provider,
            magento,
            data_dir,
        })
    }

    /// A mock-only configuration, used by tests.
    #[must_use]
    pub const fn mock() -> Self {
        Self {
            provider: ProviderKind::Mock,
            magento: None,
            data_dir: None,
        }
    }
}

impl MagentoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("MAGENTO_GRAPHQL_URL")?;
        let graphql_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("MAGENTO_GRAPHQL_URL".to_owned(), e.to_string())
        })?;

        let timeout_secs = get_env_or_default(
            "API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("API_TIMEOUT_SECS".to_owned(), e.to_string()))?;

        Ok(Self {
            graphql_url,
            store_code: get_optional_env("MAGENTO_STORE_CODE"),
            api_token: get_optional_env("MAGENTO_API_TOKEN").map(SecretString::from),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses_known_values() {
        assert_eq!("mock".parse(), Ok(ProviderKind::Mock));
        assert_eq!("magento".parse(), Ok(ProviderKind::Magento));
        assert!("shopify".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn mock_config_needs_no_backend_settings() {
        let config = ApiConfig::mock();
        assert_eq!(config.provider, ProviderKind::Mock);
        assert!(config.magento.is_none());
    }

    #[test]
    fn magento_config_debug_redacts_token() {
        let config = MagentoConfig {
            graphql_url: Url::parse("https://shop.example.com/graphql").unwrap(),
            store_code: Some("za".to_owned()),
            api_token: Some(SecretString::from("super-secret-token")),
            timeout: Duration::from_secs(15),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }
}
