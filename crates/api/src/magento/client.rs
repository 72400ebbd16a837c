//! Low-level Magento GraphQL transport.
//!
//! One `execute` helper owns the whole request/response path: headers,
//! timeout, status handling and the GraphQL envelope. Everything above
//! it works with typed response data or a classified [`MagentoError`].

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;
use url::Url;

use dermastore_core::ApiError;

use crate::config::MagentoConfig;

/// Errors raised below the provider boundary.
#[derive(Debug, Error)]
pub enum MagentoError {
    /// HTTP transport failed (connect, timeout, abort).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body was not a valid GraphQL envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The envelope carried errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    Graphql(Vec<GraphqlErrorEntry>),

    /// The envelope had neither data nor errors.
    #[error("GraphQL response carried no data")]
    MissingData,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorExtensions {
    #[serde(default)]
    pub category: Option<String>,
}

impl GraphqlErrorEntry {
    fn category(&self) -> Option<&str> {
        self.extensions.as_ref()?.category.as_deref()
    }
}

fn format_graphql_errors(errors: &[GraphqlErrorEntry]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<MagentoError> for ApiError {
    /// Classifies backend failures into the unified taxonomy.
    ///
    /// Magento tags GraphQL errors with an `extensions.category`; the
    /// well-known categories map onto their unified kinds and anything
    /// else stays an upstream failure.
    fn from(error: MagentoError) -> Self {
        match error {
            MagentoError::Graphql(ref entries) => {
                let Some(first) = entries.first() else {
                    return Self::Upstream(error.to_string());
                };
                let message = first.message.clone();
                match first.category() {
                    Some("graphql-authentication" | "graphql-authorization") => {
                        Self::Authentication(message)
                    }
                    Some("graphql-no-such-entity") => Self::NotFound(message),
                    Some("graphql-input") => Self::Validation(message),
                    Some("graphql-already-exists") => Self::Conflict(message),
                    _ => Self::Upstream(message),
                }
            }
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

/// The shared GraphQL transport.
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: Url,
    store_code: Option<String>,
    api_token: Option<SecretString>,
}

impl GraphqlClient {
    /// Builds the client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::Http`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &MagentoConfig) -> Result<Self, MagentoError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.graphql_url.clone(),
            store_code: config.store_code.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Executes one GraphQL document.
    ///
    /// `bearer` is the customer token when a session is active; without
    /// one the configured integration token (if any) is attached.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<T, MagentoError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "query": query, "variables": variables }));

        if let Some(store) = &self.store_code {
            request = request.header("Store", store);
        }
        match (bearer, &self.api_token) {
            (Some(token), _) => request = request.bearer_auth(token),
            (None, Some(token)) => request = request.bearer_auth(token.expose_secret()),
            (None, None) => {}
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Magento returned non-success status"
            );
            return Err(MagentoError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        if !envelope.errors.is_empty() {
            return Err(MagentoError::Graphql(envelope.errors));
        }
        envelope.data.ok_or(MagentoError::MissingData)
    }
}
