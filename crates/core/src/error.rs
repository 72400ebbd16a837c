//! The common error taxonomy.
//!
//! Every provider maps its backend-specific failures into [`ApiError`]
//! before they cross the provider boundary, so callers can branch on
//! the category without knowing which backend served the request.

use thiserror::Error;

/// Backend-neutral API error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was malformed or violated a business rule.
    #[error("validation error: {0}")]
    Validation(String),

    /// Credentials were missing, invalid or expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request conflicts with current state (e.g. an invalid coupon).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The active backend does not implement this operation.
    #[error("operation `{operation}` is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// The upstream service failed or returned an unusable response.
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl ApiError {
    /// Not-found error for an entity identified by kind and id.
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} `{id}`"))
    }

    /// Unsupported-operation error for a named backend capability.
    #[must_use]
    pub const fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// The fixed login failure message.
    ///
    /// Deliberately identical for unknown accounts and wrong passwords
    /// so responses never reveal whether an email is registered.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::Authentication("Invalid email or password".to_owned())
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Only upstream failures are transient; every other category is a
    /// deterministic outcome of the request itself.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_kind_and_id() {
        let err = ApiError::not_found("product", "prod-404");
        assert_eq!(err.to_string(), "not found: product `prod-404`");
    }

    #[test]
    fn unsupported_names_backend_and_operation() {
        let err = ApiError::unsupported("magento", "orders.cancel");
        assert_eq!(
            err.to_string(),
            "operation `orders.cancel` is not supported by the magento backend"
        );
    }

    #[test]
    fn invalid_credentials_message_is_fixed() {
        assert_eq!(
            ApiError::invalid_credentials().to_string(),
            "authentication failed: Invalid email or password"
        );
    }

    #[test]
    fn only_upstream_is_transient() {
        assert!(ApiError::Upstream("502".into()).is_transient());
        assert!(!ApiError::Validation("empty cart".into()).is_transient());
        assert!(!ApiError::NotFound("x".into()).is_transient());
    }
}
