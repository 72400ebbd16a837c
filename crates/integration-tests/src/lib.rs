//! Integration tests for Dermastore.
//!
//! The suites under `tests/` run entirely against the in-process mock
//! backend with artificial latency disabled, so they are deterministic
//! and need no network or external services.
//!
//! # Test Categories
//!
//! - `catalog` - product listing, filtering, sorting and pagination
//! - `cart` - cart mutations, coupons and totals
//! - `auth` - sessions, registration and cart merging
//! - `checkout` - the checkout flow and order lifecycle
//! - `registry` - provider selection and the cached client

/// A mock provider wired to an in-memory store with latency disabled.
#[must_use]
pub fn mock_provider() -> dermastore_api::mock::MockProvider {
    use std::sync::Arc;

    use dermastore_api::mock::MockProvider;
    use dermastore_api::storage::MemoryStore;

    MockProvider::with_latency(Arc::new(MemoryStore::new()), None)
}
