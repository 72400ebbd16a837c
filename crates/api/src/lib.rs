//! Backend providers, registry, caching and configuration for Dermastore.
//!
//! The storefront talks to commerce backends through one unified
//! contract ([`provider::ApiProvider`]) with two implementations:
//!
//! - [`mock::MockProvider`]: a deterministic in-process store for
//!   development and tests
//! - [`magento::MagentoProvider`]: a GraphQL client for a remote
//!   Magento instance
//!
//! Call sites resolve the active provider through a
//! [`factory::ProviderRegistry`] and usually go through
//! [`query_cache::QueryClient`], which adds stale-time caching and
//! mutation-driven invalidation on top.
//!
//! # Modules
//!
//! - `config`: environment-driven configuration
//! - `provider`: the unified provider traits
//! - `factory`: provider selection and lifecycle
//! - `mock`, `magento`: the two provider implementations
//! - `query_cache`: the caching read/mutate layer
//! - `storage`, `stores`: persisted client-side state
//! - `adapters`: domain-to-presentation flattening
//! - `health`: upstream reachability probe

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod adapters;
pub mod config;
pub mod factory;
pub mod health;
pub mod magento;
pub mod mock;
pub mod provider;
pub mod query_cache;
pub mod storage;
pub mod stores;

pub use config::{ApiConfig, ConfigError, ProviderKind};
pub use factory::ProviderRegistry;
pub use provider::ApiProvider;
pub use query_cache::QueryClient;
