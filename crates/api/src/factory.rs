//! Provider registry and factory.
//!
//! The registry maps backend names to constructors and hands out a
//! cached instance of whichever backend is active. Consumers hold the
//! registry, not a concrete provider, so the backend can be swapped at
//! runtime (tests, demo environments) without touching call sites.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use dermastore_core::ApiError;

use crate::config::{ApiConfig, ProviderKind};
use crate::magento::MagentoProvider;
use crate::mock::MockProvider;
use crate::provider::ApiProvider;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// Builds a provider instance from the configuration and store.
type Constructor =
    Box<dyn Fn(&ApiConfig, Arc<dyn KeyValueStore>) -> Result<Arc<dyn ApiProvider>, ApiError> + Send + Sync>;

/// Named provider constructors plus the active, lazily-built instance.
pub struct ProviderRegistry {
    config: ApiConfig,
    store: Arc<dyn KeyValueStore>,
    constructors: RwLock<HashMap<&'static str, Constructor>>,
    active: RwLock<ActiveProvider>,
}

struct ActiveProvider {
    name: &'static str,
    instance: Option<Arc<dyn ApiProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("active", &self.active_name())
            .finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    /// A registry with the built-in `mock` and `magento` backends
    /// registered, the active one taken from the configuration.
    ///
    /// The client-state store is file-backed when `data_dir` is
    /// configured, in-memory otherwise.
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => match FileStore::new(dir.clone()) {
                Ok(store) => Arc::new(store),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        dir = %dir.display(),
                        "data directory unusable, falling back to in-memory state"
                    );
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    /// Same as [`ProviderRegistry::new`] but over an explicit store.
    #[must_use]
    pub fn with_store(config: ApiConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let mut constructors: HashMap<&'static str, Constructor> = HashMap::new();
        constructors.insert(
            ProviderKind::Mock.as_str(),
            Box::new(|_, store| Ok(Arc::new(MockProvider::new(store)))),
        );
        constructors.insert(
            ProviderKind::Magento.as_str(),
            Box::new(|config, store| {
                let magento = config.magento.as_ref().ok_or_else(|| {
                    ApiError::Validation(
                        "magento backend selected but no magento configuration is present"
                            .to_owned(),
                    )
                })?;
                Ok(Arc::new(MagentoProvider::new(magento, store)?))
            }),
        );

        let active = ActiveProvider {
            name: config.provider.as_str(),
            instance: None,
        };
        Self {
            config,
            store,
            constructors: RwLock::new(constructors),
            active: RwLock::new(active),
        }
    }

    /// Registers (or replaces) a backend constructor under a name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Upstream`] when the registry lock is
    /// poisoned.
    pub fn register(
        &self,
        name: &'static str,
        constructor: impl Fn(&ApiConfig, Arc<dyn KeyValueStore>) -> Result<Arc<dyn ApiProvider>, ApiError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), ApiError> {
        let mut constructors = self
            .constructors
            .write()
            .map_err(|_| registry_poisoned())?;
        constructors.insert(name, Box::new(constructor));
        debug!(backend = name, "provider constructor registered");
        Ok(())
    }

    /// The name of the active backend.
    #[must_use]
    pub fn active_name(&self) -> &'static str {
        self.active
            .read()
            .map(|active| active.name)
            .unwrap_or(ProviderKind::Mock.as_str())
    }

    /// Switches the active backend. The previous instance is dropped
    /// and the new backend is constructed lazily on next access.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when no constructor is registered
    /// under `name`.
    pub fn set_active(&self, name: &'static str) -> Result<(), ApiError> {
        let constructors = self.constructors.read().map_err(|_| registry_poisoned())?;
        if !constructors.contains_key(name) {
            return Err(ApiError::not_found("provider backend", name));
        }
        drop(constructors);

        let mut active = self.active.write().map_err(|_| registry_poisoned())?;
        if active.name != name {
            info!(from = active.name, to = name, "switching provider backend");
            active.name = name;
            active.instance = None;
        }
        Ok(())
    }

    /// Drops the cached instance; the next [`ProviderRegistry::provider`]
    /// call constructs a fresh one.
    pub fn reset(&self) {
        if let Ok(mut active) = self.active.write() {
            active.instance = None;
        }
    }

    /// The active provider, constructing and caching it on first use.
    ///
    /// # Errors
    ///
    /// Propagates construction failures from the backend constructor.
    pub fn provider(&self) -> Result<Arc<dyn ApiProvider>, ApiError> {
        {
            let active = self.active.read().map_err(|_| registry_poisoned())?;
            if let Some(instance) = &active.instance {
                return Ok(Arc::clone(instance));
            }
        }

        let mut active = self.active.write().map_err(|_| registry_poisoned())?;
        // Another caller may have built it while we waited for the
        // write lock.
        if let Some(instance) = &active.instance {
            return Ok(Arc::clone(instance));
        }

        let constructors = self.constructors.read().map_err(|_| registry_poisoned())?;
        let constructor = constructors
            .get(active.name)
            .ok_or_else(|| ApiError::not_found("provider backend", active.name))?;
        let instance = constructor(&self.config, Arc::clone(&self.store))?;
        debug!(backend = instance.name(), "provider instance constructed");
        active.instance = Some(Arc::clone(&instance));
        Ok(instance)
    }
}

fn registry_poisoned() -> ApiError {
    ApiError::Upstream("provider registry lock poisoned".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::with_store(ApiConfig::mock(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn default_backend_is_the_mock() {
        let registry = registry();
        assert_eq!(registry.active_name(), "mock");
        let provider = registry.provider().unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn provider_instances_are_cached_until_reset() {
        let registry = registry();
        let first = registry.provider().unwrap();
        let second = registry.provider().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.reset();
        let third = registry.provider().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn switching_to_an_unregistered_backend_fails() {
        let registry = registry();
        let result = registry.set_active("shopify");
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(registry.active_name(), "mock");
    }

    #[test]
    fn magento_without_configuration_fails_at_construction() {
        let registry = registry();
        registry.set_active("magento").unwrap();
        assert!(matches!(
            registry.provider(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn custom_backends_can_be_registered() {
        let registry = registry();
        registry
            .register("mock-2", |_, store| Ok(Arc::new(MockProvider::new(store))))
            .unwrap();
        registry.set_active("mock-2").unwrap();
        assert_eq!(registry.active_name(), "mock-2");
        assert_eq!(registry.provider().unwrap().name(), "mock");
    }
}
