//! Typed views over the key-value storage layer.
//!
//! Every persisted payload lives under its own namespaced key and
//! tolerates absence or corruption by falling back to a fresh default.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, load_json, store_json};

/// Storage key for the locally persisted cart.
pub const CART_KEY: &str = "dermastore_cart";
/// Storage key for locally persisted orders.
pub const ORDERS_KEY: &str = "dermastore_orders";
/// Storage key for locally persisted customer accounts.
pub const CUSTOMERS_KEY: &str = "dermastore_customers";
/// Storage key for UI preferences.
pub const UI_KEY: &str = "dermastore_ui";
/// Storage key for the Magento customer bearer token.
pub const MAGENTO_TOKEN_KEY: &str = "magento_token";
/// Storage key for the Magento cart identifier.
pub const MAGENTO_CART_ID_KEY: &str = "magento_cart_id";

/// One JSON payload under one fixed key.
pub struct JsonSlot<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// The stored value, or `None` on first run or corruption.
    #[must_use]
    pub fn load(&self) -> Option<T> {
        load_json(self.store.as_ref(), self.key)
    }

    pub fn save(&self, value: &T) {
        store_json(self.store.as_ref(), self.key, value);
    }

    pub fn clear(&self) {
        self.store.remove(self.key);
    }
}

impl<T> std::fmt::Debug for JsonSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSlot").field("key", &self.key).finish()
    }
}

/// Persisted UI preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPrefs {
    /// Most-recently-viewed product slugs, newest first.
    #[serde(default)]
    pub recently_viewed: Vec<String>,
}

impl UiPrefs {
    const MAX_RECENTLY_VIEWED: usize = 12;

    /// Records a product view, deduplicating and capping the list.
    pub fn record_view(&mut self, slug: &str) {
        self.recently_viewed.retain(|s| s != slug);
        self.recently_viewed.insert(0, slug.to_owned());
        self.recently_viewed.truncate(Self::MAX_RECENTLY_VIEWED);
    }
}

/// UI preference store.
#[derive(Debug)]
pub struct UiStore {
    slot: JsonSlot<UiPrefs>,
}

impl UiStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            slot: JsonSlot::new(store, UI_KEY),
        }
    }

    #[must_use]
    pub fn load(&self) -> UiPrefs {
        self.slot.load().unwrap_or_default()
    }

    pub fn save(&self, prefs: &UiPrefs) {
        self.slot.save(prefs);
    }
}
