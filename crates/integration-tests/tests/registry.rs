//! Provider selection, the cached client and persisted state.

use std::sync::Arc;

use dermastore_api::mock::MockProvider;
use dermastore_api::provider::AddItemInput;
use dermastore_api::query_cache::QueryClient;
use dermastore_api::storage::{FileStore, KeyValueStore, MemoryStore};
use dermastore_api::{ApiConfig, ProviderRegistry};
use dermastore_core::{ApiError, ProductQuery};

fn quiet_registry(store: Arc<dyn KeyValueStore>) -> ProviderRegistry {
    let registry = ProviderRegistry::with_store(ApiConfig::mock(), store);
    registry
        .register("mock", |_, store| {
            Ok(Arc::new(MockProvider::with_latency(store, None)))
        })
        .unwrap();
    registry
}

#[tokio::test]
async fn the_client_serves_catalog_reads_through_the_registry() {
    let client = QueryClient::new(Arc::new(quiet_registry(Arc::new(MemoryStore::new()))));

    let page = client.products(ProductQuery::default()).await.unwrap();
    assert_eq!(page.total_items, 10);

    let tree = client.category_tree().await.unwrap();
    assert!(tree.get_by_slug("skincare").is_some());

    let brands = client.brands().await.unwrap();
    assert_eq!(brands.len(), 5);
}

#[tokio::test]
async fn switching_to_an_unknown_backend_is_rejected() {
    let registry = quiet_registry(Arc::new(MemoryStore::new()));
    let err = registry.set_active("woocommerce").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(registry.active_name(), "mock");
}

#[tokio::test]
async fn a_reset_provider_reloads_the_persisted_cart() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let client = QueryClient::new(Arc::new(quiet_registry(Arc::clone(&store))));

    client
        .add_to_cart(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: None,
            quantity: 2,
        })
        .await
        .unwrap();

    // A fresh provider instance resumes from the same store.
    client.registry().reset();
    let cart = client.cart().await.unwrap();
    assert_eq!(cart.item_count, 2);
}

#[tokio::test]
async fn file_backed_state_survives_a_full_rebuild() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
        let client = QueryClient::new(Arc::new(quiet_registry(store)));
        client
            .add_to_cart(AddItemInput {
                product_id: "prod-3".to_owned(),
                variant_id: None,
                quantity: 1,
            })
            .await
            .unwrap();
    }

    let store: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::new(dir.path().to_path_buf()).unwrap());
    let client = QueryClient::new(Arc::new(quiet_registry(store)));
    let cart = client.cart().await.unwrap();
    assert_eq!(cart.item_count, 1);
    assert_eq!(cart.items[0].product_id, "prod-3");
}

#[tokio::test]
async fn the_mutation_path_keeps_the_snapshot_in_step() {
    let client = QueryClient::new(Arc::new(quiet_registry(Arc::new(MemoryStore::new()))));
    assert!(client.cart_snapshot().is_none());

    client
        .add_to_cart(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: None,
            quantity: 1,
        })
        .await
        .unwrap();
    let snapshot = client.cart_snapshot().unwrap();
    assert_eq!(snapshot.item_count, 1);

    client.remove_cart_item(&snapshot.items[0].id).await.unwrap();
    assert!(client.cart_snapshot().unwrap().is_empty());
}
