//! Cached read layer over the active provider.
//!
//! `QueryClient` is what frontends talk to: reads go through a moka
//! cache with per-class TTLs, idempotent reads retry once on transient
//! upstream failures, and mutations pass straight through while keeping
//! a cart snapshot and invalidating whatever they made stale. The cart
//! itself is never TTL-cached; every read is live and the snapshot only
//! serves synchronous consumers such as a header badge.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use dermastore_core::{
    Address, ApiError, AuthResponse, Brand, Cart, Category, CategoryTree, CheckoutSession,
    Credentials, Order, Page, PaymentMethod, PlaceOrderResult, Product, ProductQuery,
    RegisterInput, ShippingMethod, User,
};

use crate::factory::ProviderRegistry;
use crate::provider::{
    AddItemInput, ApiProvider, AuthApi, BrandsApi, CartApi, CategoriesApi, CheckoutApi, OrdersApi,
    ProductsApi,
};

/// Catalog data changes rarely; five minutes of staleness is fine.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Order history changes on fulfilment events; keep it fresher.
const ORDERS_TTL: Duration = Duration::from_secs(120);

const CACHE_CAPACITY: u64 = 1024;

// ===== Cache keys and values =====

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum QueryKey {
    /// Canonical JSON of the normalized query.
    Products(String),
    ProductBySlug(String),
    CategoryTree,
    CategoryBySlug(String),
    Brands,
    BrandBySlug(String),
    Orders { page: u32, page_size: u32 },
    OrderById(String),
}

impl QueryKey {
    const fn ttl(&self) -> Duration {
        match self {
            Self::Orders { .. } | Self::OrderById(_) => ORDERS_TTL,
            _ => CATALOG_TTL,
        }
    }

    const fn is_order_key(&self) -> bool {
        matches!(self, Self::Orders { .. } | Self::OrderById(_))
    }
}

#[derive(Clone)]
enum CacheValue {
    ProductPage(Page<Product>),
    Product(Option<Product>),
    CategoryTree(CategoryTree),
    Category(Option<Category>),
    Brands(Vec<Brand>),
    Brand(Option<Brand>),
    OrderPage(Page<Order>),
    Order(Option<Order>),
}

/// Per-entry TTL taken from the key class.
struct KeyClassExpiry;

impl Expiry<QueryKey, CacheValue> for KeyClassExpiry {
    fn expire_after_create(
        &self,
        key: &QueryKey,
        _value: &CacheValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(key.ttl())
    }
}

// ===== Client =====

/// The cached data-fetching client.
#[derive(Clone)]
pub struct QueryClient {
    registry: Arc<ProviderRegistry>,
    cache: Cache<QueryKey, CacheValue>,
    cart_snapshot: Arc<RwLock<Option<Cart>>>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("backend", &self.registry.active_name())
            .field("cached_entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

/// Runs an idempotent read, retrying once on a transient failure.
async fn retry_once<T, F, Fut>(operation: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match operation().await {
        Err(error) if error.is_transient() => {
            debug!(%error, "transient upstream failure, retrying read once");
            operation().await
        }
        other => other,
    }
}

impl QueryClient {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .expire_after(KeyClassExpiry)
            .build();
        Self {
            registry,
            cache,
            cart_snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// The registry backing this client.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn remember_cart(&self, cart: &Cart) {
        if let Ok(mut snapshot) = self.cart_snapshot.write() {
            *snapshot = Some(cart.clone());
        }
    }

    fn forget_cart(&self) {
        if let Ok(mut snapshot) = self.cart_snapshot.write() {
            *snapshot = None;
        }
    }

    async fn invalidate_orders(&self) {
        let keys: Vec<QueryKey> = self
            .cache
            .iter()
            .filter(|(key, _)| key.is_order_key())
            .map(|(key, _)| (*key).clone())
            .collect();
        for key in keys {
            self.cache.invalidate(&key).await;
        }
    }

    /// Drops every cached entry; the next reads hit the provider.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.forget_cart();
    }

    // ===== Catalog reads =====

    pub async fn products(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        let query = query.normalized();
        let key = QueryKey::Products(serde_json::to_string(&query).unwrap_or_default());
        if let Some(CacheValue::ProductPage(page)) = self.cache.get(&key).await {
            return Ok(page);
        }
        let page = retry_once(|| async {
            self.registry.provider()?.products().get_all(query.clone()).await
        })
        .await?;
        self.cache
            .insert(key, CacheValue::ProductPage(page.clone()))
            .await;
        Ok(page)
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ApiError> {
        let key = QueryKey::ProductBySlug(slug.to_owned());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            return Ok(product);
        }
        let product = retry_once(|| async {
            self.registry.provider()?.products().get_by_slug(slug).await
        })
        .await?;
        self.cache
            .insert(key, CacheValue::Product(product.clone()))
            .await;
        Ok(product)
    }

    pub async fn category_tree(&self) -> Result<CategoryTree, ApiError> {
        let key = QueryKey::CategoryTree;
        if let Some(CacheValue::CategoryTree(tree)) = self.cache.get(&key).await {
            return Ok(tree);
        }
        let tree =
            retry_once(|| async { self.registry.provider()?.categories().get_tree().await })
                .await?;
        self.cache
            .insert(key, CacheValue::CategoryTree(tree.clone()))
            .await;
        Ok(tree)
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError> {
        let key = QueryKey::CategoryBySlug(slug.to_owned());
        if let Some(CacheValue::Category(category)) = self.cache.get(&key).await {
            return Ok(category);
        }
        let category = retry_once(|| async {
            self.registry.provider()?.categories().get_by_slug(slug).await
        })
        .await?;
        self.cache
            .insert(key, CacheValue::Category(category.clone()))
            .await;
        Ok(category)
    }

    pub async fn brands(&self) -> Result<Vec<Brand>, ApiError> {
        let key = QueryKey::Brands;
        if let Some(CacheValue::Brands(brands)) = self.cache.get(&key).await {
            return Ok(brands);
        }
        let brands =
            retry_once(|| async { self.registry.provider()?.brands().get_all().await }).await?;
        self.cache
            .insert(key, CacheValue::Brands(brands.clone()))
            .await;
        Ok(brands)
    }

    pub async fn brand_by_slug(&self, slug: &str) -> Result<Option<Brand>, ApiError> {
        let key = QueryKey::BrandBySlug(slug.to_owned());
        if let Some(CacheValue::Brand(brand)) = self.cache.get(&key).await {
            return Ok(brand);
        }
        let brand = retry_once(|| async {
            self.registry.provider()?.brands().get_by_slug(slug).await
        })
        .await?;
        self.cache.insert(key, CacheValue::Brand(brand.clone())).await;
        Ok(brand)
    }

    // ===== Orders =====

    pub async fn orders(&self, page: u32, page_size: u32) -> Result<Page<Order>, ApiError> {
        let key = QueryKey::Orders { page, page_size };
        if let Some(CacheValue::OrderPage(orders)) = self.cache.get(&key).await {
            return Ok(orders);
        }
        let orders = retry_once(|| async {
            self.registry.provider()?.orders().get_all(page, page_size).await
        })
        .await?;
        self.cache
            .insert(key, CacheValue::OrderPage(orders.clone()))
            .await;
        Ok(orders)
    }

    pub async fn order_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        let key = QueryKey::OrderById(order_id.to_owned());
        if let Some(CacheValue::Order(order)) = self.cache.get(&key).await {
            return Ok(order);
        }
        let order = retry_once(|| async {
            self.registry.provider()?.orders().get_by_id(order_id).await
        })
        .await?;
        self.cache.insert(key, CacheValue::Order(order.clone())).await;
        Ok(order)
    }

    /// Cancels an order and drops stale order history entries.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Order, ApiError> {
        let order = self.registry.provider()?.orders().cancel(order_id).await?;
        self.invalidate_orders().await;
        Ok(order)
    }

    // ===== Cart =====

    /// The live cart. Never served from the TTL cache.
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        let cart =
            retry_once(|| async { self.registry.provider()?.cart().get().await }).await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    /// The most recently observed cart, without a backend round trip.
    #[must_use]
    pub fn cart_snapshot(&self) -> Option<Cart> {
        self.cart_snapshot.read().ok().and_then(|s| s.clone())
    }

    pub async fn add_to_cart(&self, input: AddItemInput) -> Result<Cart, ApiError> {
        let cart = self.registry.provider()?.cart().add_item(input).await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    pub async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        let cart = self
            .registry
            .provider()?
            .cart()
            .update_item(item_id, quantity)
            .await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    pub async fn remove_cart_item(&self, item_id: &str) -> Result<Cart, ApiError> {
        let cart = self.registry.provider()?.cart().remove_item(item_id).await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    pub async fn apply_coupon(&self, code: &str) -> Result<Cart, ApiError> {
        let cart = self.registry.provider()?.cart().apply_coupon(code).await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    pub async fn remove_coupon(&self) -> Result<Cart, ApiError> {
        let cart = self.registry.provider()?.cart().remove_coupon().await?;
        self.remember_cart(&cart);
        Ok(cart)
    }

    // ===== Auth =====

    /// Login can merge a guest cart server-side, so both the snapshot
    /// and the order cache are stale afterwards.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthResponse, ApiError> {
        let response = self.registry.provider()?.auth().login(credentials).await?;
        self.forget_cart();
        self.invalidate_orders().await;
        Ok(response)
    }

    pub async fn register(&self, input: RegisterInput) -> Result<AuthResponse, ApiError> {
        let response = self.registry.provider()?.auth().register(input).await?;
        self.forget_cart();
        self.invalidate_orders().await;
        Ok(response)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.registry.provider()?.auth().logout().await?;
        self.forget_cart();
        self.invalidate_orders().await;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        self.registry.provider()?.auth().current_user().await
    }

    // ===== Checkout =====

    pub async fn create_checkout(&self) -> Result<CheckoutSession, ApiError> {
        self.registry.provider()?.checkout().create_session().await
    }

    pub async fn set_checkout_email(
        &self,
        session_id: &str,
        email: &str,
    ) -> Result<CheckoutSession, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .set_email(session_id, email)
            .await
    }

    pub async fn set_shipping_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .set_shipping_address(session_id, address)
            .await
    }

    pub async fn set_billing_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .set_billing_address(session_id, address)
            .await
    }

    pub async fn shipping_methods(
        &self,
        session_id: &str,
    ) -> Result<Vec<ShippingMethod>, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .shipping_methods(session_id)
            .await
    }

    pub async fn set_shipping_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .set_shipping_method(session_id, code)
            .await
    }

    pub async fn payment_methods(
        &self,
        session_id: &str,
    ) -> Result<Vec<PaymentMethod>, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .payment_methods(session_id)
            .await
    }

    pub async fn set_payment_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        self.registry
            .provider()?
            .checkout()
            .set_payment_method(session_id, code)
            .await
    }

    /// Places the order; the cart snapshot and order history are both
    /// stale afterwards.
    pub async fn place_order(&self, session_id: &str) -> Result<PlaceOrderResult, ApiError> {
        let result = self
            .registry
            .provider()?
            .checkout()
            .place_order(session_id)
            .await?;
        self.forget_cart();
        self.invalidate_orders().await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ApiConfig;
    use crate::mock::MockProvider;
    use crate::storage::MemoryStore;

    fn client() -> QueryClient {
        let registry =
            ProviderRegistry::with_store(ApiConfig::mock(), Arc::new(MemoryStore::new()));
        registry
            .register("mock", |_, store| {
                Ok(Arc::new(MockProvider::with_latency(store, None)))
            })
            .unwrap();
        QueryClient::new(Arc::new(registry))
    }

    #[test]
    fn order_keys_expire_faster_than_catalog_keys() {
        assert_eq!(QueryKey::Orders { page: 1, page_size: 20 }.ttl(), ORDERS_TTL);
        assert_eq!(QueryKey::OrderById("o1".into()).ttl(), ORDERS_TTL);
        assert_eq!(QueryKey::CategoryTree.ttl(), CATALOG_TTL);
        assert_eq!(QueryKey::Brands.ttl(), CATALOG_TTL);
    }

    #[tokio::test]
    async fn cached_reads_survive_a_provider_reset() {
        let client = client();
        let first = client.products(ProductQuery::default()).await.unwrap();
        assert!(!first.items.is_empty());

        // A fresh provider instance behind the registry does not
        // invalidate previously cached pages.
        client.registry().reset();
        let second = client.products(ProductQuery::default()).await.unwrap();
        assert_eq!(first.total_items, second.total_items);
    }

    #[tokio::test]
    async fn cart_snapshot_tracks_mutations() {
        let client = client();
        assert!(client.cart_snapshot().is_none());

        let cart = client
            .add_to_cart(AddItemInput {
                product_id: "prod-1".to_owned(),
                variant_id: None,
                quantity: 2,
            })
            .await
            .unwrap();
        assert_eq!(cart.item_count, 2);
        assert_eq!(client.cart_snapshot().unwrap().item_count, 2);
    }

    #[tokio::test]
    async fn logout_drops_the_cart_snapshot() {
        let client = client();
        client
            .add_to_cart(AddItemInput {
                product_id: "prod-1".to_owned(),
                variant_id: None,
                quantity: 1,
            })
            .await
            .unwrap();
        assert!(client.cart_snapshot().is_some());

        client.logout().await.unwrap();
        assert!(client.cart_snapshot().is_none());
    }

    #[tokio::test]
    async fn brand_listing_reads_through_the_cache() {
        let client = client();
        let brands = client.brands().await.unwrap();
        assert!(!brands.is_empty());
    }
}
