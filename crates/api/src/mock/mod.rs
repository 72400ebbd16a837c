//! Deterministic in-process provider.
//!
//! Serves the fixture catalog from `data`, keeps cart/order/account
//! state in memory behind a lock, and persists it through the
//! key-value storage layer so a restart resumes the same cart. Every
//! operation sleeps for a bounded random delay (disabled in tests) so
//! loading states get exercised like they would against a network.

pub mod data;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use dermastore_core::{
    Address, ApiError, AuthResponse, Brand, Cart, CartItem, CartTotals, Category, CategoryTree,
    CheckoutSession, CheckoutStep, Credentials, Order, OrderItem, OrderStatus, Page,
    PaymentMethod, PlaceOrderResult, Price, Product, ProductQuery, ProductSort, ProfileUpdate,
    RegisterInput, ReturnRequestItem, ShippingMethod, User,
};

use crate::provider::{
    AddItemInput, ApiProvider, AuthApi, BrandsApi, CartApi, CategoriesApi, CheckoutApi,
    DEFAULT_FEATURED_LIMIT, DEFAULT_RELATED_LIMIT, OrdersApi, ProductsApi,
};
use crate::storage::KeyValueStore;
use crate::stores::{CART_KEY, CUSTOMERS_KEY, JsonSlot, ORDERS_KEY};

use data::{Catalog, Coupon, CouponKind, CustomerRecord, CURRENCY};

/// Default simulated latency bounds in milliseconds.
pub const DEFAULT_LATENCY_MS: (u64, u64) = (200, 500);

/// VAT applied to the subtotal.
const VAT_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
/// Flat shipping fee below the free-shipping threshold.
const FLAT_SHIPPING: Decimal = Decimal::from_parts(99, 0, 0, false, 0);
/// Subtotal at which shipping becomes free.
const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// The local mock backend.
#[derive(Clone)]
pub struct MockProvider {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Catalog,
    coupons: Vec<Coupon>,
    latency: Option<(u64, u64)>,
    state: RwLock<MockState>,
    cart_slot: JsonSlot<Cart>,
    orders_slot: JsonSlot<Vec<Order>>,
    customers_slot: JsonSlot<Vec<CustomerRecord>>,
}

struct MockState {
    cart: Cart,
    orders: Vec<Order>,
    customers: Vec<CustomerRecord>,
    /// In-memory session; deliberately not persisted.
    session: Option<Session>,
    checkouts: HashMap<String, CheckoutSession>,
    line_seq: u32,
}

struct Session {
    user_id: String,
    token: String,
}

impl MockProvider {
    /// Provider with default latency, persisting through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_latency(store, Some(DEFAULT_LATENCY_MS))
    }

    /// Provider with explicit latency bounds; `None` disables the
    /// simulated delay entirely.
    #[must_use]
    pub fn with_latency(store: Arc<dyn KeyValueStore>, latency: Option<(u64, u64)>) -> Self {
        let cart_slot: JsonSlot<Cart> = JsonSlot::new(Arc::clone(&store), CART_KEY);
        let orders_slot: JsonSlot<Vec<Order>> = JsonSlot::new(Arc::clone(&store), ORDERS_KEY);
        let customers_slot: JsonSlot<Vec<CustomerRecord>> =
            JsonSlot::new(Arc::clone(&store), CUSTOMERS_KEY);

        let cart = cart_slot
            .load()
            .unwrap_or_else(|| Cart::empty(&format!("cart-{}", Uuid::new_v4()), CURRENCY));
        let orders = orders_slot.load().unwrap_or_default();
        let customers = customers_slot
            .load()
            .unwrap_or_else(data::fixture_customers);

        // Resume the line-id sequence past any persisted lines.
        let line_seq = cart
            .items
            .iter()
            .filter_map(|item| item.id.strip_prefix("line-")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        Self {
            inner: Arc::new(Inner {
                catalog: data::fixture_catalog(),
                coupons: data::default_coupons(),
                latency,
                state: RwLock::new(MockState {
                    cart,
                    orders,
                    customers,
                    session: None,
                    checkouts: HashMap::new(),
                    line_seq,
                }),
                cart_slot,
                orders_slot,
                customers_slot,
            }),
        }
    }

    async fn delay(&self) {
        if let Some((low, high)) = self.inner.latency {
            let ms = rand::rng().random_range(low..=high);
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, MockState>, ApiError> {
        self.inner
            .state
            .read()
            .map_err(|_| ApiError::Upstream("provider state lock poisoned".to_owned()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, MockState>, ApiError> {
        self.inner
            .state
            .write()
            .map_err(|_| ApiError::Upstream("provider state lock poisoned".to_owned()))
    }

    fn coupon(&self, code: &str) -> Option<&Coupon> {
        self.inner.coupons.iter().find(|c| c.code == code)
    }

    /// Re-establishes every cart invariant and persists the cart.
    fn refresh_cart(&self, state: &mut MockState) {
        for item in &mut state.cart.items {
            item.resubtotal();
        }
        state.cart.item_count = state.cart.count_items();
        let coupon = state
            .cart
            .coupon
            .as_ref()
            .and_then(|applied| self.coupon(&applied.code));
        state.cart.totals = compute_totals(&state.cart.items, coupon);
        self.inner.cart_slot.save(&state.cart);
    }

    /// Slugs of a category and all of its descendants.
    fn subtree_slugs(&self, slug: &str) -> HashSet<String> {
        let tree = &self.inner.catalog.tree;
        let mut slugs = HashSet::new();
        let Some(root) = tree.get_by_slug(slug) else {
            return slugs;
        };
        let mut pending = vec![root.id.clone()];
        while let Some(id) = pending.pop() {
            if let Some(node) = tree.get(&id) {
                slugs.insert(node.slug.clone());
                pending.extend(node.children.iter().cloned());
            }
        }
        slugs
    }

    fn find_product(&self, product_id: &str) -> Option<&Product> {
        self.inner
            .catalog
            .products
            .iter()
            .find(|p| p.id == product_id)
    }

    /// The signed-in customer's record, for account mutations.
    fn session_customer_mut(state: &mut MockState) -> Result<&mut CustomerRecord, ApiError> {
        let user_id = state
            .session
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or_else(|| ApiError::Authentication("not signed in".to_owned()))?;
        state
            .customers
            .iter_mut()
            .find(|r| r.user.id == user_id)
            .ok_or_else(|| ApiError::Authentication("session user no longer exists".to_owned()))
    }

    fn checkout_mut<'a>(
        state: &'a mut MockState,
        session_id: &str,
    ) -> Result<&'a mut CheckoutSession, ApiError> {
        state
            .checkouts
            .get_mut(session_id)
            .ok_or_else(|| ApiError::not_found("checkout session", session_id))
    }

    fn shipping_options(cart: &Cart) -> Vec<ShippingMethod> {
        let standard = if cart.totals.subtotal.amount >= FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };
        vec![
            ShippingMethod {
                code: "standard".to_owned(),
                label: "Standard Delivery (3-5 days)".to_owned(),
                price: Price::new(standard, CURRENCY),
            },
            ShippingMethod {
                code: "express".to_owned(),
                label: "Express Delivery (1-2 days)".to_owned(),
                price: Price::new(Decimal::new(199, 0), CURRENCY),
            },
        ]
    }

    fn payment_options() -> Vec<PaymentMethod> {
        vec![
            PaymentMethod {
                code: "card".to_owned(),
                label: "Credit / Debit Card".to_owned(),
            },
            PaymentMethod {
                code: "eft".to_owned(),
                label: "Instant EFT".to_owned(),
            },
            PaymentMethod {
                code: "cod".to_owned(),
                label: "Cash on Delivery".to_owned(),
            },
        ]
    }
}

/// Recomputes cart totals from scratch.
fn compute_totals(items: &[CartItem], coupon: Option<&Coupon>) -> CartTotals {
    let subtotal: Decimal = items.iter().map(|i| i.subtotal.amount).sum();

    let discount = match coupon.map(|c| &c.kind) {
        Some(CouponKind::Percent(percent)) => {
            (subtotal * *percent / Decimal::new(100, 0)).round_dp(2)
        }
        Some(CouponKind::Fixed(amount)) => (*amount).min(subtotal),
        None => Decimal::ZERO,
    };

    let shipping = if items.is_empty() || subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING
    };

    let tax = (subtotal * VAT_RATE).round_dp(2);
    let total = subtotal - discount + shipping + tax;

    CartTotals {
        subtotal: Price::new(subtotal, CURRENCY),
        discount: Price::new(discount, CURRENCY),
        shipping: Price::new(shipping, CURRENCY),
        tax: Price::new(tax, CURRENCY),
        total: Price::new(total, CURRENCY),
    }
}

#[async_trait]
impl ProductsApi for MockProvider {
    #[instrument(skip(self), fields(page = query.page, sort = %query.sort))]
    async fn get_all(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        self.delay().await;
        let query = query.normalized();

        let category_slugs = query
            .category_slug
            .as_deref()
            .map(|slug| self.subtree_slugs(slug));

        let mut items: Vec<Product> = self
            .inner
            .catalog
            .products
            .iter()
            .filter(|p| match &category_slugs {
                Some(slugs) => p.categories.iter().any(|c| slugs.contains(&c.slug)),
                None => true,
            })
            .filter(|p| match query.brand_slug.as_deref() {
                Some(slug) => p.brand.slug == slug,
                None => true,
            })
            .filter(|p| match query.search.as_deref() {
                Some(needle) => {
                    let needle = needle.to_lowercase();
                    p.name.to_lowercase().contains(&needle)
                        || p.description.to_lowercase().contains(&needle)
                }
                None => true,
            })
            .filter(|p| query.price_min.is_none_or(|min| p.price.amount >= min))
            .filter(|p| query.price_max.is_none_or(|max| p.price.amount <= max))
            .cloned()
            .map(data::synthesize)
            .filter(|p| !query.in_stock_only || p.stock.in_stock)
            .collect();

        sort_products(&mut items, query.sort);
        debug!(matched = items.len(), "mock product listing");
        Ok(Page::slice(items, query.page, query.page_size))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, ApiError> {
        self.delay().await;
        Ok(self
            .inner
            .catalog
            .products
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
            .map(data::synthesize))
    }

    async fn get_by_id(&self, product_id: &str) -> Result<Option<Product>, ApiError> {
        self.delay().await;
        Ok(self.find_product(product_id).cloned().map(data::synthesize))
    }

    async fn search(&self, term: &str, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        let query = ProductQuery {
            search: Some(term.to_owned()),
            ..query
        };
        ProductsApi::get_all(self, query).await
    }

    async fn get_by_category(
        &self,
        category_slug: &str,
        query: ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        let query = ProductQuery {
            category_slug: Some(category_slug.to_owned()),
            ..query
        };
        ProductsApi::get_all(self, query).await
    }

    async fn get_by_brand(
        &self,
        brand_slug: &str,
        query: ProductQuery,
    ) -> Result<Page<Product>, ApiError> {
        let query = ProductQuery {
            brand_slug: Some(brand_slug.to_owned()),
            ..query
        };
        ProductsApi::get_all(self, query).await
    }

    /// Highest-rated products first; rating ties break on id.
    async fn get_featured(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        self.delay().await;
        let limit = if limit == 0 { DEFAULT_FEATURED_LIMIT } else { limit };
        let mut items: Vec<Product> = self
            .inner
            .catalog
            .products
            .iter()
            .cloned()
            .map(data::synthesize)
            .collect();
        let rating_of = |p: &Product| p.rating.map_or(0.0_f32, |r| r.average);
        items.sort_by(|a, b| {
            rating_of(b)
                .total_cmp(&rating_of(a))
                .then_with(|| a.id.cmp(&b.id))
        });
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn get_related(
        &self,
        product_id: &str,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        self.delay().await;
        let limit = if limit == 0 { DEFAULT_RELATED_LIMIT } else { limit };
        let Some(product) = self.find_product(product_id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .inner
            .catalog
            .products
            .iter()
            .filter(|p| p.id != product_id)
            .filter(|p| {
                p.categories
                    .iter()
                    .any(|c| product.categories.iter().any(|pc| pc.slug == c.slug))
            })
            .take(limit as usize)
            .cloned()
            .map(data::synthesize)
            .collect())
    }
}

fn sort_products(items: &mut [Product], sort: ProductSort) {
    match sort {
        // Fixture order is the relevance order.
        ProductSort::Relevance => {}
        ProductSort::PriceAsc => {
            items.sort_by(|a, b| (a.price.amount, &a.id).cmp(&(b.price.amount, &b.id)));
        }
        ProductSort::PriceDesc => {
            items.sort_by(|a, b| {
                (b.price.amount, &a.id).cmp(&(a.price.amount, &b.id))
            });
        }
        ProductSort::NameAsc => {
            items.sort_by(|a, b| {
                (a.name.to_lowercase(), &a.id).cmp(&(b.name.to_lowercase(), &b.id))
            });
        }
        ProductSort::NameDesc => {
            items.sort_by(|a, b| {
                (b.name.to_lowercase(), &a.id).cmp(&(a.name.to_lowercase(), &b.id))
            });
        }
        ProductSort::Newest => {
            items.sort_by(|a, b| (b.created_at, &a.id).cmp(&(a.created_at, &b.id)));
        }
        ProductSort::Oldest => {
            items.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        }
    }
}

#[async_trait]
impl CategoriesApi for MockProvider {
    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
        let tree = self.get_tree().await?;
        Ok(tree.iter().cloned().collect())
    }

    async fn get_tree(&self) -> Result<CategoryTree, ApiError> {
        self.delay().await;
        let mut nodes: Vec<Category> = self.inner.catalog.tree.iter().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for node in &mut nodes {
            let slugs = self.subtree_slugs(&node.slug);
            #[allow(clippy::cast_possible_truncation)]
            let count = self
                .inner
                .catalog
                .products
                .iter()
                .filter(|p| p.categories.iter().any(|c| slugs.contains(&c.slug)))
                .count() as u32;
            node.product_count = Some(count);
        }
        Ok(CategoryTree::from_nodes(nodes))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError> {
        self.delay().await;
        Ok(self.inner.catalog.tree.get_by_slug(slug).cloned())
    }

    async fn get_by_id(&self, category_id: &str) -> Result<Option<Category>, ApiError> {
        self.delay().await;
        Ok(self.inner.catalog.tree.get(category_id).cloned())
    }
}

#[async_trait]
impl BrandsApi for MockProvider {
    async fn get_all(&self) -> Result<Vec<Brand>, ApiError> {
        self.delay().await;
        Ok(self.inner.catalog.brands.clone())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Brand>, ApiError> {
        self.delay().await;
        Ok(self
            .inner
            .catalog
            .brands
            .iter()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn get_by_id(&self, brand_id: &str) -> Result<Option<Brand>, ApiError> {
        self.delay().await;
        Ok(self
            .inner
            .catalog
            .brands
            .iter()
            .find(|b| b.id == brand_id)
            .cloned())
    }
}

#[async_trait]
impl CartApi for MockProvider {
    async fn get(&self) -> Result<Cart, ApiError> {
        self.delay().await;
        Ok(self.read_state()?.cart.clone())
    }

    #[instrument(skip(self), fields(product_id = %input.product_id, quantity = input.quantity))]
    async fn add_item(&self, input: AddItemInput) -> Result<Cart, ApiError> {
        input.validate()?;
        self.delay().await;

        let product = self
            .find_product(&input.product_id)
            .ok_or_else(|| ApiError::not_found("product", &input.product_id))?
            .clone();

        let mut state = self.write_state()?;
        let variant = input.variant_id.as_deref();
        if let Some(existing) = state
            .cart
            .items
            .iter_mut()
            .find(|i| i.product_id == input.product_id && i.variant_id.as_deref() == variant)
        {
            existing.quantity += input.quantity;
        } else {
            state.line_seq += 1;
            let line_id = format!("line-{}", state.line_seq);
            let price = product.price.clone();
            state.cart.items.push(CartItem {
                id: line_id,
                product_id: product.id.clone(),
                variant_id: input.variant_id.clone(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                slug: product.slug.clone(),
                image: product.default_image().map(|i| i.url.clone()),
                price: price.clone(),
                quantity: input.quantity,
                subtotal: price,
            });
        }
        self.refresh_cart(&mut state);
        debug!(item_count = state.cart.item_count, "item added to cart");
        Ok(state.cart.clone())
    }

    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        if quantity == 0 {
            // Zero quantity removes the line.
            let before = state.cart.items.len();
            state.cart.items.retain(|i| i.id != item_id);
            if state.cart.items.len() == before {
                return Err(ApiError::not_found("cart item", item_id));
            }
        } else {
            let item = state
                .cart
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| ApiError::not_found("cart item", item_id))?;
            item.quantity = quantity;
        }
        self.refresh_cart(&mut state);
        Ok(state.cart.clone())
    }

    async fn remove_item(&self, item_id: &str) -> Result<Cart, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let before = state.cart.items.len();
        state.cart.items.retain(|i| i.id != item_id);
        if state.cart.items.len() == before {
            return Err(ApiError::not_found("cart item", item_id));
        }
        self.refresh_cart(&mut state);
        Ok(state.cart.clone())
    }

    async fn apply_coupon(&self, code: &str) -> Result<Cart, ApiError> {
        self.delay().await;

        let coupon = self
            .coupon(code)
            .ok_or_else(|| ApiError::Conflict(format!("invalid coupon code `{code}`")))?
            .clone();

        let mut state = self.write_state()?;
        state.cart.coupon = Some(dermastore_core::AppliedCoupon {
            code: coupon.code,
            label: Some(coupon.label),
        });
        self.refresh_cart(&mut state);
        Ok(state.cart.clone())
    }

    async fn clear(&self) -> Result<Cart, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        state.cart.items.clear();
        state.cart.coupon = None;
        self.refresh_cart(&mut state);
        Ok(state.cart.clone())
    }

    async fn remove_coupon(&self) -> Result<Cart, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        state.cart.coupon = None;
        self.refresh_cart(&mut state);
        Ok(state.cart.clone())
    }

    /// There is only one in-process cart, so a merge has nothing to
    /// fold in; the active cart is returned unchanged.
    async fn merge(&self, _guest_cart_id: &str) -> Result<Cart, ApiError> {
        self.delay().await;
        Ok(self.read_state()?.cart.clone())
    }
}

#[async_trait]
impl AuthApi for MockProvider {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: Credentials) -> Result<AuthResponse, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let record = state
            .customers
            .iter()
            .find(|r| r.user.email == credentials.email && r.password == credentials.password)
            .cloned()
            .ok_or_else(ApiError::invalid_credentials)?;

        let token = Uuid::new_v4().to_string();
        state.session = Some(Session {
            user_id: record.user.id.clone(),
            token: token.clone(),
        });
        debug!(user_id = %record.user.id, "mock login");
        Ok(AuthResponse {
            user: record.user,
            access_token: Some(token),
            expires_at: None,
        })
    }

    async fn register(&self, input: RegisterInput) -> Result<AuthResponse, ApiError> {
        if !input.email.contains('@') {
            return Err(ApiError::Validation("invalid email address".to_owned()));
        }
        if input.password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".to_owned(),
            ));
        }
        self.delay().await;

        let mut state = self.write_state()?;
        if state.customers.iter().any(|r| r.user.email == input.email) {
            return Err(ApiError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }

        let user = User {
            id: format!("user-{}", Uuid::new_v4()),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            addresses: Vec::new(),
            created_at: Some(Utc::now()),
        };
        state.customers.push(CustomerRecord {
            password: input.password,
            user: user.clone(),
        });
        self.inner.customers_slot.save(&state.customers);

        let token = Uuid::new_v4().to_string();
        state.session = Some(Session {
            user_id: user.id.clone(),
            token: token.clone(),
        });
        Ok(AuthResponse {
            user,
            access_token: Some(token),
            expires_at: None,
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.delay().await;
        self.write_state()?.session = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        self.delay().await;
        let state = self.read_state()?;
        let user = state.session.as_ref().and_then(|session| {
            state
                .customers
                .iter()
                .find(|r| r.user.id == session.user_id)
                .map(|r| r.user.clone())
        });
        Ok(user)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let record = Self::session_customer_mut(&mut state)?;
        if let Some(first_name) = update.first_name {
            record.user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            record.user.last_name = last_name;
        }
        let user = record.user.clone();
        self.inner.customers_slot.save(&state.customers);
        Ok(user)
    }

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if new_password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".to_owned(),
            ));
        }
        self.delay().await;

        let mut state = self.write_state()?;
        let record = Self::session_customer_mut(&mut state)?;
        if record.password != current_password {
            return Err(ApiError::Authentication(
                "current password is incorrect".to_owned(),
            ));
        }
        record.password = new_password.to_owned();
        self.inner.customers_slot.save(&state.customers);
        Ok(())
    }

    /// Succeeds whether or not the email is known.
    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        if !email.contains('@') {
            return Err(ApiError::Validation("invalid email address".to_owned()));
        }
        self.delay().await;
        debug!("password reset requested");
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        if token.is_empty() {
            return Err(ApiError::Validation("a reset token is required".to_owned()));
        }
        if new_password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".to_owned(),
            ));
        }
        self.delay().await;
        // Any token is accepted on this backend.
        Ok(())
    }

    async fn add_address(&self, mut address: Address) -> Result<Address, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let record = Self::session_customer_mut(&mut state)?;
        address.id = Some(format!("addr-{}", Uuid::new_v4()));
        if address.is_default_shipping {
            for existing in &mut record.user.addresses {
                existing.is_default_shipping = false;
            }
        }
        if address.is_default_billing {
            for existing in &mut record.user.addresses {
                existing.is_default_billing = false;
            }
        }
        record.user.addresses.push(address.clone());
        self.inner.customers_slot.save(&state.customers);
        Ok(address)
    }

    async fn update_address(
        &self,
        address_id: &str,
        mut address: Address,
    ) -> Result<Address, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let record = Self::session_customer_mut(&mut state)?;
        let slot = record
            .user
            .addresses
            .iter_mut()
            .find(|a| a.id.as_deref() == Some(address_id))
            .ok_or_else(|| ApiError::not_found("address", address_id))?;
        address.id = Some(address_id.to_owned());
        *slot = address.clone();
        self.inner.customers_slot.save(&state.customers);
        Ok(address)
    }

    async fn delete_address(&self, address_id: &str) -> Result<(), ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let record = Self::session_customer_mut(&mut state)?;
        let before = record.user.addresses.len();
        record
            .user
            .addresses
            .retain(|a| a.id.as_deref() != Some(address_id));
        if record.user.addresses.len() == before {
            return Err(ApiError::not_found("address", address_id));
        }
        self.inner.customers_slot.save(&state.customers);
        Ok(())
    }

    /// Rotates the in-memory session token.
    async fn refresh_token(&self) -> Result<AuthResponse, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let user = Self::session_customer_mut(&mut state)?.user.clone();
        let session = state
            .session
            .as_mut()
            .ok_or_else(|| ApiError::Authentication("not signed in".to_owned()))?;
        session.token = Uuid::new_v4().to_string();
        Ok(AuthResponse {
            user,
            access_token: Some(session.token.clone()),
            expires_at: None,
        })
    }
}

#[async_trait]
impl CheckoutApi for MockProvider {
    async fn create_session(&self) -> Result<CheckoutSession, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = CheckoutSession::new(&format!("chk-{}", Uuid::new_v4()), state.cart.clone());
        state
            .checkouts
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn set_email(
        &self,
        session_id: &str,
        email: &str,
    ) -> Result<CheckoutSession, ApiError> {
        if !email.contains('@') {
            return Err(ApiError::Validation("invalid email address".to_owned()));
        }
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        session.email = Some(email.to_owned());
        session.advance_to(CheckoutStep::Shipping);
        Ok(session.clone())
    }

    async fn set_shipping_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        session.shipping_address = Some(address);
        session.advance_to(CheckoutStep::Shipping);
        Ok(session.clone())
    }

    async fn set_billing_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        session.billing_address = Some(address);
        Ok(session.clone())
    }

    async fn shipping_methods(&self, session_id: &str) -> Result<Vec<ShippingMethod>, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        Ok(Self::shipping_options(&session.cart))
    }

    async fn set_shipping_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        if session.shipping_address.is_none() {
            return Err(ApiError::Validation(
                "a shipping address must be set before choosing a method".to_owned(),
            ));
        }
        let method = Self::shipping_options(&session.cart)
            .into_iter()
            .find(|m| m.code == code)
            .ok_or_else(|| ApiError::Validation(format!("unknown shipping method `{code}`")))?;
        session.shipping_method = Some(method);
        session.advance_to(CheckoutStep::Payment);
        Ok(session.clone())
    }

    async fn payment_methods(&self, session_id: &str) -> Result<Vec<PaymentMethod>, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        Self::checkout_mut(&mut state, session_id)?;
        Ok(Self::payment_options())
    }

    async fn set_payment_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = Self::checkout_mut(&mut state, session_id)?;
        let method = Self::payment_options()
            .into_iter()
            .find(|m| m.code == code)
            .ok_or_else(|| ApiError::Validation(format!("unknown payment method `{code}`")))?;
        session.payment_method = Some(method);
        session.advance_to(CheckoutStep::Review);
        Ok(session.clone())
    }

    #[instrument(skip(self))]
    async fn place_order(&self, session_id: &str) -> Result<PlaceOrderResult, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let session = state
            .checkouts
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("checkout session", session_id))?;

        if state.cart.is_empty() {
            return Err(ApiError::Validation(
                "cannot place an order for an empty cart".to_owned(),
            ));
        }
        if session.step < CheckoutStep::Review {
            return Err(ApiError::Validation(
                "checkout is incomplete; shipping and payment must be chosen first".to_owned(),
            ));
        }
        let Some(shipping_address) = session.shipping_address else {
            return Err(ApiError::Validation("a shipping address is required".to_owned()));
        };

        // The order snapshots the live cart, not the session's copy.
        let order = Order {
            id: format!("order-{}", Uuid::new_v4()),
            number: format!("DS-{:05}", 1001 + state.orders.len()),
            status: OrderStatus::Pending,
            items: state
                .cart
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    image: item.image.clone(),
                    price: item.price.clone(),
                    quantity: item.quantity,
                    subtotal: item.subtotal.clone(),
                })
                .collect(),
            shipping_address: Some(shipping_address),
            billing_address: session.billing_address,
            shipping_method: session.shipping_method.map(|m| m.label),
            payment_method: session.payment_method.map(|m| m.label),
            totals: state.cart.totals.clone(),
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        self.inner.orders_slot.save(&state.orders);

        state.cart.items.clear();
        state.cart.coupon = None;
        self.refresh_cart(&mut state);
        state.checkouts.remove(session_id);

        debug!(order_number = %order.number, "mock order placed");
        Ok(PlaceOrderResult {
            order,
            redirect_url: None,
        })
    }
}

#[async_trait]
impl OrdersApi for MockProvider {
    async fn get_all(&self, page: u32, page_size: u32) -> Result<Page<Order>, ApiError> {
        self.delay().await;
        let mut orders = self.read_state()?.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::slice(orders, page, page_size))
    }

    async fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        self.delay().await;
        Ok(self
            .read_state()?
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned())
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, ApiError> {
        self.delay().await;
        Ok(self
            .read_state()?
            .orders
            .iter()
            .find(|o| o.number == number)
            .cloned())
    }

    async fn cancel(&self, order_id: &str) -> Result<Order, ApiError> {
        self.delay().await;

        let mut state = self.write_state()?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ApiError::not_found("order", order_id))?;

        match order.status {
            // Idempotent: a second cancel is a no-op success.
            OrderStatus::Cancelled => Ok(order.clone()),
            OrderStatus::Pending | OrderStatus::Processing => {
                order.status = OrderStatus::Cancelled;
                let cancelled = order.clone();
                self.inner.orders_slot.save(&state.orders);
                Ok(cancelled)
            }
            OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Refunded => Err(
                ApiError::Conflict("order can no longer be cancelled".to_owned()),
            ),
        }
    }

    async fn request_return(
        &self,
        order_id: &str,
        items: Vec<ReturnRequestItem>,
    ) -> Result<(), ApiError> {
        if items.is_empty() {
            return Err(ApiError::Validation(
                "a return request needs at least one item".to_owned(),
            ));
        }
        self.delay().await;

        let state = self.read_state()?;
        let order = state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| ApiError::not_found("order", order_id))?;

        for item in &items {
            let line = order
                .items
                .iter()
                .find(|l| l.product_id == item.product_id)
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "product `{}` is not on order `{}`",
                        item.product_id, order.number
                    ))
                })?;
            if item.quantity == 0 || item.quantity > line.quantity {
                return Err(ApiError::Validation(format!(
                    "return quantity for `{}` must be between 1 and {}",
                    item.product_id, line.quantity
                )));
            }
        }
        debug!(order_number = %order.number, lines = items.len(), "return requested");
        Ok(())
    }
}

impl ApiProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn products(&self) -> &dyn ProductsApi {
        self
    }
    fn categories(&self) -> &dyn CategoriesApi {
        self
    }
    fn brands(&self) -> &dyn BrandsApi {
        self
    }
    fn cart(&self) -> &dyn CartApi {
        self
    }
    fn auth(&self) -> &dyn AuthApi {
        self
    }
    fn checkout(&self) -> &dyn CheckoutApi {
        self
    }
    fn orders(&self) -> &dyn OrdersApi {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn provider() -> MockProvider {
        MockProvider::with_latency(Arc::new(MemoryStore::new()), None)
    }

    #[tokio::test]
    async fn totals_follow_the_equation_after_each_mutation() {
        let mock = provider();
        let cart = mock
            .add_item(AddItemInput {
                product_id: "prod-1".to_owned(),
                variant_id: None,
                quantity: 2,
            })
            .await
            .unwrap();
        assert!(cart.totals.is_balanced());
        assert_eq!(cart.item_count, 2);

        let item_id = cart.items[0].id.clone();
        let cart = mock.update_item(&item_id, 1).await.unwrap();
        assert!(cart.totals.is_balanced());
        let cart = mock.remove_item(&item_id).await.unwrap();
        assert!(cart.totals.is_balanced());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn empty_cart_has_no_shipping_fee() {
        let mock = provider();
        let cart = mock.get().await.unwrap();
        assert_eq!(cart.totals.shipping.amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn vat_is_fifteen_percent_of_subtotal() {
        let mock = provider();
        let cart = mock
            .add_item(AddItemInput {
                product_id: "prod-10".to_owned(), // R99.99
                variant_id: None,
                quantity: 1,
            })
            .await
            .unwrap();
        let expected = (cart.totals.subtotal.amount * VAT_RATE).round_dp(2);
        assert_eq!(cart.totals.tax.amount, expected);
    }

    #[tokio::test]
    async fn fixed_coupon_never_exceeds_subtotal() {
        let totals = compute_totals(&[], None);
        assert_eq!(totals.discount.amount, Decimal::ZERO);

        let mock = provider();
        mock.add_item(AddItemInput {
            product_id: "prod-10".to_owned(), // R99.99 subtotal
            variant_id: None,
            quantity: 1,
        })
        .await
        .unwrap();
        let cart = mock.apply_coupon("SAVE50").await.unwrap();
        assert_eq!(cart.totals.discount.amount, Decimal::new(50, 0));
        assert!(cart.totals.is_balanced());
    }

    #[tokio::test]
    async fn unknown_coupon_is_a_conflict_and_totals_are_untouched() {
        let mock = provider();
        let before = mock
            .add_item(AddItemInput {
                product_id: "prod-1".to_owned(),
                variant_id: None,
                quantity: 1,
            })
            .await
            .unwrap();
        let err = mock.apply_coupon("NOPE").await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        let after = mock.get().await.unwrap();
        assert_eq!(after.totals, before.totals);
    }

    #[tokio::test]
    async fn cart_persists_across_provider_instances() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = MockProvider::with_latency(Arc::clone(&store), None);
        first
            .add_item(AddItemInput {
                product_id: "prod-3".to_owned(),
                variant_id: None,
                quantity: 2,
            })
            .await
            .unwrap();

        let second = MockProvider::with_latency(store, None);
        let cart = second.get().await.unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[tokio::test]
    async fn sessions_do_not_survive_a_restart() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = MockProvider::with_latency(Arc::clone(&store), None);
        first
            .login(Credentials {
                email: "thandi@example.com".to_owned(),
                password: "password123".to_owned(),
            })
            .await
            .unwrap();
        assert!(first.current_user().await.unwrap().is_some());

        let second = MockProvider::with_latency(store, None);
        assert!(second.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_failure_is_uniform_for_unknown_email_and_bad_password() {
        let mock = provider();
        let unknown = mock
            .login(Credentials {
                email: "nobody@example.com".to_owned(),
                password: "whatever".to_owned(),
            })
            .await
            .unwrap_err();
        let wrong = mock
            .login(Credentials {
                email: "thandi@example.com".to_owned(),
                password: "wrong".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let mock = provider();
        let err = mock
            .register(RegisterInput {
                email: "thandi@example.com".to_owned(),
                password: "longenough".to_owned(),
                first_name: "T".to_owned(),
                last_name: "N".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn category_filter_includes_descendants() {
        let mock = provider();
        let page = ProductsApi::get_all(
            &mock,
            ProductQuery {
                category_slug: Some("skincare".to_owned()),
                page_size: 50,
                ..ProductQuery::default()
            },
        )
        .await
        .unwrap();
        // Every fixture product lives under the skincare root.
        assert_eq!(page.total_items as usize, mock.inner.catalog.products.len());
    }

    #[tokio::test]
    async fn search_delegates_to_the_filtered_listing() {
        let mock = provider();
        let direct = ProductsApi::get_all(
            &mock,
            ProductQuery {
                search: Some("serum".to_owned()),
                ..ProductQuery::default()
            },
        )
        .await
        .unwrap();
        let searched = mock.search("serum", ProductQuery::default()).await.unwrap();
        assert_eq!(searched.total_items, direct.total_items);
        assert!(searched.total_items > 0);
    }

    #[tokio::test]
    async fn featured_products_are_rating_sorted_and_limited() {
        let mock = provider();
        let featured = mock.get_featured(3).await.unwrap();
        assert_eq!(featured.len(), 3);
        let ratings: Vec<f32> = featured
            .iter()
            .map(|p| p.rating.unwrap().average)
            .collect();
        let mut sorted = ratings.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(ratings, sorted);
    }

    #[tokio::test]
    async fn related_products_share_a_category_and_exclude_the_product() {
        let mock = provider();
        let related = mock.get_related("prod-1", 0).await.unwrap();
        assert!(!related.is_empty());
        assert!(related.len() <= DEFAULT_RELATED_LIMIT as usize);
        assert!(related.iter().all(|p| p.id != "prod-1"));

        let unknown = mock.get_related("prod-999", 4).await.unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn clearing_the_cart_keeps_its_identity() {
        let mock = provider();
        let before = mock
            .add_item(AddItemInput {
                product_id: "prod-2".to_owned(),
                variant_id: None,
                quantity: 3,
            })
            .await
            .unwrap();
        let cleared = mock.clear().await.unwrap();
        assert!(cleared.is_empty());
        assert_eq!(cleared.id, before.id);
        assert_eq!(cleared.totals.total.amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn merge_returns_the_active_cart_unchanged() {
        let mock = provider();
        let before = mock
            .add_item(AddItemInput {
                product_id: "prod-6".to_owned(),
                variant_id: None,
                quantity: 1,
            })
            .await
            .unwrap();
        let merged = mock.merge("cart-guest-123").await.unwrap();
        assert_eq!(merged.items, before.items);
        assert_eq!(merged.totals, before.totals);
    }

    #[tokio::test]
    async fn profile_and_address_mutations_require_a_session() {
        let mock = provider();
        let err = mock
            .update_profile(ProfileUpdate {
                first_name: Some("Naledi".to_owned()),
                last_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));

        let err = mock.refresh_token().await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn profile_update_applies_only_the_given_fields() {
        let mock = provider();
        mock.login(Credentials {
            email: "thandi@example.com".to_owned(),
            password: "password123".to_owned(),
        })
        .await
        .unwrap();

        let user = mock
            .update_profile(ProfileUpdate {
                first_name: Some("Naledi".to_owned()),
                last_name: None,
            })
            .await
            .unwrap();
        assert_eq!(user.first_name, "Naledi");
        assert_eq!(user.last_name, "Nkosi");
    }

    #[tokio::test]
    async fn change_password_verifies_the_current_one() {
        let mock = provider();
        mock.login(Credentials {
            email: "thandi@example.com".to_owned(),
            password: "password123".to_owned(),
        })
        .await
        .unwrap();

        let err = mock
            .change_password("wrong-password", "newsecret99")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));

        mock.change_password("password123", "newsecret99")
            .await
            .unwrap();
        mock.logout().await.unwrap();
        mock.login(Credentials {
            email: "thandi@example.com".to_owned(),
            password: "newsecret99".to_owned(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn password_reset_request_is_uniform_for_unknown_emails() {
        let mock = provider();
        mock.request_password_reset("thandi@example.com")
            .await
            .unwrap();
        mock.request_password_reset("nobody@example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn address_book_crud_round_trips() {
        let mock = provider();
        mock.login(Credentials {
            email: "thandi@example.com".to_owned(),
            password: "password123".to_owned(),
        })
        .await
        .unwrap();

        let added = mock.add_address(sample_address()).await.unwrap();
        let id = added.id.clone().unwrap();

        let mut edited = sample_address();
        edited.city = "Johannesburg".to_owned();
        let updated = mock.update_address(&id, edited).await.unwrap();
        assert_eq!(updated.city, "Johannesburg");
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));

        let err = mock
            .update_address("addr-missing", sample_address())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        mock.delete_address(&id).await.unwrap();
        let err = mock.delete_address(&id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn refresh_token_reissues_for_the_signed_in_user() {
        let mock = provider();
        let login = mock
            .login(Credentials {
                email: "thandi@example.com".to_owned(),
                password: "password123".to_owned(),
            })
            .await
            .unwrap();
        let refreshed = mock.refresh_token().await.unwrap();
        assert_eq!(refreshed.user.id, login.user.id);
        assert!(refreshed.access_token.is_some());
        assert_ne!(refreshed.access_token, login.access_token);
    }

    #[tokio::test]
    async fn cancelling_twice_is_idempotent() {
        let mock = provider();
        mock.add_item(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: None,
            quantity: 1,
        })
        .await
        .unwrap();
        let session = mock.create_session().await.unwrap();
        mock.set_email(&session.id, "a@b.co").await.unwrap();
        mock.set_shipping_address(&session.id, sample_address())
            .await
            .unwrap();
        mock.set_shipping_method(&session.id, "standard").await.unwrap();
        mock.set_payment_method(&session.id, "card").await.unwrap();
        let placed = mock.place_order(&session.id).await.unwrap();

        let once = mock.cancel(&placed.order.id).await.unwrap();
        assert_eq!(once.status, OrderStatus::Cancelled);
        let twice = mock.cancel(&placed.order.id).await.unwrap();
        assert_eq!(twice.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn placing_an_order_requires_a_complete_checkout() {
        let mock = provider();
        mock.add_item(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: None,
            quantity: 1,
        })
        .await
        .unwrap();
        let session = mock.create_session().await.unwrap();
        let err = mock.place_order(&session.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    fn sample_address() -> Address {
        Address {
            id: None,
            first_name: "Thandi".to_owned(),
            last_name: "Nkosi".to_owned(),
            street: vec!["12 Kloof Street".to_owned()],
            city: "Cape Town".to_owned(),
            region: None,
            postcode: "8001".to_owned(),
            country_code: "ZA".to_owned(),
            phone: None,
            is_default_shipping: false,
            is_default_billing: false,
        }
    }
}
