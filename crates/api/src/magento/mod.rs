//! Magento GraphQL provider.
//!
//! A thin client over the upstream GraphQL API: every operation is one
//! fixed document from `queries` plus a variables object, executed by
//! `client` and mapped through `conversions`. The only client-held
//! state is the customer bearer token and the cart id, both persisted
//! through the key-value store and guarded by a mutex so concurrent
//! callers cannot race the bootstrap.

pub mod client;
pub mod conversions;
pub mod queries;
pub mod wire;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use dermastore_core::{
    Address, ApiError, AuthResponse, Brand, Cart, Category, CategoryTree, CheckoutSession,
    CheckoutStep, Credentials, Order, OrderItem, OrderStatus, Page, PaymentMethod,
    PlaceOrderResult, Product, ProductQuery, ProductSort, ProfileUpdate, RegisterInput,
    ReturnRequestItem, ShippingMethod, User,
};

use crate::provider::{
    AddItemInput, ApiProvider, AuthApi, BrandsApi, CartApi, CategoriesApi, CheckoutApi,
    DEFAULT_FEATURED_LIMIT, DEFAULT_RELATED_LIMIT, OrdersApi, ProductsApi,
};
use crate::config::MagentoConfig;
use crate::storage::KeyValueStore;
use crate::stores::{JsonSlot, MAGENTO_CART_ID_KEY, MAGENTO_TOKEN_KEY};

use client::{GraphqlClient, MagentoError};
use conversions::{
    DEFAULT_CURRENCY, address_book_input, address_to_input, convert_address, convert_cart,
    convert_category_tree, convert_customer, convert_order, convert_payment_options,
    convert_product, convert_product_page, convert_shipping_options,
};
use wire::{
    AddToCartData, ApplyCouponData, CartData, CategoriesData, ChangePasswordData,
    CreateAddressData, CreateCustomerData, CreateEmptyCartData, CustomerCartData, CustomerData,
    CustomerOrdersData, DeleteAddressData, GenerateTokenData, MergeCartsData, PaymentMethodsData,
    PlaceOrderData, ProductsData, RemoveCouponData, RemoveItemData, RequestPasswordResetData,
    RevokeTokenData, SetShippingAddressData, UpdateAddressData, UpdateCartItemsData,
    UpdateCustomerData, WireCartWrapper,
};

/// How many items the post-filter branch pulls before filtering
/// client-side.
const POST_FILTER_FETCH_SIZE: u32 = 200;

/// How many orders the history query requests.
const ORDERS_PAGE_SIZE: u32 = 50;

/// The Magento backend.
#[derive(Clone)]
pub struct MagentoProvider {
    inner: Arc<Inner>,
}

struct Inner {
    client: GraphqlClient,
    /// Token and cart id; the mutex also serializes cart bootstrap so
    /// two concurrent first-accesses cannot create two carts.
    session: tokio::sync::Mutex<SessionState>,
    /// Transient client-side checkout progress, keyed by session id.
    checkouts: std::sync::Mutex<HashMap<String, CheckoutProgress>>,
    token_slot: JsonSlot<String>,
    cart_id_slot: JsonSlot<String>,
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    cart_id: Option<String>,
}

struct CheckoutProgress {
    session: CheckoutSession,
    available_shipping: Vec<ShippingMethod>,
}

impl MagentoProvider {
    /// Builds the provider, reloading any persisted session state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Upstream`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        config: &MagentoConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let client = GraphqlClient::new(config).map_err(ApiError::from)?;
        let token_slot: JsonSlot<String> = JsonSlot::new(Arc::clone(&store), MAGENTO_TOKEN_KEY);
        let cart_id_slot: JsonSlot<String> = JsonSlot::new(store, MAGENTO_CART_ID_KEY);

        let session = SessionState {
            token: token_slot.load(),
            cart_id: cart_id_slot.load(),
        };

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                session: tokio::sync::Mutex::new(session),
                checkouts: std::sync::Mutex::new(HashMap::new()),
                token_slot,
                cart_id_slot,
            }),
        })
    }

    async fn token(&self) -> Option<String> {
        self.inner.session.lock().await.token.clone()
    }

    async fn require_token(&self) -> Result<String, ApiError> {
        self.token().await.ok_or_else(|| {
            ApiError::Authentication("this operation requires a signed-in customer".to_owned())
        })
    }

    /// Magento address-book mutations address entries by integer id.
    fn numeric_address_id(address_id: &str) -> Result<i64, ApiError> {
        address_id
            .parse()
            .map_err(|_| ApiError::Validation(format!("invalid address id `{address_id}`")))
    }

    /// The active cart id, creating a cart on first access.
    ///
    /// With a token present the customer cart is resolved; otherwise a
    /// guest cart is created. The id is persisted immediately.
    async fn ensure_cart(&self) -> Result<(String, Option<String>), ApiError> {
        let mut session = self.inner.session.lock().await;
        if let Some(id) = &session.cart_id {
            return Ok((id.clone(), session.token.clone()));
        }

        let token = session.token.clone();
        let id = if let Some(token) = token.as_deref() {
            let data: CustomerCartData = self
                .inner
                .client
                .execute(queries::CUSTOMER_CART_QUERY, json!({}), Some(token))
                .await
                .map_err(ApiError::from)?;
            data.customer_cart
                .and_then(|c| c.id)
                .ok_or_else(|| ApiError::Upstream("customer cart has no id".to_owned()))?
        } else {
            let data: CreateEmptyCartData = self
                .inner
                .client
                .execute(queries::CREATE_EMPTY_CART, json!({}), None)
                .await
                .map_err(ApiError::from)?;
            data.create_empty_cart
                .ok_or_else(|| ApiError::Upstream("cart creation returned no id".to_owned()))?
        };

        debug!(cart_id = %id, authenticated = token.is_some(), "cart bootstrapped");
        session.cart_id = Some(id.clone());
        self.inner.cart_id_slot.save(&id);
        Ok((id, token))
    }

    async fn drop_cart_id(&self) {
        self.inner.session.lock().await.cart_id = None;
        self.inner.cart_id_slot.clear();
    }

    async fn fetch_cart(&self, cart_id: &str, token: Option<&str>) -> Result<Cart, ApiError> {
        let data: CartData = self
            .inner
            .client
            .execute(&queries::cart_query(), json!({ "cartId": cart_id }), token)
            .await
            .map_err(ApiError::from)?;
        Ok(data
            .cart
            .map(|c| convert_cart(&c))
            .unwrap_or_else(|| Cart::empty(cart_id, DEFAULT_CURRENCY)))
    }

    async fn fetch_customer(&self, token: &str) -> Result<User, ApiError> {
        let data: CustomerData = self
            .inner
            .client
            .execute(&queries::customer_query(), json!({}), Some(token))
            .await
            .map_err(ApiError::from)?;
        data.customer
            .map(|c| convert_customer(&c))
            .ok_or_else(|| ApiError::Upstream("customer query returned no data".to_owned()))
    }

    fn unwrap_cart_wrapper(
        wrapper: Option<WireCartWrapper>,
        cart_id: &str,
    ) -> Result<Cart, ApiError> {
        let wrapper = wrapper
            .ok_or_else(|| ApiError::Upstream("cart mutation returned no payload".to_owned()))?;
        if let Some(user_error) = wrapper.user_errors.iter().flatten().next() {
            return Err(ApiError::Validation(
                user_error
                    .message
                    .clone()
                    .unwrap_or_else(|| "cart operation was rejected".to_owned()),
            ));
        }
        Ok(wrapper
            .cart
            .map(|c| convert_cart(&c))
            .unwrap_or_else(|| Cart::empty(cart_id, DEFAULT_CURRENCY)))
    }

    fn with_checkout<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut CheckoutProgress) -> R,
    ) -> Result<R, ApiError> {
        let mut checkouts = self
            .inner
            .checkouts
            .lock()
            .map_err(|_| ApiError::Upstream("checkout state lock poisoned".to_owned()))?;
        let progress = checkouts
            .get_mut(session_id)
            .ok_or_else(|| ApiError::not_found("checkout session", session_id))?;
        Ok(f(progress))
    }
}

#[async_trait]
impl ProductsApi for MagentoProvider {
    /// Listing with native search/price/sort arguments.
    ///
    /// Magento has no native filter for the category/brand slugs and
    /// stock facets the unified query carries, so those run through an
    /// explicit post-filter branch: a broader page is fetched and
    /// filtered client-side, with pagination recomputed from the
    /// filtered subset rather than trusted from the upstream page info.
    #[instrument(skip(self), fields(page = query.page, sort = %query.sort))]
    async fn get_all(&self, query: ProductQuery) -> Result<Page<Product>, ApiError> {
        let query = query.normalized();
        let document = queries::products_query(queries::sort_argument(query.sort));

        let mut filter = serde_json::Map::new();
        let mut price = serde_json::Map::new();
        if let Some(min) = query.price_min {
            price.insert("from".to_owned(), json!(min.to_string()));
        }
        if let Some(max) = query.price_max {
            price.insert("to".to_owned(), json!(max.to_string()));
        }
        if !price.is_empty() {
            filter.insert("price".to_owned(), serde_json::Value::Object(price));
        }

        let needs_post_filter =
            query.category_slug.is_some() || query.brand_slug.is_some() || query.in_stock_only;
        let (page, page_size) = if needs_post_filter {
            (1, POST_FILTER_FETCH_SIZE)
        } else {
            (query.page, query.page_size)
        };

        let variables = json!({
            "search": query.search,
            "filter": filter,
            "pageSize": page_size,
            "currentPage": page,
        });
        let token = self.token().await;
        let data: ProductsData = self
            .inner
            .client
            .execute(&document, variables, token.as_deref())
            .await
            .map_err(ApiError::from)?;
        let products = data.products.unwrap_or_default();

        if !needs_post_filter {
            return Ok(convert_product_page(&products, query.page, query.page_size));
        }

        let fetched = convert_product_page(&products, 1, POST_FILTER_FETCH_SIZE);
        let filtered: Vec<Product> = fetched
            .items
            .into_iter()
            .filter(|p| match query.category_slug.as_deref() {
                Some(slug) => p.categories.iter().any(|c| c.slug == slug),
                None => true,
            })
            .filter(|p| match query.brand_slug.as_deref() {
                Some(slug) => p.brand.slug == slug,
                None => true,
            })
            .filter(|p| !query.in_stock_only || p.stock.in_stock)
            .collect();
        debug!(matched = filtered.len(), "client-side post-filter applied");
        Ok(Page::slice(filtered, query.page, query.page_size))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, ApiError> {
        let token = self.token().await;
        let data: ProductsData = self
            .inner
            .client
            .execute(
                &queries::product_by_slug_query(),
                json!({ "slug": slug }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Ok(data
            .products
            .and_then(|p| p.items)
            .into_iter()
            .flatten()
            .flatten()
            .next()
            .map(|node| convert_product(&node)))
    }

    /// On this backend the product id callers hold is the sku.
    async fn get_by_id(&self, product_id: &str) -> Result<Option<Product>, ApiError> {
        let token = self.token().await;
        let data: ProductsData = self
            .inner
            .client
            .execute(
                &queries::product_by_sku_query(),
                json!({ "sku": product_id }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Ok(data
            .products
            .and_then(|p| p.items)
            .into_iter()
            .flatten()
            .flatten()
            .next()
            .map(|node| convert_product(&node)))
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

    /// Magento has no featured flag; the default position ordering of
    /// the full listing stands in for it.
    async fn get_featured(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = if limit == 0 { DEFAULT_FEATURED_LIMIT } else { limit };
        let document = queries::products_query(queries::sort_argument(ProductSort::Relevance));
        let token = self.token().await;
        let data: ProductsData = self
            .inner
            .client
            .execute(
                &document,
                json!({
                    "search": serde_json::Value::Null,
                    "filter": {},
                    "pageSize": limit,
                    "currentPage": 1,
                }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Ok(data
            .products
            .and_then(|p| p.items)
            .into_iter()
            .flatten()
            .flatten()
            .map(|node| convert_product(&node))
            .collect())
    }

    /// Category-based relatedness: products sharing the product's first
    /// category, excluding the product itself.
    async fn get_related(
        &self,
        product_id: &str,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        let limit = if limit == 0 { DEFAULT_RELATED_LIMIT } else { limit };
        let Some(product) = ProductsApi::get_by_id(self, product_id).await? else {
            return Ok(Vec::new());
        };
        let Some(category) = product.categories.first() else {
            return Ok(Vec::new());
        };

        let page = ProductsApi::get_all(
            self,
            ProductQuery {
                category_slug: Some(category.slug.clone()),
                page_size: limit + 1,
                ..ProductQuery::default()
            },
        )
        .await?;
        Ok(page
            .items
            .into_iter()
            .filter(|p| p.id != product.id)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl CategoriesApi for MagentoProvider {
    async fn get_all(&self) -> Result<Vec<Category>, ApiError> {
        let tree = self.get_tree().await?;
        Ok(tree.iter().cloned().collect())
    }

    async fn get_tree(&self) -> Result<CategoryTree, ApiError> {
        let data: CategoriesData = self
            .inner
            .client
            .execute(queries::CATEGORIES_QUERY, json!({}), None)
            .await
            .map_err(ApiError::from)?;
        Ok(convert_category_tree(&data))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError> {
        let tree = self.get_tree().await?;
        Ok(tree.get_by_slug(slug).cloned())
    }

    async fn get_by_id(&self, category_id: &str) -> Result<Option<Category>, ApiError> {
        let tree = self.get_tree().await?;
        Ok(tree.get(category_id).cloned())
    }
}

#[async_trait]
impl BrandsApi for MagentoProvider {
    /// Magento has no native brand entity; the brand facet only exists
    /// as a product attribute. Listing brands is therefore unsupported,
    /// which is distinct from an empty result.
    async fn get_all(&self) -> Result<Vec<Brand>, ApiError> {
        Err(ApiError::unsupported("magento", "brands.get_all"))
    }

    async fn get_by_slug(&self, _slug: &str) -> Result<Option<Brand>, ApiError> {
        Err(ApiError::unsupported("magento", "brands.get_by_slug"))
    }

    async fn get_by_id(&self, _brand_id: &str) -> Result<Option<Brand>, ApiError> {
        Err(ApiError::unsupported("magento", "brands.get_by_id"))
    }
}

#[async_trait]
impl CartApi for MagentoProvider {
    async fn get(&self) -> Result<Cart, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        match self.fetch_cart(&cart_id, token.as_deref()).await {
            // A stale persisted id (expired or ordered-out cart) is
            // replaced with a fresh cart instead of surfacing.
            Err(ApiError::NotFound(_)) => {
                warn!(cart_id = %cart_id, "stored cart id is stale, bootstrapping a new cart");
                self.drop_cart_id().await;
                let (fresh_id, token) = self.ensure_cart().await?;
                self.fetch_cart(&fresh_id, token.as_deref()).await
            }
            other => other,
        }
    }

    #[instrument(skip(self), fields(product_id = %input.product_id, quantity = input.quantity))]
    async fn add_item(&self, input: AddItemInput) -> Result<Cart, ApiError> {
        input.validate()?;
        let (cart_id, token) = self.ensure_cart().await?;
        // Magento addresses cart lines by sku; on this backend the
        // product identifier callers hold is the sku.
        let data: AddToCartData = self
            .inner
            .client
            .execute(
                &queries::add_to_cart_mutation(),
                json!({
                    "cartId": cart_id,
                    "items": [{ "sku": input.product_id, "quantity": input.quantity }],
                }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Self::unwrap_cart_wrapper(data.add_products_to_cart, &cart_id)
    }

    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        // Zero quantity means "take the line out", matching the mock.
        if quantity == 0 {
            return self.remove_item(item_id).await;
        }
        let (cart_id, token) = self.ensure_cart().await?;
        let data: UpdateCartItemsData = self
            .inner
            .client
            .execute(
                &queries::update_cart_items_mutation(),
                json!({
                    "cartId": cart_id,
                    "items": [{ "cart_item_uid": item_id, "quantity": quantity }],
                }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Self::unwrap_cart_wrapper(data.update_cart_items, &cart_id)
    }

    async fn remove_item(&self, item_id: &str) -> Result<Cart, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let data: RemoveItemData = self
            .inner
            .client
            .execute(
                &queries::remove_cart_item_mutation(),
                json!({ "cartId": cart_id, "itemUid": item_id }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Self::unwrap_cart_wrapper(data.remove_item_from_cart, &cart_id)
    }

    async fn apply_coupon(&self, code: &str) -> Result<Cart, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let data: ApplyCouponData = self
            .inner
            .client
            .execute(
                &queries::apply_coupon_mutation(),
                json!({ "cartId": cart_id, "code": code }),
                token.as_deref(),
            )
            .await
            .map_err(|error| match error {
                // Magento rejects unknown/expired coupons as a GraphQL
                // error; surface that as a conflict, not upstream noise.
                MagentoError::Graphql(entries) => ApiError::Conflict(
                    entries
                        .first()
                        .map_or_else(|| format!("coupon `{code}` rejected"), |e| e.message.clone()),
                ),
                other => other.into(),
            })?;
        Self::unwrap_cart_wrapper(data.apply_coupon_to_cart, &cart_id)
    }

    async fn remove_coupon(&self) -> Result<Cart, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let data: RemoveCouponData = self
            .inner
            .client
            .execute(
                &queries::remove_coupon_mutation(),
                json!({ "cartId": cart_id }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Self::unwrap_cart_wrapper(data.remove_coupon_from_cart, &cart_id)
    }

    /// Magento has no empty-cart mutation, so clearing abandons the
    /// current cart id and bootstraps a fresh one.
    async fn clear(&self) -> Result<Cart, ApiError> {
        self.drop_cart_id().await;
        self.get().await
    }

    #[instrument(skip(self))]
    async fn merge(&self, guest_cart_id: &str) -> Result<Cart, ApiError> {
        let (destination, token) = self.ensure_cart().await?;
        if guest_cart_id == destination {
            return self.get().await;
        }
        let data: MergeCartsData = self
            .inner
            .client
            .execute(
                queries::MERGE_CARTS_MUTATION,
                json!({ "source": guest_cart_id, "destination": destination }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        if let Some(merged_id) = data.merge_carts.and_then(|c| c.id) {
            self.inner.session.lock().await.cart_id = Some(merged_id.clone());
            self.inner.cart_id_slot.save(&merged_id);
        }
        self.get().await
    }
}

#[async_trait]
impl AuthApi for MagentoProvider {
    /// Login, then merge any guest cart into the customer cart exactly
    /// once. Merge failure is logged and does not fail the login.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: Credentials) -> Result<AuthResponse, ApiError> {
        let data: GenerateTokenData = self
            .inner
            .client
            .execute(
                queries::GENERATE_TOKEN_MUTATION,
                json!({ "email": credentials.email, "password": credentials.password }),
                None,
            )
            .await
            .map_err(|error| match error {
                // Uniform message regardless of which credential failed.
                MagentoError::Graphql(_) => ApiError::invalid_credentials(),
                other => other.into(),
            })?;
        let token = data
            .generate_customer_token
            .and_then(|t| t.token)
            .ok_or_else(ApiError::invalid_credentials)?;

        let mut session = self.inner.session.lock().await;
        let guest_cart_id = session.cart_id.clone();
        session.token = Some(token.clone());
        self.inner.token_slot.save(&token);

        match self
            .inner
            .client
            .execute::<CustomerCartData>(queries::CUSTOMER_CART_QUERY, json!({}), Some(&token))
            .await
        {
            Ok(data) => {
                if let Some(customer_cart_id) = data.customer_cart.and_then(|c| c.id) {
                    if let Some(guest_id) =
                        guest_cart_id.filter(|g| *g != customer_cart_id)
                    {
                        if let Err(merge_error) = self
                            .inner
                            .client
                            .execute::<MergeCartsData>(
                                queries::MERGE_CARTS_MUTATION,
                                json!({ "source": guest_id, "destination": customer_cart_id }),
                                Some(&token),
                            )
                            .await
                        {
                            error!(%merge_error, "guest cart merge failed; keeping customer cart");
                        }
                    }
                    session.cart_id = Some(customer_cart_id.clone());
                    self.inner.cart_id_slot.save(&customer_cart_id);
                }
            }
            Err(cart_error) => {
                warn!(%cart_error, "customer cart resolution failed after login");
            }
        }
        drop(session);

        let user = self.fetch_customer(&token).await?;
        debug!(user_id = %user.id, "magento login");
        Ok(AuthResponse {
            user,
            access_token: Some(token),
            expires_at: None,
        })
    }

    async fn register(&self, input: RegisterInput) -> Result<AuthResponse, ApiError> {
        let credentials = Credentials {
            email: input.email.clone(),
            password: input.password.clone(),
        };
        let _created: CreateCustomerData = self
            .inner
            .client
            .execute(
                &queries::create_customer_mutation(),
                json!({ "input": {
                    "firstname": input.first_name,
                    "lastname": input.last_name,
                    "email": input.email,
                    "password": input.password,
                }}),
                None,
            )
            .await
            .map_err(ApiError::from)?;

        // Establish the session (and run the cart merge) via the
        // regular login path.
        self.login(credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let token = self.token().await;
        if let Some(token) = token {
            if let Err(revoke_error) = self
                .inner
                .client
                .execute::<RevokeTokenData>(queries::REVOKE_TOKEN_MUTATION, json!({}), Some(&token))
                .await
            {
                warn!(%revoke_error, "token revocation failed; clearing local session anyway");
            }
        }

        let mut session = self.inner.session.lock().await;
        session.token = None;
        session.cart_id = None;
        self.inner.token_slot.clear();
        self.inner.cart_id_slot.clear();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let Some(token) = self.token().await else {
            return Ok(None);
        };
        match self.fetch_customer(&token).await {
            Ok(user) => Ok(Some(user)),
            // An expired token reads as logged out, not as an error.
            Err(ApiError::Authentication(_)) => {
                self.inner.session.lock().await.token = None;
                self.inner.token_slot.clear();
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ApiError> {
        let token = self.require_token().await?;
        if update.is_empty() {
            return self.fetch_customer(&token).await;
        }
        let mut input = serde_json::Map::new();
        if let Some(first_name) = update.first_name {
            input.insert("firstname".to_owned(), json!(first_name));
        }
        if let Some(last_name) = update.last_name {
            input.insert("lastname".to_owned(), json!(last_name));
        }
        let data: UpdateCustomerData = self
            .inner
            .client
            .execute(
                &queries::update_customer_mutation(),
                json!({ "input": input }),
                Some(&token),
            )
            .await
            .map_err(ApiError::from)?;
        data.update_customer
            .and_then(|w| w.customer)
            .map(|node| convert_customer(&node))
            .ok_or_else(|| ApiError::Upstream("profile update returned no customer".to_owned()))
    }

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let token = self.require_token().await?;
        let _data: ChangePasswordData = self
            .inner
            .client
            .execute(
                queries::CHANGE_PASSWORD_MUTATION,
                json!({ "currentPassword": current_password, "newPassword": new_password }),
                Some(&token),
            )
            .await
            .map_err(|error| match error {
                MagentoError::Graphql(entries) => ApiError::Authentication(
                    entries.first().map_or_else(
                        || "password change rejected".to_owned(),
                        |e| e.message.clone(),
                    ),
                ),
                other => other.into(),
            })?;
        Ok(())
    }

    /// Always succeeds for well-formed emails so callers cannot probe
    /// which addresses have accounts.
    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        if !email.contains('@') {
            return Err(ApiError::Validation("a valid email is required".to_owned()));
        }
        match self
            .inner
            .client
            .execute::<RequestPasswordResetData>(
                queries::REQUEST_PASSWORD_RESET_MUTATION,
                json!({ "email": email }),
                None,
            )
            .await
        {
            Ok(_) | Err(MagentoError::Graphql(_)) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    /// Magento's reset mutation also needs the account email, which the
    /// emailed link carries but this call does not.
    async fn reset_password(&self, _token: &str, _new_password: &str) -> Result<(), ApiError> {
        Err(ApiError::Validation(
            "password reset must be completed through the emailed reset link".to_owned(),
        ))
    }

    async fn add_address(&self, address: Address) -> Result<Address, ApiError> {
        let token = self.require_token().await?;
        let data: CreateAddressData = self
            .inner
            .client
            .execute(
                &queries::create_address_mutation(),
                json!({ "input": address_book_input(&address) }),
                Some(&token),
            )
            .await
            .map_err(ApiError::from)?;
        data.create_customer_address
            .map(|node| convert_address(&node))
            .ok_or_else(|| ApiError::Upstream("address creation returned no address".to_owned()))
    }

    async fn update_address(&self, address_id: &str, address: Address) -> Result<Address, ApiError> {
        let token = self.require_token().await?;
        let id = Self::numeric_address_id(address_id)?;
        let data: UpdateAddressData = self
            .inner
            .client
            .execute(
                &queries::update_address_mutation(),
                json!({ "id": id, "input": address_book_input(&address) }),
                Some(&token),
            )
            .await
            .map_err(ApiError::from)?;
        data.update_customer_address
            .map(|node| convert_address(&node))
            .ok_or_else(|| ApiError::NotFound(format!("address `{address_id}`")))
    }

    async fn delete_address(&self, address_id: &str) -> Result<(), ApiError> {
        let token = self.require_token().await?;
        let id = Self::numeric_address_id(address_id)?;
        let data: DeleteAddressData = self
            .inner
            .client
            .execute(
                queries::DELETE_ADDRESS_MUTATION,
                json!({ "id": id }),
                Some(&token),
            )
            .await
            .map_err(ApiError::from)?;
        if data.delete_customer_address == Some(true) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("address `{address_id}`")))
        }
    }

    /// Magento tokens cannot be rotated without credentials, so a
    /// refresh revalidates the stored token against the customer query.
    async fn refresh_token(&self) -> Result<AuthResponse, ApiError> {
        let token = self.require_token().await?;
        let user = self.fetch_customer(&token).await?;
        Ok(AuthResponse {
            user,
            access_token: Some(token),
            expires_at: None,
        })
    }
}

#[async_trait]
impl CheckoutApi for MagentoProvider {
    async fn create_session(&self) -> Result<CheckoutSession, ApiError> {
        let cart = self.get().await?;
        let session = CheckoutSession::new(&format!("chk-{}", Uuid::new_v4()), cart);
        let mut checkouts = self
            .inner
            .checkouts
            .lock()
            .map_err(|_| ApiError::Upstream("checkout state lock poisoned".to_owned()))?;
        checkouts.insert(
            session.id.clone(),
            CheckoutProgress {
                session: session.clone(),
                available_shipping: Vec::new(),
            },
        );
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
        let (cart_id, token) = self.ensure_cart().await?;
        // Customer carts already carry the account email.
        if token.is_none() {
            let _ack: serde_json::Value = self
                .inner
                .client
                .execute(
                    queries::SET_GUEST_EMAIL_MUTATION,
                    json!({ "cartId": cart_id, "email": email }),
                    None,
                )
                .await
                .map_err(ApiError::from)?;
        }
        self.with_checkout(session_id, |progress| {
            progress.session.email = Some(email.to_owned());
            progress.session.advance_to(CheckoutStep::Shipping);
            progress.session.clone()
        })
    }

    async fn set_shipping_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let data: SetShippingAddressData = self
            .inner
            .client
            .execute(
                queries::SET_SHIPPING_ADDRESS_MUTATION,
                json!({ "cartId": cart_id, "address": address_to_input(&address) }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;

        let options = data
            .set_shipping_addresses_on_cart
            .and_then(|w| w.cart)
            .and_then(|c| c.shipping_addresses)
            .into_iter()
            .flatten()
            .find_map(|a| a.available_shipping_methods)
            .map(|methods| convert_shipping_options(&methods))
            .unwrap_or_default();

        self.with_checkout(session_id, |progress| {
            progress.session.shipping_address = Some(address);
            progress.session.advance_to(CheckoutStep::Shipping);
            progress.available_shipping = options;
            progress.session.clone()
        })
    }

    async fn set_billing_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let _ack: serde_json::Value = self
            .inner
            .client
            .execute(
                queries::SET_BILLING_ADDRESS_MUTATION,
                json!({ "cartId": cart_id, "address": address_to_input(&address) }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        self.with_checkout(session_id, |progress| {
            progress.session.billing_address = Some(address);
            progress.session.clone()
        })
    }

    async fn shipping_methods(&self, session_id: &str) -> Result<Vec<ShippingMethod>, ApiError> {
        let options = self.with_checkout(session_id, |p| p.available_shipping.clone())?;
        if options.is_empty() {
            return Err(ApiError::Validation(
                "a shipping address must be set before listing methods".to_owned(),
            ));
        }
        Ok(options)
    }

    async fn set_shipping_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        let Some((carrier, method)) = code.split_once(':') else {
            return Err(ApiError::Validation(format!(
                "shipping method codes are `carrier:method`, got `{code}`"
            )));
        };
        let (cart_id, token) = self.ensure_cart().await?;
        let _ack: serde_json::Value = self
            .inner
            .client
            .execute(
                queries::SET_SHIPPING_METHOD_MUTATION,
                json!({ "cartId": cart_id, "carrier": carrier, "method": method }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;

        self.with_checkout(session_id, |progress| {
            let chosen = progress
                .available_shipping
                .iter()
                .find(|m| m.code == code)
                .cloned()
                .unwrap_or_else(|| ShippingMethod {
                    code: code.to_owned(),
                    label: code.to_owned(),
                    price: dermastore_core::Price::zero(DEFAULT_CURRENCY),
                });
            progress.session.shipping_method = Some(chosen);
            progress.session.advance_to(CheckoutStep::Payment);
            progress.session.clone()
        })
    }

    async fn payment_methods(&self, session_id: &str) -> Result<Vec<PaymentMethod>, ApiError> {
        self.with_checkout(session_id, |_| ())?;
        let (cart_id, token) = self.ensure_cart().await?;
        let data: PaymentMethodsData = self
            .inner
            .client
            .execute(
                queries::AVAILABLE_PAYMENT_METHODS_QUERY,
                json!({ "cartId": cart_id }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        Ok(data
            .cart
            .and_then(|c| c.available_payment_methods)
            .map(|methods| convert_payment_options(&methods))
            .unwrap_or_default())
    }

    async fn set_payment_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError> {
        let (cart_id, token) = self.ensure_cart().await?;
        let _ack: serde_json::Value = self
            .inner
            .client
            .execute(
                queries::SET_PAYMENT_METHOD_MUTATION,
                json!({ "cartId": cart_id, "code": code }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        self.with_checkout(session_id, |progress| {
            progress.session.payment_method = Some(PaymentMethod {
                code: code.to_owned(),
                label: code.to_owned(),
            });
            progress.session.advance_to(CheckoutStep::Review);
            progress.session.clone()
        })
    }

    #[instrument(skip(self))]
    async fn place_order(&self, session_id: &str) -> Result<PlaceOrderResult, ApiError> {
        let session = self.with_checkout(session_id, |p| p.session.clone())?;
        if session.step < CheckoutStep::Review {
            return Err(ApiError::Validation(
                "checkout is incomplete; shipping and payment must be chosen first".to_owned(),
            ));
        }

        let cart = self.get().await?;
        if cart.is_empty() {
            return Err(ApiError::Validation(
                "cannot place an order for an empty cart".to_owned(),
            ));
        }

        let (cart_id, token) = self.ensure_cart().await?;
        let data: PlaceOrderData = self
            .inner
            .client
            .execute(
                queries::PLACE_ORDER_MUTATION,
                json!({ "cartId": cart_id }),
                token.as_deref(),
            )
            .await
            .map_err(ApiError::from)?;
        let number = data
            .place_order
            .and_then(|p| p.order)
            .and_then(|o| o.order_number)
            .ok_or_else(|| ApiError::Upstream("order placement returned no number".to_owned()))?;

        // Magento deactivates the ordered cart; a fresh one is
        // bootstrapped lazily on next cart access.
        self.drop_cart_id().await;
        if let Ok(mut checkouts) = self.inner.checkouts.lock() {
            checkouts.remove(session_id);
        }

        let order = Order {
            id: number.clone(),
            number,
            status: OrderStatus::Pending,
            items: cart
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
            shipping_address: session.shipping_address,
            billing_address: session.billing_address,
            shipping_method: session.shipping_method.map(|m| m.label),
            payment_method: session.payment_method.map(|m| m.label),
            totals: cart.totals,
            created_at: Utc::now(),
        };
        debug!(order_number = %order.number, "magento order placed");
        Ok(PlaceOrderResult {
            order,
            redirect_url: None,
        })
    }
}

#[async_trait]
impl OrdersApi for MagentoProvider {
    async fn get_all(&self, page: u32, page_size: u32) -> Result<Page<Order>, ApiError> {
        let token = self.require_token().await?;
        let page = page.max(1);
        let page_size = if page_size == 0 {
            ORDERS_PAGE_SIZE
        } else {
            page_size
        };
        let data: CustomerOrdersData = self
            .inner
            .client
            .execute(
                queries::CUSTOMER_ORDERS_QUERY,
                json!({ "pageSize": page_size, "currentPage": page }),
                Some(&token),
            )
            .await
            .map_err(ApiError::from)?;
        let orders = data.customer.and_then(|c| c.orders);
        let total_count = orders.as_ref().and_then(|o| o.total_count);
        let items: Vec<Order> = orders
            .and_then(|o| o.items)
            .into_iter()
            .flatten()
            .flatten()
            .map(|node| convert_order(&node))
            .collect();
        #[allow(clippy::cast_possible_truncation)]
        let total_items =
            total_count.unwrap_or_else(|| items.len().min(u32::MAX as usize) as u32);
        Ok(Page::new(items, page, page_size, total_items))
    }

    async fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError> {
        let orders = OrdersApi::get_all(self, 1, ORDERS_PAGE_SIZE).await?;
        Ok(orders
            .items
            .into_iter()
            .find(|o| o.id == order_id || o.number == order_id))
    }

    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, ApiError> {
        let orders = OrdersApi::get_all(self, 1, ORDERS_PAGE_SIZE).await?;
        Ok(orders.items.into_iter().find(|o| o.number == number))
    }

    /// Magento's storefront API has no cancellation mutation.
    async fn cancel(&self, _order_id: &str) -> Result<Order, ApiError> {
        Err(ApiError::unsupported("magento", "orders.cancel"))
    }

    /// Returns go through Magento's RMA admin flow, which the
    /// storefront API does not expose.
    async fn request_return(
        &self,
        _order_id: &str,
        _items: Vec<ReturnRequestItem>,
    ) -> Result<(), ApiError> {
        Err(ApiError::unsupported("magento", "orders.request_return"))
    }
}

impl ApiProvider for MagentoProvider {
    fn name(&self) -> &'static str {
        "magento"
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
