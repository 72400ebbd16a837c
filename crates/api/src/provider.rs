//! The unified provider contract.
//!
//! Every backend implements all seven surfaces completely. A backend
//! without a native capability fails loudly with
//! [`ApiError::Unsupported`] so callers can distinguish "zero results"
//! from "unavailable on this backend".
//!
//! Read-by-identifier operations return `Ok(None)` for absent
//! entities; they never use the error channel for "not found".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dermastore_core::{
    Address, ApiError, AuthResponse, Brand, Cart, Category, CategoryTree, CheckoutSession,
    Credentials, Order, Page, PaymentMethod, PlaceOrderResult, Product, ProductQuery,
    ProfileUpdate, RegisterInput, ReturnRequestItem, ShippingMethod, User,
};

/// Default listing size for [`ProductsApi::get_featured`].
pub const DEFAULT_FEATURED_LIMIT: u32 = 8;

/// Default listing size for [`ProductsApi::get_related`].
pub const DEFAULT_RELATED_LIMIT: u32 = 4;

/// Input for adding a product to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemInput {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub quantity: u32,
}

impl AddItemInput {
    /// Rejects zero quantities before any backend call is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the quantity is zero.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.quantity == 0 {
            return Err(ApiError::Validation(
                "quantity must be a positive integer".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Product catalog reads.
#[async_trait]
pub trait ProductsApi: Send + Sync {
    /// Paginated, filtered, sorted product listing.
    async fn get_all(&self, query: ProductQuery) -> Result<Page<Product>, ApiError>;

    /// Product by routable slug; `Ok(None)` when absent.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, ApiError>;

    /// Product by stable id; `Ok(None)` when absent.
    async fn get_by_id(&self, product_id: &str) -> Result<Option<Product>, ApiError>;

    /// Full-text search; the other query facets still apply.
    async fn search(&self, term: &str, query: ProductQuery) -> Result<Page<Product>, ApiError>;

    /// Listing scoped to a category subtree.
    async fn get_by_category(
        &self,
        category_slug: &str,
        query: ProductQuery,
    ) -> Result<Page<Product>, ApiError>;

    /// Listing scoped to a brand.
    async fn get_by_brand(
        &self,
        brand_slug: &str,
        query: ProductQuery,
    ) -> Result<Page<Product>, ApiError>;

    /// Up to `limit` highlighted products for landing surfaces.
    async fn get_featured(&self, limit: u32) -> Result<Vec<Product>, ApiError>;

    /// Up to `limit` products related to `product_id`. An unknown
    /// product yields an empty list, not an error.
    async fn get_related(&self, product_id: &str, limit: u32)
    -> Result<Vec<Product>, ApiError>;
}

/// Category tree reads.
#[async_trait]
pub trait CategoriesApi: Send + Sync {
    /// Flat listing of every category.
    async fn get_all(&self) -> Result<Vec<Category>, ApiError>;

    async fn get_tree(&self) -> Result<CategoryTree, ApiError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, ApiError>;

    async fn get_by_id(&self, category_id: &str) -> Result<Option<Category>, ApiError>;
}

/// Brand reads.
#[async_trait]
pub trait BrandsApi: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Brand>, ApiError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Brand>, ApiError>;

    async fn get_by_id(&self, brand_id: &str) -> Result<Option<Brand>, ApiError>;
}

/// Cart reads and mutations.
///
/// Every mutation returns the full updated cart with invariants
/// re-established (line subtotals, item count, totals equation).
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get(&self) -> Result<Cart, ApiError>;

    /// Adds a product, merging into an existing `(product_id,
    /// variant_id)` line instead of duplicating it.
    async fn add_item(&self, input: AddItemInput) -> Result<Cart, ApiError>;

    /// Sets a line's quantity. A quantity of zero removes the line.
    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<Cart, ApiError>;

    async fn remove_item(&self, item_id: &str) -> Result<Cart, ApiError>;

    /// Empties the cart while keeping its identity.
    async fn clear(&self) -> Result<Cart, ApiError>;

    /// Applies a coupon code; unknown codes fail with
    /// [`ApiError::Conflict`] and leave totals unchanged.
    async fn apply_coupon(&self, code: &str) -> Result<Cart, ApiError>;

    async fn remove_coupon(&self) -> Result<Cart, ApiError>;

    /// Merges a guest cart into the active cart after login.
    async fn merge(&self, guest_cart_id: &str) -> Result<Cart, ApiError>;
}

/// Authentication and account access.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Verifies credentials. Failures never reveal whether the email
    /// exists.
    async fn login(&self, credentials: Credentials) -> Result<AuthResponse, ApiError>;

    async fn register(&self, input: RegisterInput) -> Result<AuthResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    /// The authenticated user, or `Ok(None)` when no session is active.
    async fn current_user(&self) -> Result<Option<User>, ApiError>;

    /// Applies a partial profile edit and returns the updated user.
    async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ApiError>;

    async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError>;

    /// Starts a password reset. Always succeeds for well-formed input;
    /// the response never reveals whether the email exists.
    async fn request_password_reset(&self, email: &str) -> Result<(), ApiError>;

    /// Completes a password reset with the token from the reset email.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError>;

    /// Adds an address to the signed-in user's address book and returns
    /// it with its assigned id.
    async fn add_address(&self, address: Address) -> Result<Address, ApiError>;

    /// Replaces the address with `address_id`; `NotFound` when absent.
    async fn update_address(&self, address_id: &str, address: Address)
    -> Result<Address, ApiError>;

    async fn delete_address(&self, address_id: &str) -> Result<(), ApiError>;

    /// Reissues the session token for the signed-in user.
    async fn refresh_token(&self) -> Result<AuthResponse, ApiError>;
}

/// The checkout step machine.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// Opens a session over the current cart.
    async fn create_session(&self) -> Result<CheckoutSession, ApiError>;

    async fn set_email(&self, session_id: &str, email: &str)
    -> Result<CheckoutSession, ApiError>;

    async fn set_shipping_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError>;

    async fn set_billing_address(
        &self,
        session_id: &str,
        address: Address,
    ) -> Result<CheckoutSession, ApiError>;

    async fn shipping_methods(&self, session_id: &str) -> Result<Vec<ShippingMethod>, ApiError>;

    async fn set_shipping_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError>;

    async fn payment_methods(&self, session_id: &str) -> Result<Vec<PaymentMethod>, ApiError>;

    async fn set_payment_method(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<CheckoutSession, ApiError>;

    /// Places the order. On success the underlying cart is emptied.
    async fn place_order(&self, session_id: &str) -> Result<PlaceOrderResult, ApiError>;
}

/// Order history.
#[async_trait]
pub trait OrdersApi: Send + Sync {
    /// Order history, most recent first. `page` is 1-based.
    async fn get_all(&self, page: u32, page_size: u32) -> Result<Page<Order>, ApiError>;

    async fn get_by_id(&self, order_id: &str) -> Result<Option<Order>, ApiError>;

    /// Order by its human-facing number; `Ok(None)` when absent.
    async fn get_by_number(&self, number: &str) -> Result<Option<Order>, ApiError>;

    /// Cancels an order. Cancelling an already-cancelled order is a
    /// no-op success.
    async fn cancel(&self, order_id: &str) -> Result<Order, ApiError>;

    /// Files a return request for delivered lines of an order.
    async fn request_return(
        &self,
        order_id: &str,
        items: Vec<ReturnRequestItem>,
    ) -> Result<(), ApiError>;
}

/// A complete backend: all seven surfaces behind one object.
pub trait ApiProvider: Send + Sync {
    /// Stable backend name, used in logs and unsupported-operation
    /// errors.
    fn name(&self) -> &'static str;

    fn products(&self) -> &dyn ProductsApi;
    fn categories(&self) -> &dyn CategoriesApi;
    fn brands(&self) -> &dyn BrandsApi;
    fn cart(&self) -> &dyn CartApi;
    fn auth(&self) -> &dyn AuthApi;
    fn checkout(&self) -> &dyn CheckoutApi;
    fn orders(&self) -> &dyn OrdersApi;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_is_rejected_before_any_call() {
        let input = AddItemInput {
            product_id: "p1".to_owned(),
            variant_id: None,
            quantity: 0,
        };
        assert!(matches!(input.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn positive_quantity_passes_validation() {
        let input = AddItemInput {
            product_id: "p1".to_owned(),
            variant_id: None,
            quantity: 3,
        };
        assert!(input.validate().is_ok());
    }
}
