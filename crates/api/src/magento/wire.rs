//! Serde shapes for Magento GraphQL responses.
//!
//! Every field is optional. Catalog data served by a third-party
//! backend cannot be assumed complete, so the conversion layer owns all
//! defaulting; these structs only mirror the JSON.

use serde::Deserialize;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductsData {
    pub products: Option<WireProducts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireProducts {
    pub total_count: Option<u32>,
    pub page_info: Option<WirePageInfo>,
    pub items: Option<Vec<Option<WireProduct>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePageInfo {
    pub current_page: Option<u32>,
    pub page_size: Option<u32>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireProduct {
    pub uid: Option<String>,
    pub sku: Option<String>,
    pub url_key: Option<String>,
    pub name: Option<String>,
    pub description: Option<WireHtml>,
    pub short_description: Option<WireHtml>,
    pub created_at: Option<String>,
    pub stock_status: Option<String>,
    pub only_x_left_in_stock: Option<f64>,
    pub rating_summary: Option<f64>,
    pub review_count: Option<u32>,
    pub price_range: Option<WirePriceRange>,
    pub media_gallery: Option<Vec<WireMediaEntry>>,
    pub thumbnail: Option<WireImage>,
    pub categories: Option<Vec<WireCategoryRef>>,
    pub custom_attributes: Option<Vec<WireCustomAttribute>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireHtml {
    pub html: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePriceRange {
    pub minimum_price: Option<WirePriceSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePriceSet {
    pub regular_price: Option<WireMoney>,
    pub final_price: Option<WireMoney>,
    pub discount: Option<WireDiscount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMoney {
    pub value: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireDiscount {
    pub amount_off: Option<f64>,
    pub percent_off: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireMediaEntry {
    pub url: Option<String>,
    pub label: Option<String>,
    pub position: Option<i64>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireImage {
    pub url: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCategoryRef {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub url_key: Option<String>,
    pub url_path: Option<String>,
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCustomAttribute {
    pub code: Option<String>,
    pub value: Option<String>,
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoriesData {
    pub categories: Option<WireCategoryList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCategoryList {
    pub items: Option<Vec<Option<WireCategory>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCategory {
    pub uid: Option<String>,
    pub name: Option<String>,
    pub url_key: Option<String>,
    pub url_path: Option<String>,
    pub level: Option<u32>,
    /// Slash-separated id path, e.g. `1/2/20`.
    pub path: Option<String>,
    pub product_count: Option<u32>,
    pub description: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CartData {
    pub cart: Option<WireCart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCart {
    pub id: Option<String>,
    pub total_quantity: Option<f64>,
    pub applied_coupons: Option<Vec<WireCoupon>>,
    pub items: Option<Vec<Option<WireCartItem>>>,
    pub prices: Option<WireCartPrices>,
    pub shipping_addresses: Option<Vec<WireShippingAddress>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCoupon {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCartItem {
    pub uid: Option<String>,
    pub quantity: Option<f64>,
    pub product: Option<WireProduct>,
    pub prices: Option<WireItemPrices>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireItemPrices {
    pub price: Option<WireMoney>,
    pub row_total: Option<WireMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCartPrices {
    pub subtotal_excluding_tax: Option<WireMoney>,
    pub grand_total: Option<WireMoney>,
    pub applied_taxes: Option<Vec<WireTax>>,
    pub discounts: Option<Vec<WireDiscountEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireTax {
    pub amount: Option<WireMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireDiscountEntry {
    pub amount: Option<WireMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireShippingAddress {
    pub selected_shipping_method: Option<WireSelectedMethod>,
    pub available_shipping_methods: Option<Vec<WireShippingOption>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireSelectedMethod {
    pub carrier_code: Option<String>,
    pub method_code: Option<String>,
    pub amount: Option<WireMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireShippingOption {
    pub carrier_code: Option<String>,
    pub method_code: Option<String>,
    pub method_title: Option<String>,
    pub amount: Option<WireMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCartWrapper {
    pub cart: Option<WireCart>,
    pub user_errors: Option<Vec<WireUserError>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireUserError {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCartId {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateEmptyCartData {
    #[serde(rename = "createEmptyCart")]
    pub create_empty_cart: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerCartData {
    #[serde(rename = "customerCart")]
    pub customer_cart: Option<WireCartId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddToCartData {
    #[serde(rename = "addProductsToCart")]
    pub add_products_to_cart: Option<WireCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCartItemsData {
    #[serde(rename = "updateCartItems")]
    pub update_cart_items: Option<WireCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoveItemData {
    #[serde(rename = "removeItemFromCart")]
    pub remove_item_from_cart: Option<WireCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplyCouponData {
    #[serde(rename = "applyCouponToCart")]
    pub apply_coupon_to_cart: Option<WireCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoveCouponData {
    #[serde(rename = "removeCouponFromCart")]
    pub remove_coupon_from_cart: Option<WireCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeCartsData {
    #[serde(rename = "mergeCarts")]
    pub merge_carts: Option<WireCartId>,
}

// =============================================================================
// Customers / auth
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateTokenData {
    #[serde(rename = "generateCustomerToken")]
    pub generate_customer_token: Option<WireToken>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireToken {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevokeTokenData {
    #[serde(rename = "revokeCustomerToken")]
    pub revoke_customer_token: Option<WireRevokeResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireRevokeResult {
    pub result: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerData {
    pub customer: Option<WireCustomer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateCustomerData {
    #[serde(rename = "createCustomerV2")]
    pub create_customer: Option<WireCustomerWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCustomerWrapper {
    pub customer: Option<WireCustomer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCustomer {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub created_at: Option<String>,
    pub addresses: Option<Vec<WireAddress>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireAddress {
    pub id: Option<i64>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub street: Option<Vec<String>>,
    pub city: Option<String>,
    pub region: Option<WireRegion>,
    pub postcode: Option<String>,
    pub country_code: Option<String>,
    pub telephone: Option<String>,
    pub default_shipping: Option<bool>,
    pub default_billing: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireRegion {
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCustomerData {
    #[serde(rename = "updateCustomerV2")]
    pub update_customer: Option<WireCustomerWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordData {
    #[serde(rename = "changeCustomerPassword")]
    pub change_customer_password: Option<WireCustomer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RequestPasswordResetData {
    #[serde(rename = "requestPasswordResetEmail")]
    pub request_password_reset_email: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAddressData {
    #[serde(rename = "createCustomerAddress")]
    pub create_customer_address: Option<WireAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAddressData {
    #[serde(rename = "updateCustomerAddress")]
    pub update_customer_address: Option<WireAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAddressData {
    #[serde(rename = "deleteCustomerAddress")]
    pub delete_customer_address: Option<bool>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerOrdersData {
    pub customer: Option<WireCustomerOrders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCustomerOrders {
    pub orders: Option<WireOrders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireOrders {
    pub total_count: Option<u32>,
    pub page_info: Option<WirePageInfo>,
    pub items: Option<Vec<Option<WireOrder>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireOrder {
    pub id: Option<String>,
    pub number: Option<String>,
    pub order_date: Option<String>,
    pub status: Option<String>,
    pub payment_methods: Option<Vec<WirePaymentMethodName>>,
    pub shipping_method: Option<String>,
    pub total: Option<WireOrderTotal>,
    pub items: Option<Vec<Option<WireOrderItem>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePaymentMethodName {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireOrderTotal {
    pub subtotal: Option<WireMoney>,
    pub grand_total: Option<WireMoney>,
    pub total_shipping: Option<WireMoney>,
    pub total_tax: Option<WireMoney>,
    pub discounts: Option<Vec<WireDiscountEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireOrderItem {
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub product_url_key: Option<String>,
    pub quantity_ordered: Option<f64>,
    pub product_sale_price: Option<WireMoney>,
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetShippingAddressData {
    #[serde(rename = "setShippingAddressesOnCart")]
    pub set_shipping_addresses_on_cart: Option<WireShippingCartWrapper>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireShippingCartWrapper {
    pub cart: Option<WireShippingCart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireShippingCart {
    pub shipping_addresses: Option<Vec<WireShippingAddress>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentMethodsData {
    pub cart: Option<WireCartPayments>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireCartPayments {
    pub available_payment_methods: Option<Vec<WirePaymentOption>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePaymentOption {
    pub code: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderData {
    #[serde(rename = "placeOrder")]
    pub place_order: Option<WirePlacedOrder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WirePlacedOrder {
    pub order: Option<WireOrderNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireOrderNumber {
    pub order_number: Option<String>,
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfigData {
    #[serde(rename = "storeConfig")]
    pub store_config: Option<WireStoreConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireStoreConfig {
    pub store_code: Option<String>,
}
