//! Fixed GraphQL documents sent to Magento.
//!
//! Every provider call maps to exactly one of these documents plus a
//! variables object; nothing is built dynamically at runtime except the
//! `sort` argument of the product listing, which is interpolated from a
//! fixed enum translation.

pub const PRODUCT_FIELDS: &str = r"
    uid
    sku
    url_key
    name
    description { html }
    short_description { html }
    created_at
    stock_status
    only_x_left_in_stock
    rating_summary
    review_count
    price_range {
        minimum_price {
            regular_price { value currency }
            final_price { value currency }
            discount { amount_off percent_off }
        }
    }
    media_gallery { url label position disabled }
    thumbnail { url label }
    categories { uid name url_key url_path level }
    custom_attributes { code: attribute_code value }
";

pub fn products_query(sort_arg: &str) -> String {
    format!(
        r"query Products($search: String, $filter: ProductAttributeFilterInput, $pageSize: Int!, $currentPage: Int!) {{
            products(search: $search, filter: $filter, sort: {sort_arg}, pageSize: $pageSize, currentPage: $currentPage) {{
                total_count
                page_info {{ current_page page_size total_pages }}
                items {{ {PRODUCT_FIELDS} }}
            }}
        }}"
    )
}

pub fn product_by_sku_query() -> String {
    format!(
        r"query ProductBySku($sku: String!) {{
            products(filter: {{ sku: {{ eq: $sku }} }}, pageSize: 1, currentPage: 1) {{
                items {{ {PRODUCT_FIELDS} }}
            }}
        }}"
    )
}

pub fn product_by_slug_query() -> String {
    format!(
        r"query ProductBySlug($slug: String!) {{
            products(filter: {{ url_key: {{ eq: $slug }} }}, pageSize: 1, currentPage: 1) {{
                items {{ {PRODUCT_FIELDS} }}
            }}
        }}"
    )
}

pub const CATEGORIES_QUERY: &str = r"
    query Categories {
        categories(pageSize: 300) {
            items {
                uid
                name
                url_key
                url_path
                level
                path
                product_count
                description
            }
        }
    }
";

pub const CART_FIELDS: &str = r"
    id
    total_quantity
    applied_coupons { code }
    items {
        uid
        quantity
        product {
            uid
            sku
            url_key
            name
            thumbnail { url label }
            price_range {
                minimum_price {
                    regular_price { value currency }
                    final_price { value currency }
                    discount { amount_off percent_off }
                }
            }
        }
        prices {
            price { value currency }
            row_total { value currency }
        }
    }
    prices {
        subtotal_excluding_tax { value currency }
        grand_total { value currency }
        applied_taxes { amount { value currency } }
        discounts { amount { value currency } }
    }
    shipping_addresses {
        selected_shipping_method {
            carrier_code
            method_code
            amount { value currency }
        }
    }
";

pub fn cart_query() -> String {
    format!(
        r"query Cart($cartId: String!) {{
            cart(cart_id: $cartId) {{ {CART_FIELDS} }}
        }}"
    )
}

pub const CREATE_EMPTY_CART: &str = "mutation { createEmptyCart }";

pub const CUSTOMER_CART_QUERY: &str = r"query { customerCart { id } }";

pub fn add_to_cart_mutation() -> String {
    format!(
        r"mutation AddToCart($cartId: String!, $items: [CartItemInput!]!) {{
            addProductsToCart(cartId: $cartId, cartItems: $items) {{
                cart {{ {CART_FIELDS} }}
                user_errors {{ code message }}
            }}
        }}"
    )
}

pub fn update_cart_items_mutation() -> String {
    format!(
        r"mutation UpdateCartItems($cartId: String!, $items: [CartItemUpdateInput!]!) {{
            updateCartItems(input: {{ cart_id: $cartId, cart_items: $items }}) {{
                cart {{ {CART_FIELDS} }}
            }}
        }}"
    )
}

pub fn remove_cart_item_mutation() -> String {
    format!(
        r"mutation RemoveCartItem($cartId: String!, $itemUid: ID!) {{
            removeItemFromCart(input: {{ cart_id: $cartId, cart_item_uid: $itemUid }}) {{
                cart {{ {CART_FIELDS} }}
            }}
        }}"
    )
}

pub fn apply_coupon_mutation() -> String {
    format!(
        r"mutation ApplyCoupon($cartId: String!, $code: String!) {{
            applyCouponToCart(input: {{ cart_id: $cartId, coupon_code: $code }}) {{
                cart {{ {CART_FIELDS} }}
            }}
        }}"
    )
}

pub fn remove_coupon_mutation() -> String {
    format!(
        r"mutation RemoveCoupon($cartId: String!) {{
            removeCouponFromCart(input: {{ cart_id: $cartId }}) {{
                cart {{ {CART_FIELDS} }}
            }}
        }}"
    )
}

pub const MERGE_CARTS_MUTATION: &str = r"
    mutation MergeCarts($source: String!, $destination: String!) {
        mergeCarts(source_cart_id: $source, destination_cart_id: $destination) { id }
    }
";

pub const GENERATE_TOKEN_MUTATION: &str = r"
    mutation GenerateToken($email: String!, $password: String!) {
        generateCustomerToken(email: $email, password: $password) { token }
    }
";

pub const REVOKE_TOKEN_MUTATION: &str =
    "mutation { revokeCustomerToken { result } }";

pub const CUSTOMER_FIELDS: &str = r"
    email
    firstname
    lastname
    created_at
    addresses {
        id
        firstname
        lastname
        street
        city
        region { region }
        postcode
        country_code
        telephone
        default_shipping
        default_billing
    }
";

pub fn customer_query() -> String {
    format!(r"query {{ customer {{ {CUSTOMER_FIELDS} }} }}")
}

pub fn create_customer_mutation() -> String {
    format!(
        r"mutation CreateCustomer($input: CustomerCreateInput!) {{
            createCustomerV2(input: $input) {{
                customer {{ {CUSTOMER_FIELDS} }}
            }}
        }}"
    )
}

pub fn update_customer_mutation() -> String {
    format!(
        r"mutation UpdateCustomer($input: CustomerUpdateInput!) {{
            updateCustomerV2(input: $input) {{
                customer {{ {CUSTOMER_FIELDS} }}
            }}
        }}"
    )
}

pub const CHANGE_PASSWORD_MUTATION: &str = r"
    mutation ChangePassword($currentPassword: String!, $newPassword: String!) {
        changeCustomerPassword(currentPassword: $currentPassword, newPassword: $newPassword) {
            email
        }
    }
";

pub const REQUEST_PASSWORD_RESET_MUTATION: &str = r"
    mutation RequestPasswordReset($email: String!) {
        requestPasswordResetEmail(email: $email)
    }
";

pub const ADDRESS_FIELDS: &str = r"
    id
    firstname
    lastname
    street
    city
    region { region }
    postcode
    country_code
    telephone
    default_shipping
    default_billing
";

pub fn create_address_mutation() -> String {
    format!(
        r"mutation CreateAddress($input: CustomerAddressInput!) {{
            createCustomerAddress(input: $input) {{ {ADDRESS_FIELDS} }}
        }}"
    )
}

pub fn update_address_mutation() -> String {
    format!(
        r"mutation UpdateAddress($id: Int!, $input: CustomerAddressInput!) {{
            updateCustomerAddress(id: $id, input: $input) {{ {ADDRESS_FIELDS} }}
        }}"
    )
}

pub const DELETE_ADDRESS_MUTATION: &str = r"
    mutation DeleteAddress($id: Int!) {
        deleteCustomerAddress(id: $id)
    }
";

pub const CUSTOMER_ORDERS_QUERY: &str = r"
    query CustomerOrders($pageSize: Int!, $currentPage: Int!) {
        customer {
            orders(pageSize: $pageSize, currentPage: $currentPage, sort: { sort_field: CREATED_AT, sort_direction: DESC }) {
                total_count
                page_info { current_page page_size total_pages }
                items {
                    id
                    number
                    order_date
                    status
                    payment_methods { name }
                    shipping_method
                    total {
                        subtotal { value currency }
                        grand_total { value currency }
                        total_shipping { value currency }
                        total_tax { value currency }
                        discounts { amount { value currency } }
                    }
                    items {
                        product_sku
                        product_name
                        product_url_key
                        quantity_ordered
                        product_sale_price { value currency }
                    }
                }
            }
        }
    }
";

pub const SET_GUEST_EMAIL_MUTATION: &str = r"
    mutation SetGuestEmail($cartId: String!, $email: String!) {
        setGuestEmailOnCart(input: { cart_id: $cartId, email: $email }) {
            cart { id }
        }
    }
";

pub const SET_SHIPPING_ADDRESS_MUTATION: &str = r"
    mutation SetShippingAddress($cartId: String!, $address: CartAddressInput!) {
        setShippingAddressesOnCart(input: {
            cart_id: $cartId,
            shipping_addresses: [{ address: $address }]
        }) {
            cart {
                shipping_addresses {
                    available_shipping_methods {
                        carrier_code
                        method_code
                        method_title
                        amount { value currency }
                    }
                }
            }
        }
    }
";

pub const SET_BILLING_ADDRESS_MUTATION: &str = r"
    mutation SetBillingAddress($cartId: String!, $address: CartAddressInput!) {
        setBillingAddressOnCart(input: {
            cart_id: $cartId,
            billing_address: { address: $address }
        }) {
            cart { id }
        }
    }
";

pub const SET_SHIPPING_METHOD_MUTATION: &str = r"
    mutation SetShippingMethod($cartId: String!, $carrier: String!, $method: String!) {
        setShippingMethodsOnCart(input: {
            cart_id: $cartId,
            shipping_methods: [{ carrier_code: $carrier, method_code: $method }]
        }) {
            cart { id }
        }
    }
";

pub const AVAILABLE_PAYMENT_METHODS_QUERY: &str = r"
    query PaymentMethods($cartId: String!) {
        cart(cart_id: $cartId) {
            available_payment_methods { code title }
        }
    }
";

pub const SET_PAYMENT_METHOD_MUTATION: &str = r"
    mutation SetPaymentMethod($cartId: String!, $code: String!) {
        setPaymentMethodOnCart(input: {
            cart_id: $cartId,
            payment_method: { code: $code }
        }) {
            cart { id }
        }
    }
";

pub const PLACE_ORDER_MUTATION: &str = r"
    mutation PlaceOrder($cartId: String!) {
        placeOrder(input: { cart_id: $cartId }) {
            order { order_number }
        }
    }
";

pub const HEALTH_QUERY: &str = "{ storeConfig { store_code } }";

/// Translates the unified sort enum into Magento's field/direction
/// argument. Combinations Magento cannot express fall back to position.
#[must_use]
pub const fn sort_argument(sort: dermastore_core::ProductSort) -> &'static str {
    use dermastore_core::ProductSort;
    match sort {
        ProductSort::PriceAsc => "{ price: ASC }",
        ProductSort::PriceDesc => "{ price: DESC }",
        ProductSort::NameAsc => "{ name: ASC }",
        ProductSort::NameDesc => "{ name: DESC }",
        ProductSort::Newest => "{ created_at: DESC }",
        ProductSort::Oldest => "{ created_at: ASC }",
        ProductSort::Relevance => "{ position: ASC }",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermastore_core::ProductSort;

    #[test]
    fn every_sort_translates_to_a_magento_argument() {
        for sort in [
            ProductSort::Relevance,
            ProductSort::PriceAsc,
            ProductSort::PriceDesc,
            ProductSort::NameAsc,
            ProductSort::NameDesc,
            ProductSort::Newest,
            ProductSort::Oldest,
        ] {
            let arg = sort_argument(sort);
            assert!(arg.starts_with('{') && arg.ends_with('}'));
        }
    }

    #[test]
    fn product_listing_document_embeds_the_sort_argument() {
        let query = products_query(sort_argument(ProductSort::PriceAsc));
        assert!(query.contains("sort: { price: ASC }"));
        assert!(query.contains("total_count"));
    }
}
