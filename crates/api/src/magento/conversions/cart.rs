//! Cart and checkout-option conversions.

use rust_decimal::Decimal;

use dermastore_core::{
    AppliedCoupon, Cart, CartItem, CartTotals, PaymentMethod, Price, ShippingMethod,
};

use crate::magento::wire::{WireCart, WireCartItem, WirePaymentOption, WireShippingOption};

use super::{DEFAULT_CURRENCY, decimal, money};

/// Converts a cart node. Total over any valid response shape.
#[must_use]
pub fn convert_cart(node: &WireCart) -> Cart {
    let items: Vec<CartItem> = node
        .items
        .iter()
        .flatten()
        .flatten()
        .map(convert_cart_item)
        .collect();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let item_count = node
        .total_quantity
        .filter(|q| *q >= 0.0)
        .map_or_else(|| items.iter().map(|i| i.quantity).sum(), |q| q as u32);

    let coupon = node
        .applied_coupons
        .iter()
        .flatten()
        .find_map(|c| c.code.clone())
        .map(|code| AppliedCoupon { code, label: None });

    Cart {
        id: node.id.clone().unwrap_or_default(),
        totals: convert_totals(node, &items),
        items,
        item_count,
        coupon,
    }
}

fn convert_cart_item(node: &WireCartItem) -> CartItem {
    let product = node.product.as_ref();
    let price = node
        .prices
        .as_ref()
        .and_then(|p| p.price.as_ref())
        .map_or_else(
            || {
                // Fall back to the product's minimum final price.
                let minimum = product
                    .and_then(|p| p.price_range.as_ref())
                    .and_then(|r| r.minimum_price.as_ref());
                money(minimum.and_then(|m| m.final_price.as_ref()))
            },
            |m| money(Some(m)),
        );

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = node.quantity.filter(|q| *q >= 0.0).map_or(0, |q| q as u32);

    let subtotal = node
        .prices
        .as_ref()
        .and_then(|p| p.row_total.as_ref())
        .map_or_else(
            || price.rescale(price.amount * Decimal::from(quantity)),
            |m| money(Some(m)),
        );

    CartItem {
        id: node.uid.clone().unwrap_or_default(),
        product_id: product.and_then(|p| p.uid.clone()).unwrap_or_default(),
        variant_id: None,
        sku: product.and_then(|p| p.sku.clone()).unwrap_or_default(),
        name: product.and_then(|p| p.name.clone()).unwrap_or_default(),
        slug: product.and_then(|p| p.url_key.clone()).unwrap_or_default(),
        image: product
            .and_then(|p| p.thumbnail.as_ref())
            .and_then(|t| t.url.clone()),
        price,
        quantity,
        subtotal,
    }
}

fn convert_totals(node: &WireCart, items: &[CartItem]) -> CartTotals {
    let prices = node.prices.as_ref();

    let subtotal = prices
        .and_then(|p| p.subtotal_excluding_tax.as_ref())
        .map_or_else(
            || {
                let sum: Decimal = items.iter().map(|i| i.subtotal.amount).sum();
                Price::new(sum, DEFAULT_CURRENCY)
            },
            |m| money(Some(m)),
        );
    let currency = subtotal.currency.clone();

    let tax: Decimal = prices
        .and_then(|p| p.applied_taxes.as_ref())
        .map(|taxes| {
            taxes
                .iter()
                .map(|t| decimal(t.amount.as_ref().and_then(|m| m.value)))
                .sum()
        })
        .unwrap_or_default();

    let discount: Decimal = prices
        .and_then(|p| p.discounts.as_ref())
        .map(|discounts| {
            discounts
                .iter()
                .map(|d| decimal(d.amount.as_ref().and_then(|m| m.value)))
                .sum()
        })
        .unwrap_or_default();

    let shipping = node
        .shipping_addresses
        .iter()
        .flatten()
        .find_map(|a| a.selected_shipping_method.as_ref())
        .map(|m| decimal(m.amount.as_ref().and_then(|a| a.value)))
        .unwrap_or_default();

    let total = prices.and_then(|p| p.grand_total.as_ref()).map_or_else(
        || subtotal.amount - discount + shipping + tax,
        |m| decimal(m.value),
    );

    CartTotals {
        discount: Price::new(discount, &currency),
        shipping: Price::new(shipping, &currency),
        tax: Price::new(tax, &currency),
        total: Price::new(total, &currency),
        subtotal,
    }
}

/// Shipping options as offered by the backend.
///
/// The unified method code is `carrier:method` so the selection
/// mutation can split it back apart.
#[must_use]
pub fn convert_shipping_options(options: &[WireShippingOption]) -> Vec<ShippingMethod> {
    options
        .iter()
        .map(|o| ShippingMethod {
            code: format!(
                "{}:{}",
                o.carrier_code.as_deref().unwrap_or_default(),
                o.method_code.as_deref().unwrap_or_default()
            ),
            label: o.method_title.clone().unwrap_or_default(),
            price: money(o.amount.as_ref()),
        })
        .collect()
}

#[must_use]
pub fn convert_payment_options(options: &[WirePaymentOption]) -> Vec<PaymentMethod> {
    options
        .iter()
        .map(|o| PaymentMethod {
            code: o.code.clone().unwrap_or_default(),
            label: o.title.clone().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_from_json(json: serde_json::Value) -> Cart {
        let node: WireCart = serde_json::from_value(json).unwrap();
        convert_cart(&node)
    }

    #[test]
    fn empty_cart_node_converts_to_defaults() {
        let cart = cart_from_json(serde_json::json!({}));
        assert!(cart.is_empty());
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.totals.total.amount, Decimal::ZERO);
    }

    #[test]
    fn full_cart_converts_items_and_totals() {
        let cart = cart_from_json(serde_json::json!({
            "id": "abc123",
            "total_quantity": 3.0,
            "applied_coupons": [{ "code": "SAVE10" }],
            "items": [
                {
                    "uid": "item-1",
                    "quantity": 3.0,
                    "product": {
                        "uid": "p1", "sku": "SKU1", "url_key": "serum", "name": "Serum",
                        "thumbnail": { "url": "https://img/t.jpg" }
                    },
                    "prices": {
                        "price": { "value": 100.0, "currency": "ZAR" },
                        "row_total": { "value": 300.0, "currency": "ZAR" }
                    }
                },
                null
            ],
            "prices": {
                "subtotal_excluding_tax": { "value": 300.0, "currency": "ZAR" },
                "grand_total": { "value": 315.0, "currency": "ZAR" },
                "applied_taxes": [{ "amount": { "value": 45.0, "currency": "ZAR" } }],
                "discounts": [{ "amount": { "value": 30.0, "currency": "ZAR" } }]
            }
        }));

        assert_eq!(cart.id, "abc123");
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].subtotal.amount, Decimal::new(300, 0));
        assert_eq!(cart.coupon.as_ref().map(|c| c.code.as_str()), Some("SAVE10"));
        assert_eq!(cart.totals.tax.amount, Decimal::new(45, 0));
        assert_eq!(cart.totals.discount.amount, Decimal::new(30, 0));
        assert_eq!(cart.totals.total.amount, Decimal::new(315, 0));
    }

    #[test]
    fn missing_row_total_is_recomputed_from_unit_price() {
        let cart = cart_from_json(serde_json::json!({
            "items": [{
                "uid": "item-1",
                "quantity": 2.0,
                "prices": { "price": { "value": 50.0, "currency": "ZAR" } }
            }]
        }));
        assert_eq!(cart.items[0].subtotal.amount, Decimal::new(100, 0));
    }

    #[test]
    fn shipping_option_codes_carry_carrier_and_method() {
        let options: Vec<WireShippingOption> = serde_json::from_value(serde_json::json!([
            {
                "carrier_code": "flatrate",
                "method_code": "flatrate",
                "method_title": "Fixed",
                "amount": { "value": 99.0, "currency": "ZAR" }
            }
        ]))
        .unwrap();
        let converted = convert_shipping_options(&options);
        assert_eq!(converted[0].code, "flatrate:flatrate");
        assert_eq!(converted[0].price.amount, Decimal::new(99, 0));
    }
}
