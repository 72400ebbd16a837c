//! Order conversions and the status lookup table.

use chrono::Utc;
use rust_decimal::Decimal;

use dermastore_core::{CartTotals, Order, OrderItem, OrderStatus, Price};

use crate::magento::wire::{WireOrder, WireOrderItem};

use super::{decimal, money, parse_timestamp};

/// Maps a Magento order status string to the unified enum.
///
/// Unmapped values default to `Pending` rather than failing; new
/// backend states degrade gracefully instead of breaking order history.
#[must_use]
pub fn convert_order_status(raw: &str) -> OrderStatus {
    let normalized = raw.trim().to_lowercase().replace(' ', "_");
    match normalized.as_str() {
        "processing" => OrderStatus::Processing,
        "shipped" => OrderStatus::Shipped,
        "complete" => OrderStatus::Delivered,
        "closed" => OrderStatus::Refunded,
        "canceled" | "cancelled" | "fraud" => OrderStatus::Cancelled,
        // pending, pending_payment, holded, payment_review and anything
        // unknown all read as pending.
        _ => OrderStatus::Pending,
    }
}

/// Converts one order node. Total over any valid response shape.
#[must_use]
pub fn convert_order(node: &WireOrder) -> Order {
    let total = node.total.as_ref();
    let subtotal = money(total.and_then(|t| t.subtotal.as_ref()));
    let currency = subtotal.currency.clone();

    let discount: Decimal = total
        .and_then(|t| t.discounts.as_ref())
        .map(|discounts| {
            discounts
                .iter()
                .map(|d| decimal(d.amount.as_ref().and_then(|m| m.value)))
                .sum()
        })
        .unwrap_or_default();

    let totals = CartTotals {
        shipping: money(total.and_then(|t| t.total_shipping.as_ref())),
        tax: money(total.and_then(|t| t.total_tax.as_ref())),
        total: money(total.and_then(|t| t.grand_total.as_ref())),
        discount: Price::new(discount, &currency),
        subtotal,
    };

    Order {
        id: node.id.clone().unwrap_or_default(),
        number: node.number.clone().unwrap_or_default(),
        status: node
            .status
            .as_deref()
            .map(convert_order_status)
            .unwrap_or_default(),
        items: node
            .items
            .iter()
            .flatten()
            .flatten()
            .map(|item| convert_order_item(item, &currency))
            .collect(),
        shipping_address: None,
        billing_address: None,
        shipping_method: node.shipping_method.clone(),
        payment_method: node
            .payment_methods
            .iter()
            .flatten()
            .find_map(|m| m.name.clone()),
        totals,
        created_at: parse_timestamp(node.order_date.as_deref()).unwrap_or_else(Utc::now),
    }
}

fn convert_order_item(node: &WireOrderItem, currency: &str) -> OrderItem {
    let price = Price::new(
        decimal(node.product_sale_price.as_ref().and_then(|m| m.value)),
        node.product_sale_price
            .as_ref()
            .and_then(|m| m.currency.as_deref())
            .unwrap_or(currency),
    );
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = node
        .quantity_ordered
        .filter(|q| *q >= 0.0)
        .map_or(0, |q| q as u32);
    let subtotal = price.rescale(price.amount * Decimal::from(quantity));

    OrderItem {
        product_id: node.product_sku.clone().unwrap_or_default(),
        sku: node.product_sku.clone().unwrap_or_default(),
        name: node.product_name.clone().unwrap_or_default(),
        image: None,
        price,
        quantity,
        subtotal,
    }
}
