//! Carts, cart lines and totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::Price;

/// A shopping cart.
///
/// Invariants, re-established by providers after every mutation:
/// - at most one item per distinct `(product_id, variant_id)` pair
/// - `item_count == Σ quantity`
/// - `totals.total == subtotal - discount + shipping + tax`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    pub items: Vec<CartItem>,
    pub item_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<AppliedCoupon>,
    pub totals: CartTotals,
}

impl Cart {
    /// A fresh empty cart in the given currency.
    #[must_use]
    pub fn empty(id: &str, currency: &str) -> Self {
        Self {
            id: id.to_owned(),
            items: Vec::new(),
            item_count: 0,
            coupon: None,
            totals: CartTotals::zero(currency),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line holding this `(product_id, variant_id)` pair, if any.
    #[must_use]
    pub fn find_item(&self, product_id: &str, variant_id: Option<&str>) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id && item.variant_id.as_deref() == variant_id)
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn count_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: Price,
    pub quantity: u32,
    /// `price.amount * quantity`, recomputed on every mutation.
    pub subtotal: Price,
}

impl CartItem {
    /// Recomputes `subtotal` from the unit price and quantity.
    pub fn resubtotal(&mut self) {
        let amount = self.price.amount * Decimal::from(self.quantity);
        self.subtotal = self.price.rescale(amount);
    }
}

/// An applied coupon, as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Cart money totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Price,
    pub discount: Price,
    pub shipping: Price,
    pub tax: Price,
    pub total: Price,
}

impl CartTotals {
    #[must_use]
    pub fn zero(currency: &str) -> Self {
        Self {
            subtotal: Price::zero(currency),
            discount: Price::zero(currency),
            shipping: Price::zero(currency),
            tax: Price::zero(currency),
            total: Price::zero(currency),
        }
    }

    /// Whether the totals equation holds.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total.amount
            == self.subtotal.amount - self.discount.amount + self.shipping.amount
                + self.tax.amount
    }
}
