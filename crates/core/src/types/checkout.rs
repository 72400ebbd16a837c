//! Checkout sessions and the step state machine.

use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::customer::Address;
use super::order::Order;
use super::price::Price;

/// The four checkout steps, in order.
///
/// A session only ever moves forward; providers advance `step` as the
/// required inputs arrive and reject order placement before `Review`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Information,
    Shipping,
    Payment,
    Review,
}

/// A transient checkout-in-progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub cart: Cart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub step: CheckoutStep,
}

impl CheckoutSession {
    /// A new session at the information step over a cart snapshot.
    #[must_use]
    pub fn new(id: &str, cart: Cart) -> Self {
        Self {
            id: id.to_owned(),
            cart,
            email: None,
            shipping_address: None,
            billing_address: None,
            shipping_method: None,
            payment_method: None,
            step: CheckoutStep::Information,
        }
    }

    /// Advances to `next` unless the session is already past it.
    pub fn advance_to(&mut self, next: CheckoutStep) {
        if next > self.step {
            self.step = next;
        }
    }
}

/// A shipping option offered during checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub code: String,
    pub label: String,
    pub price: Price,
}

/// A payment option offered during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub code: String,
    pub label: String,
}

/// The result of placing an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderResult {
    pub order: Order,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_ordered() {
        assert!(CheckoutStep::Information < CheckoutStep::Shipping);
        assert!(CheckoutStep::Payment < CheckoutStep::Review);
    }

    #[test]
    fn advance_never_moves_backwards() {
        let mut session = CheckoutSession::new("cs1", Cart::empty("c1", "ZAR"));
        session.advance_to(CheckoutStep::Payment);
        assert_eq!(session.step, CheckoutStep::Payment);
        session.advance_to(CheckoutStep::Shipping);
        assert_eq!(session.step, CheckoutStep::Payment);
    }
}
