//! Conversion functions from Magento wire shapes to the domain model.
//!
//! All conversions are total: any syntactically valid response maps to
//! a domain value, with missing fields degrading to documented
//! defaults. Nothing in this module performs I/O.

mod cart;
mod categories;
mod customer;
mod orders;
mod products;

pub use cart::{convert_cart, convert_payment_options, convert_shipping_options};
pub use categories::convert_category_tree;
pub use customer::{address_book_input, address_to_input, convert_address, convert_customer};
pub use orders::{convert_order, convert_order_status};
pub use products::{convert_product, convert_product_page};

use rust_decimal::Decimal;

use dermastore_core::Price;

use crate::magento::wire::WireMoney;

/// Currency assumed when the backend omits one.
pub const DEFAULT_CURRENCY: &str = "ZAR";

/// A float amount as an exact 2-decimal amount; absent or
/// unrepresentable values become zero.
pub(crate) fn decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(Decimal::from_f64_retain)
        .unwrap_or_default()
        .round_dp(2)
}

/// A wire money node as a [`Price`], defaulting to zero.
pub(crate) fn money(node: Option<&WireMoney>) -> Price {
    let currency = node
        .and_then(|m| m.currency.as_deref())
        .unwrap_or(DEFAULT_CURRENCY);
    Price::new(decimal(node.and_then(|m| m.value)), currency)
}

/// Parses Magento's `YYYY-MM-DD HH:MM:SS` timestamps.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = raw?;
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_money_is_zero_in_the_default_currency() {
        let price = money(None);
        assert_eq!(price.amount, Decimal::ZERO);
        assert_eq!(price.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn money_rounds_to_cents() {
        let node = WireMoney {
            value: Some(199.999),
            currency: Some("ZAR".to_owned()),
        };
        assert_eq!(money(Some(&node)).amount, Decimal::new(20_000, 2));
    }

    #[test]
    fn timestamps_parse_magento_format() {
        let parsed = parse_timestamp(Some("2024-06-01 08:30:00")).unwrap();
        assert_eq!(parsed.timestamp(), 1_717_230_600);
        assert!(parse_timestamp(Some("not a date")).is_none());
        assert!(parse_timestamp(None).is_none());
    }
}
