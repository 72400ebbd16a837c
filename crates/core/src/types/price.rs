//! Money as exact decimals with a pre-rendered display string.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary value in a single currency.
///
/// `formatted` is rendered once at construction so presentation code
/// never re-derives it. `compare_at_amount` is a markdown reference
/// price and, when present, is strictly greater than `amount`;
/// [`Price::with_compare_at`] drops any candidate that is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
    pub formatted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_formatted: Option<String>,
}

impl Price {
    #[must_use]
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_owned(),
            formatted: format_amount(amount, currency),
            compare_at_amount: None,
            compare_at_formatted: None,
        }
    }

    #[must_use]
    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Attaches a compare-at price when it is strictly greater than the
    /// selling price. Equal or lower candidates are discarded so a price
    /// is never presented as a markdown when it is not one.
    #[must_use]
    pub fn with_compare_at(mut self, compare_at: Decimal) -> Self {
        if compare_at > self.amount {
            self.compare_at_formatted = Some(format_amount(compare_at, &self.currency));
            self.compare_at_amount = Some(compare_at);
        }
        self
    }

    /// Whether this price carries a (strictly higher) compare-at price.
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.compare_at_amount.is_some()
    }

    /// A new price in the same currency for a different amount.
    #[must_use]
    pub fn rescale(&self, amount: Decimal) -> Self {
        Self::new(amount, &self.currency)
    }
}

/// Renders an amount with thousands separators and a currency symbol.
///
/// Currencies without a known symbol fall back to an ISO-code suffix.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{int_grouped}.{frac_part}"),
        None => format!("{sign}{int_grouped}.{frac_part} {currency}"),
    }
}

const fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.as_bytes() {
        b"ZAR" => Some("R"),
        b"USD" => Some("$"),
        b"EUR" => Some("\u{20ac}"),
        b"GBP" => Some("\u{a3}"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_symbol_and_grouping() {
        let price = Price::new(Decimal::new(123_456_750, 2), "ZAR");
        assert_eq!(price.formatted, "R1,234,567.50");
    }

    #[test]
    fn formats_unknown_currency_with_code_suffix() {
        assert_eq!(format_amount(Decimal::new(9990, 2), "SEK"), "99.90 SEK");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_amount(Decimal::new(-50, 0), "ZAR"), "-R50.00");
    }

    #[test]
    fn compare_at_must_be_strictly_greater() {
        let discounted =
            Price::new(Decimal::new(80, 0), "ZAR").with_compare_at(Decimal::new(100, 0));
        assert!(discounted.is_discounted());
        assert_eq!(discounted.compare_at_formatted.as_deref(), Some("R100.00"));

        let equal = Price::new(Decimal::new(80, 0), "ZAR").with_compare_at(Decimal::new(80, 0));
        assert!(!equal.is_discounted());

        let lower = Price::new(Decimal::new(80, 0), "ZAR").with_compare_at(Decimal::new(60, 0));
        assert!(!lower.is_discounted());
    }

    #[test]
    fn serde_round_trips() {
        let price = Price::new(Decimal::new(49_999, 2), "ZAR").with_compare_at(Decimal::new(
            59_999, 2,
        ));
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }
}
