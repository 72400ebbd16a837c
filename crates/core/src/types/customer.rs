//! Users, addresses and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// The default shipping address, if exactly resolvable.
    ///
    /// Backends are not trusted to enforce uniqueness of the default
    /// flag; the first flagged address wins.
    #[must_use]
    pub fn default_shipping_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default_shipping)
    }

    #[must_use]
    pub fn default_billing_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default_billing)
    }
}

/// A postal address in a customer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: Vec<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postcode: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default_shipping: bool,
    #[serde(default)]
    pub is_default_billing: bool,
}

/// Credentials presented at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Input for account registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// A partial profile edit. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update carries any change at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

/// A successful login or registration result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(id: &str, shipping: bool) -> Address {
        Address {
            id: Some(id.to_owned()),
            first_name: "Thandi".to_owned(),
            last_name: "Nkosi".to_owned(),
            street: vec!["12 Kloof St".to_owned()],
            city: "Cape Town".to_owned(),
            region: Some("WC".to_owned()),
            postcode: "8001".to_owned(),
            country_code: "ZA".to_owned(),
            phone: None,
            is_default_shipping: shipping,
            is_default_billing: false,
        }
    }

    #[test]
    fn first_flagged_default_wins_when_backend_sends_duplicates() {
        let user = User {
            id: "u1".to_owned(),
            email: "thandi@example.com".to_owned(),
            first_name: "Thandi".to_owned(),
            last_name: "Nkosi".to_owned(),
            addresses: vec![address("a1", true), address("a2", true)],
            created_at: None,
        };
        let found = user.default_shipping_address().and_then(|a| a.id.clone());
        assert_eq!(found.as_deref(), Some("a1"));
    }
}
