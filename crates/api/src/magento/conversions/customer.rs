//! Customer and address conversions.

use dermastore_core::{Address, User};

use crate::magento::wire::{WireAddress, WireCustomer};

use super::parse_timestamp;

/// Converts a customer node.
///
/// Magento's GraphQL customer has no exposed id, so the email doubles
/// as the stable identifier.
#[must_use]
pub fn convert_customer(node: &WireCustomer) -> User {
    let email = node.email.clone().unwrap_or_default();
    User {
        id: email.clone(),
        email,
        first_name: node.firstname.clone().unwrap_or_default(),
        last_name: node.lastname.clone().unwrap_or_default(),
        addresses: node
            .addresses
            .iter()
            .flatten()
            .map(convert_address)
            .collect(),
        created_at: parse_timestamp(node.created_at.as_deref()),
    }
}

#[must_use]
pub fn convert_address(node: &WireAddress) -> Address {
    Address {
        id: node.id.map(|id| id.to_string()),
        first_name: node.firstname.clone().unwrap_or_default(),
        last_name: node.lastname.clone().unwrap_or_default(),
        street: node.street.clone().unwrap_or_default(),
        city: node.city.clone().unwrap_or_default(),
        region: node.region.as_ref().and_then(|r| r.region.clone()),
        postcode: node.postcode.clone().unwrap_or_default(),
        country_code: node.country_code.clone().unwrap_or_default(),
        phone: node.telephone.clone(),
        is_default_shipping: node.default_shipping.unwrap_or(false),
        is_default_billing: node.default_billing.unwrap_or(false),
    }
}

/// A domain address as Magento's `CartAddressInput` variables object.
#[must_use]
pub fn address_to_input(address: &Address) -> serde_json::Value {
    serde_json::json!({
        "firstname": address.first_name,
        "lastname": address.last_name,
        "street": address.street,
        "city": address.city,
        "region": address.region,
        "postcode": address.postcode,
        "country_code": address.country_code,
        "telephone": address.phone.as_deref().unwrap_or(""),
    })
}

/// A domain address as Magento's `CustomerAddressInput` variables
/// object, used by the address-book mutations.
#[must_use]
pub fn address_book_input(address: &Address) -> serde_json::Value {
    serde_json::json!({
        "firstname": address.first_name,
        "lastname": address.last_name,
        "street": address.street,
        "city": address.city,
        "region": { "region": address.region },
        "postcode": address.postcode,
        "country_code": address.country_code,
        "telephone": address.phone.as_deref().unwrap_or(""),
        "default_shipping": address.is_default_shipping,
        "default_billing": address.is_default_billing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_is_the_email() {
        let node: WireCustomer = serde_json::from_value(serde_json::json!({
            "email": "thandi@example.com",
            "firstname": "Thandi",
            "lastname": "Nkosi",
            "created_at": "2024-01-15 09:00:00",
            "addresses": [{
                "id": 7,
                "firstname": "Thandi",
                "lastname": "Nkosi",
                "street": ["12 Kloof Street"],
                "city": "Cape Town",
                "region": { "region": "Western Cape" },
                "postcode": "8001",
                "country_code": "ZA",
                "telephone": "0215550100",
                "default_shipping": true,
                "default_billing": false
            }]
        }))
        .unwrap();

        let user = convert_customer(&node);
        assert_eq!(user.id, "thandi@example.com");
        assert_eq!(user.addresses.len(), 1);
        assert_eq!(user.addresses[0].id.as_deref(), Some("7"));
        assert!(user.addresses[0].is_default_shipping);
        assert!(user.created_at.is_some());
    }

    #[test]
    fn empty_customer_converts_to_defaults() {
        let user = convert_customer(&WireCustomer::default());
        assert_eq!(user.id, "");
        assert!(user.addresses.is_empty());
    }

    #[test]
    fn address_input_round_trips_core_fields() {
        let address = Address {
            id: None,
            first_name: "Sipho".to_owned(),
            last_name: "Dlamini".to_owned(),
            street: vec!["1 Main Rd".to_owned()],
            city: "Durban".to_owned(),
            region: Some("KZN".to_owned()),
            postcode: "4001".to_owned(),
            country_code: "ZA".to_owned(),
            phone: None,
            is_default_shipping: false,
            is_default_billing: false,
        };
        let input = address_to_input(&address);
        assert_eq!(input["city"], "Durban");
        assert_eq!(input["telephone"], "");
    }

    #[test]
    fn address_book_input_carries_the_default_flags() {
        let address = Address {
            id: None,
            first_name: "Sipho".to_owned(),
            last_name: "Dlamini".to_owned(),
            street: vec!["1 Main Rd".to_owned()],
            city: "Durban".to_owned(),
            region: Some("KZN".to_owned()),
            postcode: "4001".to_owned(),
            country_code: "ZA".to_owned(),
            phone: Some("0315550100".to_owned()),
            is_default_shipping: true,
            is_default_billing: false,
        };
        let input = address_book_input(&address);
        assert_eq!(input["default_shipping"], true);
        assert_eq!(input["default_billing"], false);
        assert_eq!(input["region"]["region"], "KZN");
    }
}
