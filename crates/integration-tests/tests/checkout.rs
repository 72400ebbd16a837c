//! The checkout flow and the order lifecycle.

use dermastore_api::provider::{AddItemInput, CartApi, CheckoutApi, OrdersApi};
use dermastore_api::mock::MockProvider;
use dermastore_core::{Address, ApiError, CheckoutStep, OrderStatus, ReturnRequestItem};
use dermastore_integration_tests::mock_provider;
use rust_decimal::Decimal;

fn address() -> Address {
    Address {
        id: None,
        first_name: "Thandi".to_owned(),
        last_name: "Nkosi".to_owned(),
        street: vec!["12 Kloof Street".to_owned()],
        city: "Cape Town".to_owned(),
        region: Some("Western Cape".to_owned()),
        postcode: "8001".to_owned(),
        country_code: "ZA".to_owned(),
        phone: None,
        is_default_shipping: false,
        is_default_billing: false,
    }
}

async fn stocked(mock: &MockProvider, product_id: &str, quantity: u32) {
    mock.add_item(AddItemInput {
        product_id: product_id.to_owned(),
        variant_id: None,
        quantity,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn the_happy_path_places_an_order_and_empties_the_cart() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 2).await;
    let cart_before = mock.get().await.unwrap();

    let session = mock.create_session().await.unwrap();
    assert_eq!(session.step, CheckoutStep::Information);

    let session = mock.set_email(&session.id, "thandi@example.com").await.unwrap();
    assert_eq!(session.step, CheckoutStep::Shipping);

    mock.set_shipping_address(&session.id, address()).await.unwrap();
    let methods = mock.shipping_methods(&session.id).await.unwrap();
    assert!(methods.iter().any(|m| m.code == "standard"));

    let session = mock.set_shipping_method(&session.id, "standard").await.unwrap();
    assert_eq!(session.step, CheckoutStep::Payment);

    let session = mock.set_payment_method(&session.id, "card").await.unwrap();
    assert_eq!(session.step, CheckoutStep::Review);

    let placed = mock.place_order(&session.id).await.unwrap();
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.number, "DS-01001");
    assert_eq!(placed.order.totals, cart_before.totals);
    assert_eq!(placed.order.items.len(), 1);
    assert_eq!(placed.order.items[0].quantity, 2);

    // The cart is empty but keeps its identity.
    let cart_after = mock.get().await.unwrap();
    assert!(cart_after.is_empty());
    assert_eq!(cart_after.id, cart_before.id);

    // The order shows up in history.
    let orders = mock.get_all(1, 20).await.unwrap();
    assert_eq!(orders.total_items, 1);
    assert_eq!(orders.items.len(), 1);
    let fetched = mock.get_by_id(&placed.order.id).await.unwrap().unwrap();
    assert_eq!(fetched.number, placed.order.number);
}

#[tokio::test]
async fn steps_never_move_backwards() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 1).await;
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();
    mock.set_shipping_address(&session.id, address()).await.unwrap();
    mock.set_shipping_method(&session.id, "standard").await.unwrap();

    // Re-setting the email does not regress the step.
    let session = mock.set_email(&session.id, "b@c.co").await.unwrap();
    assert_eq!(session.step, CheckoutStep::Payment);
}

#[tokio::test]
async fn shipping_method_requires_an_address_first() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 1).await;
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();

    let err = mock
        .set_shipping_method(&session.id, "standard")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() {
    let mock = mock_provider();
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();
    mock.set_shipping_address(&session.id, address()).await.unwrap();

    let err = mock.place_order(&session.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn standard_shipping_is_free_above_the_threshold() {
    let mock = mock_provider();
    stocked(&mock, "prod-5", 1).await; // R549.99
    let session = mock.create_session().await.unwrap();
    let methods = mock.shipping_methods(&session.id).await.unwrap();
    let standard = methods.iter().find(|m| m.code == "standard").unwrap();
    assert_eq!(standard.price.amount, Decimal::ZERO);
}

#[tokio::test]
async fn order_numbers_are_sequential() {
    let mock = mock_provider();
    for _ in 0..2 {
        stocked(&mock, "prod-1", 1).await;
        let session = mock.create_session().await.unwrap();
        mock.set_email(&session.id, "a@b.co").await.unwrap();
        mock.set_shipping_address(&session.id, address()).await.unwrap();
        mock.set_shipping_method(&session.id, "standard").await.unwrap();
        mock.set_payment_method(&session.id, "card").await.unwrap();
        mock.place_order(&session.id).await.unwrap();
    }
    let mut numbers: Vec<String> = mock
        .get_all(1, 20)
        .await
        .unwrap()
        .items
        .iter()
        .map(|o| o.number.clone())
        .collect();
    numbers.sort();
    assert_eq!(numbers, vec!["DS-01001", "DS-01002"]);
}

#[tokio::test]
async fn order_history_pages_most_recent_first() {
    let mock = mock_provider();
    for _ in 0..3 {
        stocked(&mock, "prod-1", 1).await;
        let session = mock.create_session().await.unwrap();
        mock.set_email(&session.id, "a@b.co").await.unwrap();
        mock.set_shipping_address(&session.id, address()).await.unwrap();
        mock.set_shipping_method(&session.id, "standard").await.unwrap();
        mock.set_payment_method(&session.id, "card").await.unwrap();
        mock.place_order(&session.id).await.unwrap();
    }

    let first = mock.get_all(1, 2).await.unwrap();
    assert_eq!(first.total_items, 3);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total_pages, 2);

    let second = mock.get_all(2, 2).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(first.items.iter().all(|o| o.number != second.items[0].number));
}

#[tokio::test]
async fn orders_are_reachable_by_number() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 1).await;
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();
    mock.set_shipping_address(&session.id, address()).await.unwrap();
    mock.set_shipping_method(&session.id, "standard").await.unwrap();
    mock.set_payment_method(&session.id, "card").await.unwrap();
    let placed = mock.place_order(&session.id).await.unwrap();

    let found = mock.get_by_number(&placed.order.number).await.unwrap().unwrap();
    assert_eq!(found.id, placed.order.id);
    assert!(mock.get_by_number("DS-99999").await.unwrap().is_none());
}

#[tokio::test]
async fn return_requests_validate_order_lines() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 2).await;
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();
    mock.set_shipping_address(&session.id, address()).await.unwrap();
    mock.set_shipping_method(&session.id, "standard").await.unwrap();
    mock.set_payment_method(&session.id, "card").await.unwrap();
    let placed = mock.place_order(&session.id).await.unwrap();

    mock.request_return(
        &placed.order.id,
        vec![ReturnRequestItem {
            product_id: "prod-1".to_owned(),
            quantity: 1,
            reason: "arrived damaged".to_owned(),
        }],
    )
    .await
    .unwrap();

    // More than was ordered cannot be returned.
    let err = mock
        .request_return(
            &placed.order.id,
            vec![ReturnRequestItem {
                product_id: "prod-1".to_owned(),
                quantity: 5,
                reason: "arrived damaged".to_owned(),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = mock.request_return(&placed.order.id, Vec::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn cancellation_stops_at_fulfilment() {
    let mock = mock_provider();
    stocked(&mock, "prod-1", 1).await;
    let session = mock.create_session().await.unwrap();
    mock.set_email(&session.id, "a@b.co").await.unwrap();
    mock.set_shipping_address(&session.id, address()).await.unwrap();
    mock.set_shipping_method(&session.id, "standard").await.unwrap();
    mock.set_payment_method(&session.id, "card").await.unwrap();
    let placed = mock.place_order(&session.id).await.unwrap();

    let cancelled = mock.cancel(&placed.order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let missing = mock.cancel("order-unknown").await.unwrap_err();
    assert!(matches!(missing, ApiError::NotFound(_)));
}
