//! Cart mutations, coupons and the totals equation.

use dermastore_api::provider::{AddItemInput, CartApi};
use dermastore_core::ApiError;
use dermastore_integration_tests::mock_provider;
use rust_decimal::Decimal;

fn add(product_id: &str, quantity: u32) -> AddItemInput {
    AddItemInput {
        product_id: product_id.to_owned(),
        variant_id: None,
        quantity,
    }
}

#[tokio::test]
async fn line_subtotals_equal_price_times_quantity() {
    let mock = mock_provider();
    mock.add_item(add("prod-1", 3)).await.unwrap();
    let cart = mock.add_item(add("prod-3", 2)).await.unwrap();

    for item in &cart.items {
        let expected = item.price.amount * Decimal::from(item.quantity);
        assert_eq!(item.subtotal.amount, expected, "line {}", item.id);
    }
    assert!(cart.totals.is_balanced());
}

#[tokio::test]
async fn adding_the_same_line_merges_quantities() {
    let mock = mock_provider();
    mock.add_item(add("prod-1", 2)).await.unwrap();
    let cart = mock.add_item(add("prod-1", 3)).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.item_count, 5);
}

#[tokio::test]
async fn distinct_variants_stay_on_separate_lines() {
    let mock = mock_provider();
    mock.add_item(AddItemInput {
        product_id: "prod-1".to_owned(),
        variant_id: Some("var-a".to_owned()),
        quantity: 1,
    })
    .await
    .unwrap();
    let cart = mock
        .add_item(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: Some("var-b".to_owned()),
            quantity: 1,
        })
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 2);
}

#[tokio::test]
async fn zero_quantity_add_is_rejected() {
    let mock = mock_provider();
    let err = mock.add_item(add("prod-1", 0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn unknown_product_add_is_not_found() {
    let mock = mock_provider();
    let err = mock.add_item(add("prod-999", 1)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn get_is_idempotent() {
    let mock = mock_provider();
    mock.add_item(add("prod-6", 1)).await.unwrap();
    let a = mock.get().await.unwrap();
    let b = mock.get().await.unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.items, b.items);
    assert_eq!(a.totals, b.totals);
}

#[tokio::test]
async fn percent_coupon_discounts_exactly_ten_percent() {
    let mock = mock_provider();
    mock.add_item(add("prod-2", 2)).await.unwrap();
    let cart = mock.apply_coupon("SAVE10").await.unwrap();

    let expected = (cart.totals.subtotal.amount * Decimal::new(10, 0) / Decimal::new(100, 0))
        .round_dp(2);
    assert_eq!(cart.totals.discount.amount, expected);
    assert!(cart.totals.is_balanced());
    assert_eq!(cart.coupon.as_ref().unwrap().code, "SAVE10");
}

#[tokio::test]
async fn invalid_coupon_is_a_conflict_and_leaves_the_cart_alone() {
    let mock = mock_provider();
    let before = mock.add_item(add("prod-2", 1)).await.unwrap();
    let err = mock.apply_coupon("EXPIRED99").await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let after = mock.get().await.unwrap();
    assert!(after.coupon.is_none());
    assert_eq!(after.totals, before.totals);
}

#[tokio::test]
async fn removing_the_coupon_restores_full_totals() {
    let mock = mock_provider();
    let plain = mock.add_item(add("prod-2", 1)).await.unwrap();
    mock.apply_coupon("WELCOME15").await.unwrap();
    let restored = mock.remove_coupon().await.unwrap();
    assert_eq!(restored.totals, plain.totals);
}

#[tokio::test]
async fn shipping_crosses_the_free_threshold_and_reverts() {
    let mock = mock_provider();

    // R99.99 subtotal, below the R500 threshold.
    let below = mock.add_item(add("prod-10", 1)).await.unwrap();
    assert_eq!(below.totals.shipping.amount, Decimal::new(99, 0));

    // Adding the R549.99 serum crosses the threshold.
    let above = mock.add_item(add("prod-5", 1)).await.unwrap();
    assert!(above.totals.subtotal.amount >= Decimal::new(500, 0));
    assert_eq!(above.totals.shipping.amount, Decimal::ZERO);

    // Removing it drops the subtotal back below and the fee returns.
    let line = above
        .items
        .iter()
        .find(|i| i.product_id == "prod-5")
        .unwrap()
        .id
        .clone();
    let reverted = mock.remove_item(&line).await.unwrap();
    assert_eq!(reverted.totals.shipping.amount, Decimal::new(99, 0));
    assert!(reverted.totals.is_balanced());
}

#[tokio::test]
async fn update_and_remove_address_lines_by_id() {
    let mock = mock_provider();
    let cart = mock.add_item(add("prod-4", 1)).await.unwrap();
    let line = cart.items[0].id.clone();

    let updated = mock.update_item(&line, 4).await.unwrap();
    assert_eq!(updated.items[0].quantity, 4);

    let err = mock.update_item("line-999", 1).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let emptied = mock.remove_item(&line).await.unwrap();
    assert!(emptied.is_empty());
    assert_eq!(emptied.totals.total.amount, Decimal::ZERO);
}

#[tokio::test]
async fn updating_a_line_to_zero_removes_it() {
    let mock = mock_provider();
    mock.add_item(add("prod-1", 2)).await.unwrap();
    let cart = mock.add_item(add("prod-4", 1)).await.unwrap();
    let line = cart
        .items
        .iter()
        .find(|i| i.product_id == "prod-4")
        .unwrap()
        .id
        .clone();

    let after = mock.update_item(&line, 0).await.unwrap();
    assert_eq!(after.items.len(), 1);
    assert!(after.items.iter().all(|i| i.product_id != "prod-4"));
    assert!(after.totals.is_balanced());

    // Zeroing an unknown line still reports it as missing.
    let err = mock.update_item("line-999", 0).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
