//! Sessions, registration and the cart across login.

use dermastore_api::provider::{AddItemInput, AuthApi, CartApi};
use dermastore_core::{ApiError, Credentials, RegisterInput};
use dermastore_integration_tests::mock_provider;

fn thandi() -> Credentials {
    Credentials {
        email: "thandi@example.com".to_owned(),
        password: "password123".to_owned(),
    }
}

#[tokio::test]
async fn login_returns_the_user_and_a_token() {
    let mock = mock_provider();
    let response = mock.login(thandi()).await.unwrap();
    assert_eq!(response.user.email, "thandi@example.com");
    assert!(response.access_token.is_some());

    let current = mock.current_user().await.unwrap().unwrap();
    assert_eq!(current.id, response.user.id);
}

#[tokio::test]
async fn guest_cart_items_survive_login() {
    let mock = mock_provider();
    let guest = mock
        .add_item(AddItemInput {
            product_id: "prod-1".to_owned(),
            variant_id: None,
            quantity: 2,
        })
        .await
        .unwrap();

    mock.login(thandi()).await.unwrap();
    let after = mock.get().await.unwrap();
    assert_eq!(after.id, guest.id);
    assert_eq!(after.item_count, 2);
}

#[tokio::test]
async fn logout_ends_the_session_but_keeps_the_cart() {
    let mock = mock_provider();
    mock.add_item(AddItemInput {
        product_id: "prod-3".to_owned(),
        variant_id: None,
        quantity: 1,
    })
    .await
    .unwrap();
    mock.login(thandi()).await.unwrap();

    mock.logout().await.unwrap();
    assert!(mock.current_user().await.unwrap().is_none());
    assert_eq!(mock.get().await.unwrap().item_count, 1);
}

#[tokio::test]
async fn registration_signs_the_new_account_in() {
    let mock = mock_provider();
    let response = mock
        .register(RegisterInput {
            email: "naledi@example.com".to_owned(),
            password: "longenough".to_owned(),
            first_name: "Naledi".to_owned(),
            last_name: "Mokoena".to_owned(),
        })
        .await
        .unwrap();
    assert!(response.access_token.is_some());

    let current = mock.current_user().await.unwrap().unwrap();
    assert_eq!(current.email, "naledi@example.com");
}

#[tokio::test]
async fn registered_accounts_can_log_back_in() {
    let mock = mock_provider();
    mock.register(RegisterInput {
        email: "naledi@example.com".to_owned(),
        password: "longenough".to_owned(),
        first_name: "Naledi".to_owned(),
        last_name: "Mokoena".to_owned(),
    })
    .await
    .unwrap();
    mock.logout().await.unwrap();

    let response = mock
        .login(Credentials {
            email: "naledi@example.com".to_owned(),
            password: "longenough".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(response.user.first_name, "Naledi");
}

#[tokio::test]
async fn weak_registrations_are_rejected() {
    let mock = mock_provider();
    let bad_email = mock
        .register(RegisterInput {
            email: "not-an-email".to_owned(),
            password: "longenough".to_owned(),
            first_name: "X".to_owned(),
            last_name: "Y".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(bad_email, ApiError::Validation(_)));

    let short_password = mock
        .register(RegisterInput {
            email: "x@example.com".to_owned(),
            password: "short".to_owned(),
            first_name: "X".to_owned(),
            last_name: "Y".to_owned(),
        })
        .await
        .unwrap_err();
    assert!(matches!(short_password, ApiError::Validation(_)));
}

#[tokio::test]
async fn current_user_is_none_without_a_session() {
    let mock = mock_provider();
    assert!(mock.current_user().await.unwrap().is_none());
}
