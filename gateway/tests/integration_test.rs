//! Integration tests for gateway with auth and checkout-service
//!
//! These tests verify the InProcess call integration between the gateway,
//! the auth library and the checkout service.

use std::sync::Arc;

use auth::{InMemoryUserStore, TokenConfig, User};
use checkout_service::{AllAvailable, Cart, CartLine, CheckoutRequest, FormData, StepPage};
use error::AuthError;
use gateway_lib::{GatewayConfig, ServiceRouter};
use http::header::{AUTHORIZATION, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode};

fn setup() -> (ServiceRouter, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::new());
    let config = GatewayConfig::new(TokenConfig::new("integration-secret"));
    let router = ServiceRouter::new(&config, users.clone(), Arc::new(AllAvailable));
    (router, users)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("JWT {}", token)).unwrap());
    headers
}

fn form(fields: &[(&str, &str)]) -> FormData {
    fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn cart() -> Cart {
    Cart::new("cart-42")
        .with_line(CartLine::new("MUG", 2))
        .with_line(CartLine::new("EBOOK", 1).digital())
}

#[tokio::test]
async fn test_issue_and_authenticate() {
    let (router, users) = setup();
    let user = User::new(1, "staff@example.com")
        .with_staff(true)
        .with_permissions(vec!["MANAGE_ORDERS".to_string()]);
    users.upsert(user.clone()).unwrap();

    let pair = router.issue_tokens(&user).unwrap();
    let authenticated = router.authenticate(&bearer(&pair.token)).await.unwrap();
    assert_eq!(authenticated, Some(user.clone()));

    let claims = router.auth().codec().decode(&pair.token).unwrap();
    assert!(claims.has_permission("MANAGE_ORDERS"));

    let refresh = router.auth().codec().decode(&pair.refresh_token).unwrap();
    assert_eq!(refresh.permissions, None);
    assert_eq!(refresh.user_id, user.global_id());
}

#[tokio::test]
async fn test_failure_taxonomy() {
    let (router, users) = setup();
    let user = User::new(2, "buyer@example.com");

    // No credential
    assert_eq!(router.authenticate(&HeaderMap::new()).await, Ok(None));

    // Wrong scheme is treated as no credential
    let mut basic = HeaderMap::new();
    basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
    assert_eq!(router.authenticate(&basic).await, Ok(None));

    // Valid token, principal gone
    let pair = router.issue_tokens(&user).unwrap();
    assert_eq!(
        router.authenticate(&bearer(&pair.token)).await,
        Err(AuthError::UserNotFound)
    );

    // Token from another deployment
    users.upsert(user.clone()).unwrap();
    let foreign = auth::TokenCodec::new(TokenConfig::new("other-secret"))
        .create_access_token(&user, None)
        .unwrap();
    assert_eq!(
        router.authenticate(&bearer(&foreign)).await,
        Err(AuthError::InvalidSignature)
    );
}

#[tokio::test]
async fn test_refresh_cookie_round_trip() {
    let (router, users) = setup();
    let user = User::new(3, "buyer@example.com");
    users.upsert(user.clone()).unwrap();

    let response = router.token_response(&user);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    let cookie_pair = set_cookie.split(';').next().unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(http::header::COOKIE, HeaderValue::from_str(cookie_pair).unwrap());
    assert_eq!(router.auth().authenticate_refresh(&headers).await, Ok(Some(user)));
}

#[tokio::test]
async fn test_checkout_walkthrough() {
    let (router, _) = setup();
    let submit = |fields: FormData| CheckoutRequest::submit(Some(cart()), fields);

    let response = router.checkout(None, CheckoutRequest::view(Some(cart()))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/checkout/shipping-address/");

    let response = router
        .checkout(
            Some("shipping-address"),
            submit(form(&[
                ("first_name", "Ada"),
                ("last_name", "Lovelace"),
                ("street_address", "1 Main St"),
                ("city", "London"),
                ("postal_code", "N1"),
                ("country", "GB"),
            ])),
        )
        .await;
    assert_eq!(response.headers()[LOCATION], "/checkout/shipping-method/");

    let response = router.checkout(Some("shipping-method"), CheckoutRequest::view(Some(cart()))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: StepPage = serde_json::from_str(response.body()).unwrap();
    assert_eq!(page.context["methods"].as_array().map(|m| m.len()), Some(2));

    let response = router
        .checkout(Some("shipping-method"), submit(form(&[("method", "express")])))
        .await;
    assert_eq!(response.headers()[LOCATION], "/checkout/payment/");

    let response = router
        .checkout(
            Some("payment"),
            submit(form(&[("method", "card"), ("email", "buyer@example.com")])),
        )
        .await;
    assert_eq!(response.headers()[LOCATION], "/checkout/summary/");

    let response = router.checkout(Some("summary"), submit(FormData::new())).await;
    assert_eq!(response.headers()[LOCATION], "/checkout/confirmation/");

    let response = router.checkout(None, CheckoutRequest::view(Some(cart()))).await;
    assert_eq!(response.headers()[LOCATION], "/checkout/confirmation/");
}

#[tokio::test]
async fn test_checkout_with_empty_cart() {
    let (router, _) = setup();

    for step in [None, Some("payment"), Some("no-such-step")] {
        let response = router
            .checkout(step, CheckoutRequest::view(Some(Cart::new("empty"))))
            .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/cart/");
    }
}
