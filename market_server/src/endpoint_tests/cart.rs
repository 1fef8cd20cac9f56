use actix_web::{http::StatusCode, web, web::ServiceConfig};
use market_engine::{
    db_types::{CartLine, ProductId},
    traits::CartApiError,
    CartApi,
};
use serde_json::json;

use super::{
    helpers::{delete_request, get_request, json, post_request, put_request, user_token},
    mocks::{catalog_entry, MockBackend},
};
use crate::routes::{AddCartItemRoute, ClearCartRoute, MyCartRoute, RemoveCartItemRoute, UpdateCartItemRoute};

fn configure(backend: MockBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(CartApi::new(backend)))
            .service(MyCartRoute::<MockBackend>::new())
            .service(ClearCartRoute::<MockBackend>::new())
            .service(AddCartItemRoute::<MockBackend>::new())
            .service(UpdateCartItemRoute::<MockBackend>::new())
            .service(RemoveCartItemRoute::<MockBackend>::new());
    }
}

fn empty_cart(backend: &mut MockBackend) {
    backend.expect_fetch_cart_snapshot().returning(|_| Ok(vec![]));
}

#[actix_web::test]
async fn fetch_cart_without_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/cart", configure(MockBackend::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn fetch_cart_with_live_prices() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_fetch_cart_snapshot()
        .withf(|user_id| user_id.as_str() == "alice")
        .returning(|_| Ok(vec![CartLine::new(ProductId(1), 2), CartLine::new(ProductId(2), 1)]));
    backend.expect_resolve().returning(|id| match id.value() {
        1 => Ok(Some(catalog_entry(1, 1250, true))),
        _ => Ok(Some(catalog_entry(2, 999, false))),
    });
    let (status, body) = get_request(&user_token("alice"), "/cart", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    let cart = json(&body);
    assert_eq!(cart["total"], 2500);
    assert_eq!(cart["lines"][0]["line_total"], 2500);
    assert_eq!(cart["lines"][1]["is_available"], false);
    assert_eq!(cart["lines"][1]["line_total"], 999);
}

#[actix_web::test]
async fn add_item_to_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_resolve().returning(|_| Ok(Some(catalog_entry(3, 400, true))));
    backend
        .expect_add_item()
        .withf(|user_id, line| user_id.as_str() == "alice" && *line == CartLine::new(ProductId(3), 2))
        .times(1)
        .returning(|_, line| Ok(line));
    backend.expect_fetch_cart_snapshot().returning(|_| Ok(vec![CartLine::new(ProductId(3), 2)]));
    let body = json!({"product_id": 3, "quantity": 2});
    let (status, body) = post_request(&user_token("alice"), "/cart/items", body, configure(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["total"], 800);
}

#[actix_web::test]
async fn add_item_defaults_to_one() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_resolve().returning(|_| Ok(Some(catalog_entry(3, 400, true))));
    backend.expect_add_item().withf(|_, line| line.quantity == 1).times(1).returning(|_, line| Ok(line));
    empty_cart(&mut backend);
    let body = json!({"product_id": 3});
    let (status, _) = post_request(&user_token("alice"), "/cart/items", body, configure(backend)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn add_unavailable_item() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_resolve().returning(|_| Ok(Some(catalog_entry(3, 400, false))));
    backend.expect_add_item().never();
    let body = json!({"product_id": 3, "quantity": 1});
    let (status, body) = post_request(&user_token("alice"), "/cart/items", body, configure(backend)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Product 3 is not available"}"#);
}

#[actix_web::test]
async fn add_unknown_item() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_resolve().returning(|_| Ok(None));
    let body = json!({"product_id": 99, "quantity": 1});
    let (status, _) = post_request(&user_token("alice"), "/cart/items", body, configure(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn add_zero_items() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_resolve().never();
    let body = json!({"product_id": 3, "quantity": 0});
    let (status, body) = post_request(&user_token("alice"), "/cart/items", body, configure(backend)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Quantity must be at least 1, got 0"}"#);
}

#[actix_web::test]
async fn update_quantity() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_set_item_quantity()
        .withf(|_, line| *line == CartLine::new(ProductId(3), 5))
        .times(1)
        .returning(|_, line| Ok(line));
    backend.expect_fetch_cart_snapshot().returning(|_| Ok(vec![CartLine::new(ProductId(3), 5)]));
    backend.expect_resolve().returning(|_| Ok(Some(catalog_entry(3, 100, true))));
    let body = json!({"quantity": 5});
    let (status, body) = put_request(&user_token("alice"), "/cart/items/3", body, configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["total"], 500);
}

#[actix_web::test]
async fn update_quantity_to_zero_removes_the_line() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_set_item_quantity().never();
    backend.expect_remove_item().withf(|_, id| *id == ProductId(3)).times(1).returning(|_, _| Ok(()));
    empty_cart(&mut backend);
    let body = json!({"quantity": 0});
    let (status, body) = put_request(&user_token("alice"), "/cart/items/3", body, configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"lines":[],"total":0}"#);
}

#[actix_web::test]
async fn remove_item() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_remove_item().withf(|_, id| *id == ProductId(3)).times(1).returning(|_, _| Ok(()));
    empty_cart(&mut backend);
    let (status, _) = delete_request(&user_token("alice"), "/cart/items/3", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn clear_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_clear_cart().withf(|user_id| user_id.as_str() == "bob").times(1).returning(|_| Ok(2));
    let (status, body) = delete_request(&user_token("bob"), "/cart", configure(backend)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"2 items removed from the cart."}"#);
}

#[actix_web::test]
async fn remove_item_not_in_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_remove_item().returning(|_, id| Err(CartApiError::ItemNotInCart(id)));
    backend.expect_fetch_cart_snapshot().never();
    let (status, body) = delete_request(&user_token("alice"), "/cart/items/4", configure(backend)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Product 4 is not in the cart"}"#);
}
