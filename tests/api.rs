mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use common::*;
use serde_json::{Value, json};
use storefront_api::{
    middleware::auth::{AuthUser, USER_ID_HEADER, USER_ROLE_HEADER},
    models::TaggedKind,
    routes::create_app,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&AuthUser>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header(USER_ID_HEADER, user.user_id.to_string())
            .header(USER_ROLE_HEADER, user.role.as_str());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn app(state: &AppState) -> Router {
    create_app(state.clone())
}

#[tokio::test]
async fn cart_to_order_over_http() {
    let (state, hook) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let b = seed_product(&state, "Beta", 500).await;
    let (user, _) = seed_customer(&state).await;
    let app = app(&state);

    let (status, body) = send(&app, Method::POST, "/api/carts", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = body["data"]["id"].as_str().unwrap().to_string();

    let items_uri = format!("/api/carts/{cart_id}/items");
    for (product, quantity) in [(&a, 2), (&b, 1)] {
        let (status, _) = send(
            &app,
            Method::POST,
            &items_uri,
            None,
            Some(json!({ "product_id": product.id, "quantity": quantity })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, &format!("/api/carts/{cart_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["item_count"], 2);
    assert_eq!(body["data"]["total_price"], "25.00");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&user),
        Some(json!({ "cart_id": cart_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["payment_status"], "pending");
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_price"], "25.00");
    assert_eq!(hook.calls(), 1);

    let (status, body) = send(&app, Method::GET, &format!("/api/carts/{cart_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "not_found");
}

#[tokio::test]
async fn checkout_errors_map_to_client_statuses() {
    let (state, _) = memory_state();
    let (user, _) = seed_customer(&state).await;
    let empty = seed_cart(&state, &[]).await;
    let app = app(&state);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&user),
        Some(json!({ "cart_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&user),
        Some(json!({ "cart_id": empty.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "empty_cart");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(json!({ "cart_id": empty.id })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["code"], "unauthorized");
}

#[tokio::test]
async fn unknown_product_in_cart_add_is_a_validation_error() {
    let (state, _) = memory_state();
    let cart = seed_cart(&state, &[]).await;
    let app = app(&state);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/carts/{}/items", cart.id),
        None,
        Some(json!({ "product_id": Uuid::new_v4(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");
}

#[tokio::test]
async fn catalog_mutations_require_admin() {
    let (state, _) = memory_state();
    let app = app(&state);
    let shopper = AuthUser::new(Uuid::new_v4());
    let admin = AuthUser::admin(Uuid::new_v4());
    let payload = json!({
        "title": "Ferris Mug",
        "unit_price": "12.00",
        "inventory": 5
    });

    let (status, body) = send(&app, Method::POST, "/api/products", Some(&shopper), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["code"], "forbidden");

    let (status, body) = send(&app, Method::POST, "/api/products", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "ferris-mug");
    assert_eq!(body["data"]["price_with_tax"], "13.20");

    let (status, body) = send(&app, Method::GET, "/api/products?q=ferris&max_price=20", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) = send(&app, Method::GET, "/api/products?min_price=12", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn tags_and_likes_are_idempotent() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let app = app(&state);
    let admin = AuthUser::admin(Uuid::new_v4());
    let shopper = AuthUser::new(Uuid::new_v4());

    let tags_uri = format!("/api/tags/product/{}", a.id);
    for _ in 0..2 {
        let (status, _) = send(&app, Method::POST, &tags_uri, Some(&admin), Some(json!({ "label": "sale" }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, body) = send(&app, Method::GET, &tags_uri, None, None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let likes_uri = format!("/api/likes/product/{}", a.id);
    for _ in 0..2 {
        let (status, body) = send(&app, Method::POST, &likes_uri, Some(&shopper), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 1);
        assert_eq!(body["data"]["liked_by_me"], true);
    }

    let (_, body) = send(&app, Method::GET, &likes_uri, None, None).await;
    assert_eq!(body["data"]["liked_by_me"], false);

    let (status, _) = send(&app, Method::DELETE, &likes_uri, Some(&shopper), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &likes_uri, Some(&shopper), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "not_found");

    let (status, body) = send(&app, Method::GET, &format!("/api/likes/invoice/{}", a.id), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");
}

#[tokio::test]
async fn customer_profile_round_trip_and_request_id() {
    let (state, _) = memory_state();
    let app = app(&state);
    let user = AuthUser::new(Uuid::new_v4());

    let (status, _) = send(&app, Method::GET, "/api/customers/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/customers/me",
        Some(&user),
        Some(json!({ "phone": "555-0199", "membership": "gold" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["membership"], "gold");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn cart_items_can_be_read_changed_and_removed() {
    let (state, _) = memory_state();
    let a = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[(&a, 1)]).await;
    let app = app(&state);

    let items_uri = format!("/api/carts/{}/items", cart.id);
    let (status, body) = send(&app, Method::GET, &items_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let item_id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();
    let item_uri = format!("{items_uri}/{item_id}");

    let (status, body) = send(&app, Method::PATCH, &item_uri, None, Some(json!({ "quantity": 4 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 4);
    assert_eq!(body["data"]["total_price"], "40.00");

    let (status, body) = send(&app, Method::PATCH, &item_uri, None, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");

    let (status, body) = send(&app, Method::GET, &item_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["title"], "Alpha");

    let (status, _) = send(&app, Method::DELETE, &item_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &item_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/carts/{}", cart.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &items_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bodies_come_back_as_validation_errors() {
    let (state, _) = memory_state();
    let product = seed_product(&state, "Alpha", 1000).await;
    let cart = seed_cart(&state, &[]).await;
    let (user, _) = seed_customer(&state).await;
    let app = app(&state);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/carts/{}/items", cart.id),
        None,
        Some(json!({ "product_id": product.id, "quantity": "two" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");
    assert!(body["data"]["error"].as_str().unwrap().contains("quantity"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&user),
        Some(json!({ "cart_id": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");

    let admin = AuthUser::admin(Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/orders/{}", Uuid::new_v4()),
        Some(&admin),
        Some(json!({ "payment_status": "refunded" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let (state, _) = memory_state();
    seed_product(&state, "Alpha", 1000).await;
    let app = app(&state);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/products?page=9223372036854775807&per_page=100",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn collections_filter_products_and_protect_their_members() {
    let (state, _) = memory_state();
    let app = app(&state);
    let admin = AuthUser::admin(Uuid::new_v4());
    seed_product(&state, "Loose Spoon", 300).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/collections",
        Some(&admin),
        Some(json!({ "title": "Kitchen" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["product_count"], 0);
    let kitchen = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "title": "Kettle",
            "unit_price": "30.00",
            "inventory": 5,
            "collection_id": kitchen
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["collection_id"], kitchen.as_str());
    let kettle = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/products?collection_id={kitchen}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], kettle.as_str());

    let (_, body) = send(&app, Method::GET, "/api/collections", None, None).await;
    assert_eq!(body["data"]["items"][0]["product_count"], 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/collections/{kitchen}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], "conflict");

    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{kettle}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/collections/{kitchen}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_collection_on_product_create_is_a_validation_error() {
    let (state, _) = memory_state();
    let app = app(&state);
    let admin = AuthUser::admin(Uuid::new_v4());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&admin),
        Some(json!({
            "title": "Kettle",
            "unit_price": "30.00",
            "inventory": 5,
            "collection_id": Uuid::new_v4()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["code"], "validation_error");
}

#[tokio::test]
async fn reviews_live_under_their_product() {
    let (state, _) = memory_state();
    let mug = seed_product(&state, "Mug", 1200).await;
    let other = seed_product(&state, "Plate", 800).await;
    let app = app(&state);
    let admin = AuthUser::admin(Uuid::new_v4());
    let reviews_uri = format!("/api/products/{}/reviews", mug.id);

    let (status, body) = send(
        &app,
        Method::POST,
        &reviews_uri,
        None,
        Some(json!({ "name": "Ana", "description": "Keeps coffee warm" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["product_id"], mug.id.to_string());
    let review_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, &reviews_uri, None, None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/products/{}/reviews/{review_id}", other.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/products/{}/reviews", Uuid::new_v4()),
        None,
        Some(json!({ "name": "Ana", "description": "Lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "not_found");

    let review_uri = format!("{reviews_uri}/{review_id}");
    let (status, _) = send(
        &app,
        Method::PATCH,
        &review_uri,
        Some(&AuthUser::new(Uuid::new_v4())),
        Some(json!({ "description": "Edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &review_uri,
        Some(&admin),
        Some(json!({ "description": "Edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Edited");

    let (status, _) = send(&app, Method::DELETE, &review_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &review_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_product_drops_its_tags_and_likes() {
    let (state, _) = memory_state();
    let mug = seed_product(&state, "Mug", 1200).await;
    let app = app(&state);
    let admin = AuthUser::admin(Uuid::new_v4());
    let shopper = AuthUser::new(Uuid::new_v4());

    let tags_uri = format!("/api/tags/product/{}", mug.id);
    let likes_uri = format!("/api/likes/product/{}", mug.id);
    send(&app, Method::POST, &tags_uri, Some(&admin), Some(json!({ "label": "sale" }))).await;
    send(&app, Method::POST, &likes_uri, Some(&shopper), None).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{}", mug.id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut uow = state.store.begin().await.unwrap();
    assert!(uow.tags().tags_for(TaggedKind::Product, mug.id).await.unwrap().is_empty());
    assert_eq!(uow.likes().count(TaggedKind::Product, mug.id).await.unwrap(), 0);
}
