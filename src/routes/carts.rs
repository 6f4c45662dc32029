use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartDto, CartItemDto, CartItemList, UpdateCartItemRequest},
    error::{AppError, AppResult, Resource},
    middleware::json::AppJson,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_cart))
        .route("/{cart_id}", get(get_cart).delete(delete_cart))
        .route("/{cart_id}/items", get(list_items).post(add_item))
        .route(
            "/{cart_id}/items/{item_id}",
            get(get_item).patch(update_item).delete(remove_item),
        )
}

#[utoipa::path(
    post,
    path = "/api/carts",
    responses(
        (status = 201, description = "Empty cart created", body = ApiResponse<CartDto>)
    ),
    tag = "Carts"
)]
pub async fn create_cart(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartDto>>)> {
    let resp = cart_service::create_cart(&state).await?;
    Ok(resp.created())
}

#[utoipa::path(
    get,
    path = "/api/carts/{cart_id}",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart with its items and total", body = ApiResponse<CartDto>),
        (status = 404, description = "Cart not found")
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::get_cart(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/carts/{cart_id}",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Cart and its items deleted", body = ApiResponse<CartDto>),
        (status = 404, description = "Cart not found")
    ),
    tag = "Carts"
)]
pub async fn delete_cart(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::delete_cart(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/carts/{cart_id}/items",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    responses(
        (status = 200, description = "Items in the cart", body = ApiResponse<CartItemList>),
        (status = 404, description = "Cart not found")
    ),
    tag = "Carts"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartItemList>>> {
    let resp = cart_service::list_items(&state, cart_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/carts/{cart_id}/items",
    params(("cart_id" = Uuid, Path, description = "Cart ID")),
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Item added, or quantity increased", body = ApiResponse<CartItemDto>),
        (status = 400, description = "Invalid quantity or unknown product"),
        (status = 404, description = "Cart not found")
    ),
    tag = "Carts"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    AppJson(payload): AppJson<AddCartItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartItemDto>>)> {
    let resp = cart_service::add_item(&state, cart_id, payload)
        .await
        .map_err(|err| match err {
            AppError::NotFound(Resource::Product) => err.into_field_error("product_id"),
            other => other,
        })?;
    Ok(resp.created())
}

#[utoipa::path(
    get,
    path = "/api/carts/{cart_id}/items/{item_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart ID"),
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Cart item", body = ApiResponse<CartItemDto>),
        (status = 404, description = "Cart or item not found")
    ),
    tag = "Carts"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<CartItemDto>>> {
    let resp = cart_service::get_item(&state, cart_id, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/carts/{cart_id}/items/{item_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart ID"),
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<CartItemDto>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Cart or item not found")
    ),
    tag = "Carts"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItemDto>>> {
    let resp = cart_service::update_item(&state, cart_id, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/carts/{cart_id}/items/{item_id}",
    params(
        ("cart_id" = Uuid, Path, description = "Cart ID"),
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<CartItemDto>),
        (status = 404, description = "Cart or item not found")
    ),
    tag = "Carts"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<CartItemDto>>> {
    let resp = cart_service::remove_item(&state, cart_id, item_id).await?;
    Ok(Json(resp))
}
