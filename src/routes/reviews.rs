use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{ReviewList, ReviewRequest, UpdateReviewRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

// Mounted under `/products`; the segment name matches the product routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/reviews", get(list_reviews).post(create_review))
        .route(
            "/{id}/reviews/{review_id}",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reviews of the product", body = ApiResponse<ReviewList>),
        (status = 404, description = "Product not found")
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Blank name or description"),
        (status = 404, description = "Product not found")
    ),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    AppJson(payload): AppJson<ReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::create_review(&state, product_id, payload).await?;
    Ok(resp.created())
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/reviews/{review_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("review_id" = Uuid, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Get review", body = ApiResponse<Review>),
        (status = 404, description = "Product or review not found")
    ),
    tag = "Reviews"
)]
pub async fn get_review(
    State(state): State<AppState>,
    Path((product_id, review_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::get_review(&state, product_id, review_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/reviews/{review_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("review_id" = Uuid, Path, description = "Review ID")
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, description = "Updated review", body = ApiResponse<Review>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Product or review not found")
    ),
    tag = "Reviews"
)]
pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path((product_id, review_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::update_review(&state, &user, product_id, review_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/reviews/{review_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("review_id" = Uuid, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Deleted review", body = ApiResponse<Review>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Product or review not found")
    ),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path((product_id, review_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::delete_review(&state, &user, product_id, review_id).await?;
    Ok(Json(resp))
}
