use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::collections::{CollectionDto, CollectionList, CollectionRequest, UpdateCollectionRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    response::ApiResponse,
    services::collection_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_collections).post(create_collection))
        .route(
            "/{id}",
            get(get_collection)
                .patch(update_collection)
                .delete(delete_collection),
        )
}

#[utoipa::path(
    get,
    path = "/api/collections",
    responses(
        (status = 200, description = "Collections with product counts", body = ApiResponse<CollectionList>)
    ),
    tag = "Collections"
)]
pub async fn list_collections(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CollectionList>>> {
    let resp = collection_service::list_collections(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Get collection", body = ApiResponse<CollectionDto>),
        (status = 404, description = "Collection not found")
    ),
    tag = "Collections"
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CollectionDto>>> {
    let resp = collection_service::get_collection(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/collections",
    request_body = CollectionRequest,
    responses(
        (status = 201, description = "Create collection", body = ApiResponse<CollectionDto>),
        (status = 400, description = "Invalid title or featured product"),
        (status = 403, description = "Admin only")
    ),
    tag = "Collections"
)]
pub async fn create_collection(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CollectionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CollectionDto>>)> {
    let resp = collection_service::create_collection(&state, &user, payload).await?;
    Ok(resp.created())
}

#[utoipa::path(
    patch,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Updated collection", body = ApiResponse<CollectionDto>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Collection not found")
    ),
    tag = "Collections"
)]
pub async fn update_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCollectionRequest>,
) -> AppResult<Json<ApiResponse<CollectionDto>>> {
    let resp = collection_service::update_collection(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{id}",
    params(
        ("id" = Uuid, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Deleted collection", body = ApiResponse<CollectionDto>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Collection not found"),
        (status = 409, description = "Collection still has products")
    ),
    tag = "Collections"
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CollectionDto>>> {
    let resp = collection_service::delete_collection(&state, &user, id).await?;
    Ok(Json(resp))
}
