use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::tags::LikeSummary,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::parse_kind,
    services::like_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{kind}/{object_id}",
        get(get_likes).post(like).delete(unlike),
    )
}

#[utoipa::path(
    get,
    path = "/api/likes/{kind}/{object_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Liked object ID")
    ),
    responses(
        (status = 200, description = "Like count; `liked_by_me` needs a caller identity", body = ApiResponse<LikeSummary>),
        (status = 404, description = "Object not found")
    ),
    tag = "Likes"
)]
pub async fn get_likes(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path((kind, object_id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let kind = parse_kind(&kind)?;
    let resp = like_service::likes_for(&state, user.as_ref(), kind, object_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/likes/{kind}/{object_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Liked object ID")
    ),
    responses(
        (status = 200, description = "Liked; repeating is a no-op", body = ApiResponse<LikeSummary>),
        (status = 404, description = "Object not found")
    ),
    tag = "Likes"
)]
pub async fn like(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let kind = parse_kind(&kind)?;
    let resp = like_service::like(&state, &user, kind, object_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/likes/{kind}/{object_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Liked object ID")
    ),
    responses(
        (status = 200, description = "Like removed", body = ApiResponse<LikeSummary>),
        (status = 404, description = "Caller had not liked the object")
    ),
    tag = "Likes"
)]
pub async fn unlike(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<LikeSummary>>> {
    let kind = parse_kind(&kind)?;
    let resp = like_service::unlike(&state, &user, kind, object_id).await?;
    Ok(Json(resp))
}
