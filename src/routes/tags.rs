use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::tags::{AddTagRequest, TagList},
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Tag,
    response::ApiResponse,
    routes::params::parse_kind,
    services::tag_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{kind}/{object_id}", get(list_tags).post(add_tag))
        .route("/{kind}/{object_id}/{tag_id}", delete(remove_tag))
}

#[utoipa::path(
    get,
    path = "/api/tags/{kind}/{object_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Tagged object ID")
    ),
    responses(
        (status = 200, description = "Tags on the object", body = ApiResponse<TagList>),
        (status = 404, description = "Object not found")
    ),
    tag = "Tags"
)]
pub async fn list_tags(
    State(state): State<AppState>,
    Path((kind, object_id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<TagList>>> {
    let kind = parse_kind(&kind)?;
    let resp = tag_service::tags_for(&state, kind, object_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tags/{kind}/{object_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Tagged object ID")
    ),
    request_body = AddTagRequest,
    responses(
        (status = 201, description = "Tag attached", body = ApiResponse<Tag>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Object not found")
    ),
    tag = "Tags"
)]
pub async fn add_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id)): Path<(String, Uuid)>,
    AppJson(payload): AppJson<AddTagRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tag>>)> {
    let kind = parse_kind(&kind)?;
    let resp = tag_service::add_tag(&state, &user, kind, object_id, payload).await?;
    Ok(resp.created())
}

#[utoipa::path(
    delete,
    path = "/api/tags/{kind}/{object_id}/{tag_id}",
    params(
        ("kind" = String, Path, description = "product, order or customer"),
        ("object_id" = Uuid, Path, description = "Tagged object ID"),
        ("tag_id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag detached", body = ApiResponse<Tag>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Tag not attached to the object")
    ),
    tag = "Tags"
)]
pub async fn remove_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, object_id, tag_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Tag>>> {
    let kind = parse_kind(&kind)?;
    let resp = tag_service::remove_tag(&state, &user, kind, object_id, tag_id).await?;
    Ok(Json(resp))
}
