use uuid::Uuid;

use crate::{
    dto::tags::LikeSummary,
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::TaggedKind,
    repository::UnitOfWork,
    response::{ApiResponse, Meta},
    services::tag_service::ensure_target,
    state::AppState,
};

async fn summary(
    uow: &mut dyn UnitOfWork,
    user: Option<&AuthUser>,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<LikeSummary> {
    let count = uow.likes().count(kind, object_id).await?;
    let liked_by_me = match user {
        Some(user) => uow.likes().exists(user.user_id, kind, object_id).await?,
        None => false,
    };
    Ok(LikeSummary {
        kind,
        object_id,
        count,
        liked_by_me,
    })
}

/// Like count of an object, plus whether the caller (if known) liked it.
pub async fn likes_for(
    state: &AppState,
    user: Option<&AuthUser>,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<ApiResponse<LikeSummary>> {
    let mut uow = state.store.begin().await?;
    ensure_target(uow.as_mut(), kind, object_id).await?;
    let data = summary(uow.as_mut(), user, kind, object_id).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn like(
    state: &AppState,
    user: &AuthUser,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<ApiResponse<LikeSummary>> {
    let mut uow = state.store.begin().await?;
    ensure_target(uow.as_mut(), kind, object_id).await?;
    uow.likes().like(user.user_id, kind, object_id).await?;
    let data = summary(uow.as_mut(), Some(user), kind, object_id).await?;
    uow.commit().await?;

    Ok(ApiResponse::success("Liked", data, Some(Meta::empty())))
}

pub async fn unlike(
    state: &AppState,
    user: &AuthUser,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<ApiResponse<LikeSummary>> {
    let mut uow = state.store.begin().await?;
    if !uow.likes().unlike(user.user_id, kind, object_id).await? {
        return Err(AppError::NotFound(Resource::Like));
    }
    let data = summary(uow.as_mut(), Some(user), kind, object_id).await?;
    uow.commit().await?;

    Ok(ApiResponse::success("Unliked", data, Some(Meta::empty())))
}
