use uuid::Uuid;

use crate::{
    dto::tags::{AddTagRequest, TagList},
    error::{AppError, AppResult, Resource},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Tag, TaggedKind},
    repository::UnitOfWork,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Fail with `NotFound` unless `(kind, object_id)` names a stored entity.
pub(crate) async fn ensure_target(
    uow: &mut dyn UnitOfWork,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<()> {
    let found = match kind {
        TaggedKind::Product => uow.products().find(object_id).await?.is_some(),
        TaggedKind::Order => uow.orders().find(object_id).await?.is_some(),
        TaggedKind::Customer => uow.customers().find(object_id).await?.is_some(),
    };
    if !found {
        let resource = match kind {
            TaggedKind::Product => Resource::Product,
            TaggedKind::Order => Resource::Order,
            TaggedKind::Customer => Resource::Customer,
        };
        return Err(AppError::NotFound(resource));
    }
    Ok(())
}

pub async fn tags_for(
    state: &AppState,
    kind: TaggedKind,
    object_id: Uuid,
) -> AppResult<ApiResponse<TagList>> {
    let mut uow = state.store.begin().await?;
    ensure_target(uow.as_mut(), kind, object_id).await?;
    let items = uow.tags().tags_for(kind, object_id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        TagList {
            kind,
            object_id,
            items,
        },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn add_tag(
    state: &AppState,
    user: &AuthUser,
    kind: TaggedKind,
    object_id: Uuid,
    payload: AddTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;

    let label = payload.label.trim();
    if label.is_empty() || label.chars().count() > 255 {
        return Err(AppError::Validation(
            "label must be between 1 and 255 characters".into(),
        ));
    }

    let mut uow = state.store.begin().await?;
    ensure_target(uow.as_mut(), kind, object_id).await?;
    let tag = uow.tags().find_or_create(label).await?;
    uow.tags().attach(tag.id, kind, object_id).await?;
    uow.commit().await?;

    tracing::debug!(tag_id = %tag.id, %kind, %object_id, "tag attached");
    Ok(ApiResponse::success("Tag added", tag, Some(Meta::empty())))
}

pub async fn remove_tag(
    state: &AppState,
    user: &AuthUser,
    kind: TaggedKind,
    object_id: Uuid,
    tag_id: Uuid,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;

    let mut uow = state.store.begin().await?;
    let tag = uow
        .tags()
        .find(tag_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Tag))?;
    if !uow.tags().detach(tag_id, kind, object_id).await? {
        return Err(AppError::NotFound(Resource::Tag));
    }
    uow.commit().await?;

    Ok(ApiResponse::success("Tag removed", tag, Some(Meta::empty())))
}
