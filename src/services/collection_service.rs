use uuid::Uuid;

use crate::{
    dto::collections::{CollectionDto, CollectionList, CollectionRequest, UpdateCollectionRequest},
    error::{AppError, AppResult, Resource},
    middleware::auth::{AuthUser, ensure_admin},
    models::Collection,
    repository::{CollectionChanges, UnitOfWork},
    response::{ApiResponse, Meta},
    services::catalog_service::validate_title,
    state::AppState,
};

async fn ensure_featured(uow: &mut dyn UnitOfWork, id: Option<Uuid>) -> AppResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if uow.products().find(id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Product).into_field_error("featured_product_id"));
    }
    Ok(())
}

async fn load(uow: &mut dyn UnitOfWork, id: Uuid) -> AppResult<Collection> {
    uow.collections()
        .find(id)
        .await?
        .ok_or(AppError::NotFound(Resource::Collection))
}

pub async fn list_collections(state: &AppState) -> AppResult<ApiResponse<CollectionList>> {
    let mut uow = state.store.begin().await?;
    let items: Vec<CollectionDto> = uow
        .collections()
        .list()
        .await?
        .into_iter()
        .map(|(collection, count)| CollectionDto::new(collection, count))
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Collections",
        CollectionList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_collection(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CollectionDto>> {
    let mut uow = state.store.begin().await?;
    let collection = load(uow.as_mut(), id).await?;
    let count = uow.collections().product_count(id).await?;
    Ok(ApiResponse::success(
        "Collection",
        CollectionDto::new(collection, count),
        None,
    ))
}

pub async fn create_collection(
    state: &AppState,
    user: &AuthUser,
    payload: CollectionRequest,
) -> AppResult<ApiResponse<CollectionDto>> {
    ensure_admin(user)?;

    let collection = Collection {
        id: Uuid::new_v4(),
        title: validate_title(&payload.title)?,
        featured_product_id: payload.featured_product_id,
    };

    let mut uow = state.store.begin().await?;
    ensure_featured(uow.as_mut(), collection.featured_product_id).await?;
    let collection = uow.collections().insert(collection).await?;
    uow.commit().await?;

    tracing::info!(collection_id = %collection.id, admin = %user.user_id, "collection created");
    Ok(ApiResponse::success(
        "Collection created",
        CollectionDto::new(collection, 0),
        None,
    ))
}

pub async fn update_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCollectionRequest,
) -> AppResult<ApiResponse<CollectionDto>> {
    ensure_admin(user)?;

    let changes = CollectionChanges {
        title: payload.title.as_deref().map(validate_title).transpose()?,
        featured_product_id: payload.featured_product_id,
    };

    let mut uow = state.store.begin().await?;
    load(uow.as_mut(), id).await?;
    ensure_featured(uow.as_mut(), changes.featured_product_id).await?;
    let collection = uow.collections().update(id, changes).await?;
    let count = uow.collections().product_count(id).await?;
    uow.commit().await?;

    tracing::info!(collection_id = %id, admin = %user.user_id, "collection updated");
    Ok(ApiResponse::success(
        "Collection updated",
        CollectionDto::new(collection, count),
        None,
    ))
}

pub async fn delete_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CollectionDto>> {
    ensure_admin(user)?;

    let mut uow = state.store.begin().await?;
    let collection = load(uow.as_mut(), id).await?;
    if uow.collections().product_count(id).await? > 0 {
        return Err(AppError::Conflict(
            "Collection cannot be deleted because it is associated with a product.".into(),
        ));
    }
    uow.collections().delete(id).await?;
    uow.commit().await?;

    tracing::info!(collection_id = %id, admin = %user.user_id, "collection deleted");
    Ok(ApiResponse::success(
        "Collection deleted",
        CollectionDto::new(collection, 0),
        None,
    ))
}
