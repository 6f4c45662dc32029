use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::reviews::{ReviewList, ReviewRequest, UpdateReviewRequest},
    error::{AppError, AppResult, Resource},
    middleware::auth::{AuthUser, ensure_admin},
    models::Review,
    repository::{ReviewChanges, UnitOfWork},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 255 {
        return Err(AppError::Validation(
            "name must be between 1 and 255 characters".into(),
        ));
    }
    Ok(name.to_string())
}

fn validate_description(description: &str) -> AppResult<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("description must not be empty".into()));
    }
    Ok(description.to_string())
}

async fn ensure_product(uow: &mut dyn UnitOfWork, product_id: Uuid) -> AppResult<()> {
    if uow.products().find(product_id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Product));
    }
    Ok(())
}

async fn load(uow: &mut dyn UnitOfWork, product_id: Uuid, review_id: Uuid) -> AppResult<Review> {
    ensure_product(uow, product_id).await?;
    uow.reviews()
        .find(product_id, review_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Review))
}

pub async fn list_reviews(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<ReviewList>> {
    let mut uow = state.store.begin().await?;
    ensure_product(uow.as_mut(), product_id).await?;
    let items = uow.reviews().for_product(product_id).await?;
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_review(
    state: &AppState,
    product_id: Uuid,
    review_id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    let mut uow = state.store.begin().await?;
    let review = load(uow.as_mut(), product_id, review_id).await?;
    Ok(ApiResponse::success("Review", review, None))
}

/// Anyone may review a product; the date is today's.
pub async fn create_review(
    state: &AppState,
    product_id: Uuid,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let review = Review {
        id: Uuid::new_v4(),
        product_id,
        name: validate_name(&payload.name)?,
        description: validate_description(&payload.description)?,
        date: Utc::now().date_naive(),
    };

    let mut uow = state.store.begin().await?;
    ensure_product(uow.as_mut(), product_id).await?;
    let review = uow.reviews().insert(review).await?;
    uow.commit().await?;

    tracing::debug!(review_id = %review.id, %product_id, "review created");
    Ok(ApiResponse::success("Review created", review, None))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    review_id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;

    let changes = ReviewChanges {
        name: payload.name.as_deref().map(validate_name).transpose()?,
        description: payload
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
    };

    let mut uow = state.store.begin().await?;
    load(uow.as_mut(), product_id, review_id).await?;
    let review = uow.reviews().update(review_id, changes).await?;
    uow.commit().await?;

    Ok(ApiResponse::success("Review updated", review, None))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    review_id: Uuid,
) -> AppResult<ApiResponse<Review>> {
    ensure_admin(user)?;

    let mut uow = state.store.begin().await?;
    let review = load(uow.as_mut(), product_id, review_id).await?;
    uow.reviews().delete(review_id).await?;
    uow.commit().await?;

    tracing::info!(%review_id, %product_id, admin = %user.user_id, "review deleted");
    Ok(ApiResponse::success("Review deleted", review, None))
}
