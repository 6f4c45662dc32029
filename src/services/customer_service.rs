use crate::{
    dto::customers::CustomerProfileRequest,
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::Customer,
    repository::CustomerProfile,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Customer>> {
    let mut uow = state.store.begin().await?;
    let customer = uow
        .customers()
        .find_by_user(user.user_id)
        .await?
        .ok_or(AppError::NotFound(Resource::Customer))?;
    Ok(ApiResponse::success("OK", customer, Some(Meta::empty())))
}

/// Create the caller's customer profile, or replace it when it exists.
pub async fn upsert_me(
    state: &AppState,
    user: &AuthUser,
    payload: CustomerProfileRequest,
) -> AppResult<ApiResponse<Customer>> {
    let phone = payload.phone.trim();
    if phone.is_empty() || phone.len() > 255 {
        return Err(AppError::Validation(
            "phone must be between 1 and 255 characters".into(),
        ));
    }

    let profile = CustomerProfile {
        phone: phone.to_string(),
        birth_date: payload.birth_date,
        membership: payload.membership.unwrap_or_default(),
    };

    let mut uow = state.store.begin().await?;
    let customer = uow.customers().upsert(user.user_id, profile).await?;
    uow.commit().await?;

    tracing::debug!(customer_id = %customer.id, user_id = %user.user_id, "customer profile saved");
    Ok(ApiResponse::success(
        "Customer saved",
        customer,
        Some(Meta::empty()),
    ))
}
