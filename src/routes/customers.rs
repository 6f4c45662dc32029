use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::customers::CustomerProfileRequest,
    error::AppResult,
    middleware::{auth::AuthUser, json::AppJson},
    models::Customer,
    response::ApiResponse,
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(put_me))
}

#[utoipa::path(
    get,
    path = "/api/customers/me",
    responses(
        (status = 200, description = "Profile of the caller", body = ApiResponse<Customer>),
        (status = 401, description = "Missing caller identity"),
        (status = 404, description = "No profile yet")
    ),
    tag = "Customers"
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/customers/me",
    request_body = CustomerProfileRequest,
    responses(
        (status = 200, description = "Profile created or replaced", body = ApiResponse<Customer>),
        (status = 400, description = "Invalid profile")
    ),
    tag = "Customers"
)]
pub async fn put_me(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CustomerProfileRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::upsert_me(&state, &user, payload).await?;
    Ok(Json(resp))
}
