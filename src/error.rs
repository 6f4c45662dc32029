use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// The entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Cart,
    CartItem,
    Collection,
    Customer,
    Order,
    Product,
    Review,
    Tag,
    Like,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Cart => "cart",
            Resource::CartItem => "cart item",
            Resource::Collection => "collection",
            Resource::Customer => "customer",
            Resource::Order => "order",
            Resource::Product => "product",
            Resource::Review => "review",
            Resource::Tag => "tag",
            Resource::Like => "like",
        };
        f.write_str(name)
    }
}

/// Failures raised by the data access layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("ORM error: {0}")]
    Orm(sea_orm::DbErr),

    #[error("Storage fault: {0}")]
    Fault(String),
}

impl From<sea_orm::DbErr> for RepositoryError {
    /// Constraint violations become `Conflict`; everything else stays an ORM error.
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                RepositoryError::Conflict(msg)
            }
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                RepositoryError::Conflict(msg)
            }
            _ => RepositoryError::Orm(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("The cart is empty")]
    EmptyCart,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Repository error")]
    Repository(RepositoryError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(resource) => AppError::NotFound(resource),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Repository(other),
        }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        RepositoryError::from(err).into()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Report a missing entity referenced from a request body as a field
    /// validation error instead of a 404.
    pub fn into_field_error(self, field: &str) -> Self {
        match self {
            AppError::NotFound(resource) => {
                AppError::Validation(format!("{field}: {resource} does not exist"))
            }
            other => other,
        }
    }

    /// Machine-readable error code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::EmptyCart => "empty_cart",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Repository(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Repository(err) => tracing::error!(error = %err, "repository failure"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal failure"),
            _ => {}
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                code: self.code(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_keep_their_kind() {
        let err: AppError = RepositoryError::NotFound(Resource::Cart).into();
        assert!(matches!(err, AppError::NotFound(Resource::Cart)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = RepositoryError::Conflict("unique_cart_product".into()).into();
        assert_eq!(err.code(), "conflict");

        let err: AppError = RepositoryError::Fault("disk on fire".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_body_reference_becomes_validation_error() {
        let err = AppError::NotFound(Resource::Cart).into_field_error("cart_id");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "validation_error");
        assert_eq!(err.to_string(), "Validation error: cart_id: cart does not exist");

        let err = AppError::EmptyCart.into_field_error("cart_id");
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[test]
    fn empty_cart_is_a_client_error() {
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyCart.code(), "empty_cart");
    }
}
