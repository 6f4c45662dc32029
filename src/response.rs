use axum::{Json, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

/// Paging information. All fields are null for single-object responses.
#[derive(Debug, Default, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    /// Build from a repository row count.
    pub fn counted(page: i64, per_page: i64, total: u64) -> Self {
        Self::new(page, per_page, i64::try_from(total).unwrap_or(i64::MAX))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Envelope around every JSON body, errors included.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn created(self) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(self))
    }
}
