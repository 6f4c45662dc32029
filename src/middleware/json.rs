use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor whose rejections go through `AppError`, so a
/// malformed body gets the usual envelope with `code: "validation_error"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;
        Ok(Self(value))
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    tracing::debug!(status = %rejection.status(), "rejected request body");
    AppError::Validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{self, header},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Quantity {
        quantity: i32,
    }

    fn request(body: &'static str) -> Request {
        http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn wrong_field_type_is_a_validation_error() {
        let err = AppJson::<Quantity>::from_request(request(r#"{"quantity":"two"}"#), &())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(message) => assert!(message.contains("quantity")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn well_formed_body_is_extracted() {
        let AppJson(body) = AppJson::<Quantity>::from_request(request(r#"{"quantity":2}"#), &())
            .await
            .unwrap();
        assert_eq!(body.quantity, 2);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_validation_error() {
        let req = http::Request::builder()
            .method("POST")
            .body(Body::from(r#"{"quantity":2}"#))
            .unwrap();
        let err = AppJson::<Quantity>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
