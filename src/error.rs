//! API Errors
//! Mission: Turn every failure into exactly one terminal HTTP response

use crate::auth::jwt::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors a handler or gate can end a request with
#[derive(Debug)]
pub enum ApiError {
    /// Missing, malformed, tampered or expired credential
    Unauthenticated,
    /// Valid credential without the required role, or a self-scoped route
    /// addressed at someone else
    Forbidden,
    /// Request body or query string could not be decoded; keeps the
    /// extractor's status (400, 415 or 422)
    Rejected(StatusCode, String),
    /// Credential could not be issued
    Signing(TokenError),
    /// The document store failed
    Store(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthorized access".into()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden access".into()),
            ApiError::Rejected(status, message) => (status, message),
            ApiError::Signing(err) => {
                error!("Token signing error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
            ApiError::Store(err) => {
                error!("Store error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    #[test]
    fn test_error_conversion() {
        let err = anyhow::anyhow!("connection reset");
        let api_err: ApiError = err.into();

        match api_err {
            ApiError::Store(_) => (),
            _ => panic!("Expected Store error"),
        }
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Signing(TokenError::MissingSecret)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_rejection_keeps_status_and_uses_message_body() {
        let response =
            ApiError::Rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field `email`".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "missing field `email`" }));
    }

    #[tokio::test]
    async fn test_store_error_body_hides_details() {
        let response = ApiError::Store(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "internal server error");
        assert!(!String::from_utf8_lossy(&bytes).contains("hunter2"));
    }
}
