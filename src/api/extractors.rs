//! Request Extraction
//! Mission: Decode bodies and query strings, answering failures as `ApiError`

use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    Json,
};

/// Unwrap a JSON body, mapping decode failures to [`ApiError::Rejected`].
///
/// Handlers take `Result<Json<T>, JsonRejection>` and call this first.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| ApiError::Rejected(err.status(), err.body_text()))
}

/// Query-string counterpart of [`extract_json`]
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| ApiError::Rejected(err.status(), err.body_text()))
}
