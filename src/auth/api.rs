//! Authentication API Endpoints
//! Mission: Hand out credentials for a caller-supplied identity

use crate::{
    api::{extractors::extract_json, AppState},
    auth::models::{TokenRequest, TokenResponse},
    error::ApiError,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

/// Issue token - POST /jwt
///
/// The payload is signed as given; nothing ties it to an authenticated
/// session.
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let payload = extract_json(payload)?;
    let email = payload.email.clone();
    let token = state
        .jwt
        .generate_token(payload)
        .map_err(ApiError::Signing)?;

    info!("🔐 Credential issued for {}", email);

    Ok(Json(TokenResponse { token }))
}
