//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and role gates

use crate::{
    api::AppState,
    auth::models::{Claims, Role},
    error::ApiError,
    store::{Collection, Filter},
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Token Verifier: rejects the request unless it carries a valid credential,
/// otherwise stores the decoded claims in the request extensions.
pub async fn verify_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthenticated)?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthenticated)?;

    let claims = state.jwt.validate_token(token).map_err(|e| {
        debug!("Rejected credential: {}", e);
        ApiError::Unauthenticated
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// The token is the second whitespace-separated segment of the header; the
/// scheme word in front of it is not checked.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}

/// Admin Gate (use after `verify_token`)
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(&state, Role::Admin, req, next).await
}

/// Agent Gate (use after `verify_token`)
pub async fn require_agent(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(&state, Role::Agent, req, next).await
}

/// Admit the request only if the persisted identity behind the verified
/// email holds exactly `role`. Reads the store on every call.
pub async fn require_role(
    state: &AppState,
    role: Role,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = extract_claims(&req)
        .map(|claims| claims.email.clone())
        .ok_or(ApiError::Unauthenticated)?;

    let identity = state
        .store
        .find_one(Collection::Users, &Filter::eq("email", email.as_str()))
        .await?;

    let held = identity
        .as_ref()
        .and_then(|doc| doc.get("role"))
        .and_then(Value::as_str);

    if held != Some(role.as_str()) {
        warn!(
            email = %email,
            required = role.as_str(),
            "🚫 Role gate denied request"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::Map;

    #[test]
    fn test_bearer_token_takes_second_segment() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Token   abc"), Some("abc"));
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_extract_claims_from_request() {
        let mut req = Request::new(Body::empty());

        // No claims initially
        assert!(extract_claims(&req).is_none());

        req.extensions_mut().insert(Claims {
            email: "test@estate.test".to_string(),
            extra: Map::new(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        });

        let extracted = extract_claims(&req);
        assert_eq!(extracted.map(|c| c.email.as_str()), Some("test@estate.test"));
    }
}
