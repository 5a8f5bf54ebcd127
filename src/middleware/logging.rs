//! Request logging middleware.
//!
//! One line per request with method, path, status and latency. Credential
//! and role rejections are labelled so gate denials stand out from bad input.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Short label for the outcome class of a response
fn outcome(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNAUTHORIZED => "rejected: no valid credential",
        StatusCode::FORBIDDEN => "rejected: role or identity mismatch",
        s if s.is_server_error() => "failed (5xx)",
        s if s.is_client_error() => "rejected (4xx)",
        _ => "completed",
    }
}

/// Logs every request except health probes.
///
/// Server errors go out at WARN, everything else at INFO.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "Request {}",
            outcome(status)
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms,
            "Request {}",
            outcome(status)
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome(StatusCode::OK), "completed");
        assert_eq!(outcome(StatusCode::UNAUTHORIZED), "rejected: no valid credential");
        assert_eq!(outcome(StatusCode::FORBIDDEN), "rejected: role or identity mismatch");
        assert_eq!(outcome(StatusCode::UNPROCESSABLE_ENTITY), "rejected (4xx)");
        assert_eq!(outcome(StatusCode::INTERNAL_SERVER_ERROR), "failed (5xx)");
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(middleware::from_fn(request_logging));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/teapot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
