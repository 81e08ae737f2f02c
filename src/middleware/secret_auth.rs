use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::AppState;

/// Guards `/metrics` with `X-Metrics-Key` when `METRICS_KEY` is configured.
pub async fn require_metrics_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = state.config.metrics_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided_key = request
        .headers()
        .get("X-Metrics-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Constant-time comparison to prevent timing attacks
    if expected_key.as_bytes().ct_eq(provided_key.as_bytes()).into() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Unauthorized metrics access attempt");
        Err(StatusCode::UNAUTHORIZED)
    }
}
