//! # Middleware Module
//!
//! Rate limiting for run starts and CORS for the dashboard frontend.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Origins allowed when no CORS origins are configured.
const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8080",
];

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Limiter shared by every run start.
pub type RunStartLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a run-start limiter. Returns `None` when `per_second` is 0.
#[must_use]
pub fn create_rate_limiter(per_second: u32) -> Option<RunStartLimiter> {
    NonZeroU32::new(per_second).map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

/// Reject run starts beyond the configured rate with 429.
pub async fn rate_limit_middleware(
    State(limiter): State<RunStartLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limiter.check().is_ok() {
        return next.run(request).await;
    }
    tracing::warn!("Run start rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new("Too many run starts")),
    )
        .into_response()
}

// =============================================================================
// CORS
// =============================================================================

/// Build the CORS layer from configured origins.
///
/// - `[]`: localhost only
/// - `["*"]`: any origin
/// - otherwise: the listed origins; invalid entries are skipped
#[must_use]
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. Do not use this outside development.");
        return CorsLayer::permissive();
    }

    let mut allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::info!("CORS: No origins configured, allowing localhost only");
        allowed = LOCALHOST_ORIGINS
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// TESTS
// =============================================================================
