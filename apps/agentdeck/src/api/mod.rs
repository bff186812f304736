//! # agentdeck HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /agents` - List agents and their stage catalogs
//! - `GET /agents/{agent}/dataset` - Unfiltered dataset of an agent
//! - `POST /runs` - Start a run (supersedes the current one)
//! - `GET /runs/current` - Snapshot of the current run
//! - `DELETE /runs/current` - Cancel the current run
//! - `POST /runs/current/fail` - Signal an explicit failure
//! - `GET /runs/current/result` - Result payload of the completed run
//! - `GET /stats` - Sequencer counters

mod handlers;
mod middleware;
mod types;

pub use handlers::status_for;
pub use middleware::{RunStartLimiter, build_cors_layer, create_rate_limiter};
pub use types::{
    AgentSummary, AgentsResponse, CancelResponse, DatasetResponse, ErrorResponse, FailRunRequest,
    HealthResponse, ResultResponse, RunJson, RunResponse, StageJson, StartRunRequest,
    StatsResponse, stages_json,
};

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::AppError;
use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Maximum request body size (64 KB).
const MAX_BODY_SIZE: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub engine: Engine,
}

impl AppState {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate limiting on `POST /runs` only (if enabled)
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut start_route = post(handlers::start_run_handler);
    match create_rate_limiter(server.rate_limit_per_second) {
        Some(limiter) => {
            tracing::info!(
                "Rate limiting enabled: {} run starts/second",
                server.rate_limit_per_second
            );
            start_route = start_route.route_layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/agents", get(handlers::agents_handler))
        .route("/agents/{agent}/dataset", get(handlers::dataset_handler))
        .route("/runs", start_route)
        .route(
            "/runs/current",
            get(handlers::current_run_handler).delete(handlers::cancel_run_handler),
        )
        .route("/runs/current/fail", post(handlers::fail_run_handler))
        .route("/runs/current/result", get(handlers::result_handler))
        .route("/stats", get(handlers::stats_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(build_cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the driver and serve HTTP until Ctrl-C.
pub async fn run_server(addr: &str, engine: Engine, server: &ServerConfig) -> Result<(), AppError> {
    let driver = engine.spawn_driver();
    let router = create_router(AppState::new(engine), server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("agentdeck HTTP server listening on {}", addr);

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)));

    driver.abort();
    tracing::info!("agentdeck HTTP server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
