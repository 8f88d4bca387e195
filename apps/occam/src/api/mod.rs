//! # Occam HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `POST /step` - Decide one thinking step
//! - `GET /stages` - Stage table and loopback allow-list
//! - `GET /prompts` - Guidance texts by canonical key
//! - `GET /health` - Health check
//!
//! ## Security Configuration
//!
//! - `[server] cors_origins` / `OCCAM_CORS_ORIGINS`: allowed origins, or "*" for all (default: localhost only)
//! - `[server] rate_limit` / `OCCAM_RATE_LIMIT`: `/step` decisions per second (default: 100, 0 to disable)
//! - `OCCAM_API_KEY`: if set, requires Bearer token authentication

mod guard;
mod handlers;
mod types;

pub use guard::{ApiKey, RequestGuard};
pub use handlers::{health_handler, prompts_handler, stages_handler, step_handler};
pub use types::{
    HealthResponse, LoopbackRule, PromptEntry, PromptsResponse, StageInfo, StagesResponse,
};

use crate::config::ServerConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use occam_core::{Engine, LoopbackPolicy, OccamError, PromptCatalog};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HEALTH_PATH: &str = "/health";
const STEP_PATH: &str = "/step";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
///
/// The catalog and policy are built once at startup; handlers only borrow
/// them, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<PromptCatalog>,
    pub policy: Arc<LoopbackPolicy>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PromptCatalog::standard())
    }
}

impl AppState {
    /// Create state around a prompt catalog and the standard loopback policy.
    #[must_use]
    pub fn new(catalog: PromptCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            policy: Arc::new(LoopbackPolicy::standard()),
        }
    }

    /// An engine borrowing this state.
    #[must_use]
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.catalog, &self.policy)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins (development only)
/// - empty: localhost only
/// - otherwise: the listed origins; invalid entries are skipped
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!("CORS: No origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
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
/// 4. Request guard - API key and `/step` quota, when configured
pub fn create_router(state: AppState, settings: &ServerConfig) -> Router {
    let guard = RequestGuard::from_settings(settings);

    if guard.requires_key() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set {} to enable authentication.",
            crate::config::API_KEY_ENV
        );
    }
    if guard.meters_steps() {
        tracing::info!("Step quota enabled: {} decisions/second", settings.rate_limit);
    } else {
        tracing::info!("Step quota disabled");
    }

    let mut router = Router::new()
        .route(HEALTH_PATH, get(handlers::health_handler))
        .route(STEP_PATH, post(handlers::step_handler))
        .route("/stages", get(handlers::stages_handler))
        .route("/prompts", get(handlers::prompts_handler));

    if guard.requires_key() || guard.meters_steps() {
        router = router.layer(axum_middleware::from_fn_with_state(
            guard,
            guard::guard_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(&settings.cors_origins))
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl-C.
pub async fn run_server(state: AppState, settings: &ServerConfig) -> Result<(), OccamError> {
    let addr = settings.addr();
    let router = create_router(state, settings);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OccamError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Occam HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OccamError::Io(format!("Server error: {}", e)))?;

    tracing::info!("Occam HTTP server stopped");
    Ok(())
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
