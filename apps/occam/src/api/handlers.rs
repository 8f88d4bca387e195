//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{HealthResponse, PromptsResponse, StagesResponse},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use occam_core::{StepRequest, StepResponse};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STEP HANDLER
// =============================================================================

/// Decide one thinking step.
///
/// Every decided outcome, ERROR included, is a 200: the `status` tag carries
/// the result. Only a body that cannot be read as a step request is a 400.
pub async fn step_handler(
    State(state): State<AppState>,
    request: Result<Json<StepRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            tracing::debug!(
                event = "malformed_step",
                error = %rejection.body_text(),
                "Step request rejected"
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(StepResponse::invalid_request(rejection.body_text())),
            );
        }
    };

    let response = state.engine().handle(&request);
    tracing::debug!(
        event = "step_decided",
        stage = %request.stage,
        sequence = request.sequence,
        status = response.status(),
        "Step decided"
    );

    (StatusCode::OK, Json(response))
}

// =============================================================================
// INTROSPECTION HANDLERS
// =============================================================================

/// Stage table and loopback allow-list.
pub async fn stages_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StagesResponse::from_policy(&state.policy))
}

/// Every guidance text in the catalog.
pub async fn prompts_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(PromptsResponse::from_catalog(&state.catalog))
}
