//! Health check endpoint

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::{models::HealthResponse, ApiState};

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").into(),
        schema_loaded: state.schema.current().is_some(),
    })
}
