//! Schema Document endpoints

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::{models::*, ApiError, ApiState};

/// Serve the loaded Schema Document verbatim
#[utoipa::path(
    get,
    path = "/api/schema",
    responses(
        (status = 200, description = "Schema Document"),
        (status = 500, description = "No schema loaded", body = ErrorBody)
    ),
    tag = "schema"
)]
pub async fn get_schema(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse, ApiError> {
    let loaded = state.schema.current().ok_or(ApiError::SchemaUnavailable)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], loaded.raw.clone()))
}

/// Re-read the schema file and swap it in
#[utoipa::path(
    post,
    path = "/api/schema/reload",
    responses(
        (status = 200, description = "Schema reloaded", body = ReloadResponse),
        (status = 500, description = "Reload failed, previous schema kept", body = ErrorBody)
    ),
    tag = "schema"
)]
pub async fn reload_schema(State(state): State<Arc<ApiState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let loaded = state.schema.reload().await.map_err(|e| {
        tracing::warn!(error = %e, "schema reload failed");
        ApiError::Reload(e.to_string())
    })?;
    Ok(Json(ReloadResponse {
        ok: true,
        steps: loaded.document.steps.len(),
        fields: loaded.validator.len(),
    }))
}
