//! Validation and submission endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::store::NewSubmission;
use crate::{models::*, ApiError, ApiState};

fn into_record(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(record))) => Ok(record),
        Ok(Json(_)) => Err(ApiError::BadRequest("record must be a JSON object".into())),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

fn check(state: &ApiState, record: &Map<String, Value>) -> Result<(), ApiError> {
    let loaded = state.schema.current().ok_or(ApiError::SchemaUnavailable)?;
    let errors = loaded.validator.validate(record);
    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(fields = errors.len(), "record rejected");
        Err(ApiError::Invalid(errors))
    }
}

/// Pre-check a record without storing it
#[utoipa::path(
    post,
    path = "/api/validate",
    responses(
        (status = 200, description = "Record is valid", body = OkResponse),
        (status = 400, description = "Field errors", body = ValidationErrorsBody),
        (status = 500, description = "No schema loaded", body = ErrorBody)
    ),
    tag = "submissions"
)]
pub async fn validate_record(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let record = into_record(payload)?;
    check(&state, &record)?;
    Ok(Json(OkResponse::ok()))
}

/// Validate and store a completed registration
#[utoipa::path(
    post,
    path = "/api/submit",
    responses(
        (status = 200, description = "Submission stored", body = SubmitResponse),
        (status = 400, description = "Field errors", body = ValidationErrorsBody),
        (status = 500, description = "Submit failed", body = ErrorBody)
    ),
    tag = "submissions"
)]
pub async fn submit_record(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let record = into_record(payload)?;
    check(&state, &record)?;
    let id = state.store.create(NewSubmission::from_record(record)).await?;
    tracing::info!(%id, "submission stored");
    Ok(Json(SubmitResponse { ok: true, id }))
}
