//! API error type

use crate::models::{ErrorBody, ValidationErrorsBody};
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use udyam_forms::RecordErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Record broke schema rules
    #[error("record failed validation")]
    Invalid(RecordErrors),

    /// Body was not a JSON object
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No schema has been loaded
    #[error("Schema not found")]
    SchemaUnavailable,

    /// Schema file could not be re-read
    #[error("schema reload failed: {0}")]
    Reload(String),

    /// Store rejected the write
    #[error("Submit failed")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(errors) => {
                (StatusCode::BAD_REQUEST, Json(ValidationErrorsBody { errors })).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: msg })).into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "failed to persist submission");
                let error = "Submit failed".to_string();
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error })).into_response()
            }
            other => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: other.to_string() })).into_response()
            }
        }
    }
}
