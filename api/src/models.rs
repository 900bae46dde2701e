//! API Models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Stored submission acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub ok: bool,
    pub id: Uuid,
}

/// Field errors of a rejected record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorsBody {
    pub errors: BTreeMap<String, Vec<String>>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Schema reload result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub ok: bool,
    pub steps: usize,
    pub fields: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub schema_loaded: bool,
}
