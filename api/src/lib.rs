//! Udyam Registration Form API
//!
//! Serves the Schema Document and re-validates submitted records against
//! it before persisting them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         REST API                             │
//! │  GET /api/schema | POST /api/validate | POST /api/submit     │
//! └──────────────┬───────────────────────────────┬───────────────┘
//!                │                               │
//!   ┌────────────▼────────────┐      ┌───────────▼────────────┐
//!   │     SchemaRegistry      │      │    SubmissionStore     │
//!   │ ArcSwap<LoadedSchema>   │      │ memory | JSON lines    │
//!   │ (document + validator)  │      │                        │
//!   └─────────────────────────┘      └────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod routes;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use config::ApiConfig;
pub use error::ApiError;
pub use models::*;
pub use registry::{LoadedSchema, SchemaRegistry};
pub use store::{InMemorySubmissionStore, JsonLinesSubmissionStore, NewSubmission, SubmissionStore};

/// Request body ceiling
pub const BODY_LIMIT: usize = 1024 * 1024;

/// API state
#[derive(Clone)]
pub struct ApiState {
    /// Loaded Schema Document
    pub schema: Arc<SchemaRegistry>,
    /// Submission persistence
    pub store: Arc<dyn SubmissionStore>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Udyam Registration Form API",
        version = "0.1.0",
        description = "Schema, validation and submission endpoints for the Udyam registration form",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::schema::get_schema,
        routes::schema::reload_schema,
        routes::submissions::validate_record,
        routes::submissions::submit_record,
    ),
    components(
        schemas(
            OkResponse, SubmitResponse, ValidationErrorsBody, ErrorBody,
            ReloadResponse, HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "schema", description = "Schema Document"),
        (name = "submissions", description = "Record validation and storage")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    let mut router = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/schema", get(routes::schema::get_schema))
        .route("/api/schema/reload", post(routes::schema::reload_schema))
        .route("/api/validate", post(routes::submissions::validate_record))
        .route("/api/submit", post(routes::submissions::submit_record))
        .route("/api-docs/openapi.json", get(openapi_json));

    // Static copy of the schema, the client's fallback path.
    if let Some(path) = state.schema.path() {
        router = router.route_service("/schema.json", ServeFile::new(path));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(Arc::new(state))
}
