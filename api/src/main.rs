//! Udyam Registration Form API server

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use udyam_api::{
    build_router, ApiConfig, ApiState, InMemorySubmissionStore, JsonLinesSubmissionStore,
    SchemaRegistry, SubmissionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let schema = SchemaRegistry::open(&config.schema_path).await;
    let store: Arc<dyn SubmissionStore> = match &config.store_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "storing submissions as JSON lines");
            Arc::new(JsonLinesSubmissionStore::new(path))
        }
        None => {
            tracing::warn!("STORE_PATH not set, submissions are kept in memory");
            Arc::new(InMemorySubmissionStore::new())
        }
    };

    let app = build_router(ApiState { schema: Arc::new(schema), store });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
