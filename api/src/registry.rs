//! Schema registry with hot reload
//!
//! The Schema Document is read once at startup and held as an immutable
//! value. `reload` re-reads the file and swaps it atomically; a failed
//! reload keeps the previous schema.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use udyam_forms::{FormsError, RecordValidator, SchemaDocument};

/// One loaded schema: the file text served verbatim, the parsed document
/// and its compiled record validator.
#[derive(Debug)]
pub struct LoadedSchema {
    pub raw: String,
    pub document: SchemaDocument,
    pub validator: RecordValidator,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedSchema {
    pub fn parse(raw: String) -> Result<Self, FormsError> {
        let document = SchemaDocument::from_json(&raw)?;
        let validator = RecordValidator::compile(&document);
        Ok(Self { raw, document, validator, loaded_at: Utc::now() })
    }
}

pub struct SchemaRegistry {
    path: Option<PathBuf>,
    current: ArcSwapOption<LoadedSchema>,
}

impl SchemaRegistry {
    /// Load from `path`. A missing or broken file is logged and leaves the
    /// registry empty until a reload succeeds.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let registry = Self { path: Some(path.into()), current: ArcSwapOption::empty() };
        if let Err(e) = registry.reload().await {
            tracing::error!(error = %e, "schema not loaded at startup");
        }
        registry
    }

    /// Registry around an in-memory document, without a backing file.
    pub fn from_document(document: &SchemaDocument) -> Result<Self, FormsError> {
        let raw = serde_json::to_string_pretty(document)?;
        let loaded = LoadedSchema::parse(raw)?;
        Ok(Self { path: None, current: ArcSwapOption::from_pointee(loaded) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<Arc<LoadedSchema>> {
        self.current.load_full()
    }

    /// Re-read the schema file and swap it in.
    pub async fn reload(&self) -> Result<Arc<LoadedSchema>, FormsError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| FormsError::InvalidSchema("no schema file configured".into()))?;
        let raw = tokio::fs::read_to_string(path).await?;
        let loaded = Arc::new(LoadedSchema::parse(raw)?);
        self.current.store(Some(loaded.clone()));
        tracing::info!(
            path = %path.display(),
            steps = loaded.document.steps.len(),
            fields = loaded.validator.len(),
            "schema loaded"
        );
        Ok(loaded)
    }
}
