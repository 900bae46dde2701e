//! API configuration from the environment

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Schema Document served and validated against
    pub schema_path: PathBuf,
    /// JSON-lines submission file; in-memory store when unset
    pub store_path: Option<PathBuf>,
    /// `tracing` filter directive
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 4000,
            schema_path: PathBuf::from("public").join("schema.json"),
            store_path: None,
            log_level: "info".into(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `SCHEMA_PATH` wins over
    /// `FRONTEND_PUBLIC/schema.json`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(path) = get("SCHEMA_PATH") {
            config.schema_path = PathBuf::from(path);
        } else if let Some(public) = get("FRONTEND_PUBLIC") {
            config.schema_path = PathBuf::from(public).join("schema.json");
        }
        config.store_path = get("STORE_PATH").map(PathBuf::from);
        if let Some(level) = get("RUST_LOG") {
            config.log_level = level;
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
