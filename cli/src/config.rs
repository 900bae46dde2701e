//! CLI Configuration

use crate::client::{DEFAULT_API_URL, DEFAULT_PIN_URL};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub pin_lookup_url: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid config file")
    }

    /// Write the config and return where it went.
    pub fn save(&self, profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Defaults written by `udyam config init`.
    pub fn starter() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.into()),
            pin_lookup_url: Some(DEFAULT_PIN_URL.into()),
            default_format: Some("table".into()),
        }
    }

    pub fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot find home directory"))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".udyam").join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let config = Config::parse("api_url = \"http://10.0.0.5:4000\"\n").unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://10.0.0.5:4000"));
        assert_eq!(config.pin_lookup_url, None);
    }

    #[test]
    fn test_starter_round_trip() {
        let text = toml::to_string_pretty(&Config::starter()).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::starter());
    }

    #[test]
    fn test_profile_file_name() {
        if let Ok(path) = Config::config_path(Some("staging")) {
            assert!(path.ends_with(".udyam/config.staging.toml"));
        }
    }
}
