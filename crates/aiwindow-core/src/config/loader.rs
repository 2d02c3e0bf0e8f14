//! Configuration loader for YAML files

use crate::config::types::AppConfig;
use crate::errors::ChatCoreError;
use std::path::Path;
use tokio::fs;

/// Configuration loader with validation
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<AppConfig, ChatCoreError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ChatCoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        log::debug!("Loaded config file {}", path.display());
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<AppConfig, ChatCoreError> {
        // serde_yaml rejects a blank document; treat it as "all defaults".
        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                ChatCoreError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        config.validate()?;

        Ok(config)
    }
}
