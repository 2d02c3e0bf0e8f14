//! Configuration type definitions
//!
//! Every section is optional in YAML: an empty document yields the same policy the
//! chat screens use by default (compress after 10 new turns, keep the 5 most recent,
//! summarize at temperature 0.3 with a 500-token cap).

use crate::errors::ChatCoreError;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub yandex: Option<YandexConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// History compression policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompressionConfig {
    /// New (non-summarized) turns required before compression triggers.
    #[serde(default = "default_compression_threshold")]
    pub threshold: usize,
    /// Most recent turns that are never folded into a summary.
    #[serde(default = "default_keep_recent_count")]
    pub keep_recent_count: usize,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
}

/// Thresholds and fallbacks used by the response parser.
///
/// Constructed once and handed to [`ResponseParser`](crate::parsing::ResponseParser);
/// nothing about decoding is held in global state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParserConfig {
    /// Content shorter than this (in characters) is usable but flagged.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Confidence below this is usable but flagged.
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: f64,
    /// Title given to replies the parser had to synthesize.
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
    /// Characters of a raw reply shown alongside a parse failure.
    #[serde(default = "default_raw_preview_chars")]
    pub raw_preview_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YandexConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_yandex_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "default_yandex_folder_id_env")]
    pub folder_id_env: String,
    #[serde(default = "default_yandex_model")]
    pub model: String,
    #[serde(default = "default_yandex_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Credentials after environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexCredentials {
    pub api_key: String,
    pub folder_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_compression_threshold() -> usize { 10 }
fn default_keep_recent_count() -> usize { 5 }
fn default_summary_temperature() -> f32 { 0.3 }
fn default_summary_max_tokens() -> u32 { 500 }
fn default_min_content_chars() -> usize { 3 }
fn default_low_confidence_threshold() -> f64 { 0.3 }
fn default_fallback_title() -> String { "Response".to_string() }
fn default_raw_preview_chars() -> usize { 500 }
fn default_yandex_api_key_env() -> String { "YANDEX_API_KEY".to_string() }
fn default_yandex_folder_id_env() -> String { "YANDEX_FOLDER_ID".to_string() }
fn default_yandex_model() -> String { "yandexgpt-lite/latest".to_string() }
fn default_yandex_endpoint() -> String {
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion".to_string()
}
fn default_timeout_secs() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            threshold: default_compression_threshold(),
            keep_recent_count: default_keep_recent_count(),
            summary_temperature: default_summary_temperature(),
            summary_max_tokens: default_summary_max_tokens(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            low_confidence_threshold: default_low_confidence_threshold(),
            fallback_title: default_fallback_title(),
            raw_preview_chars: default_raw_preview_chars(),
        }
    }
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_yandex_api_key_env(),
            folder_id: None,
            folder_id_env: default_yandex_folder_id_env(),
            model: default_yandex_model(),
            endpoint: default_yandex_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl YandexConfig {
    /// Explicit values win; otherwise the named environment variables are read.
    pub fn resolve_credentials(&self) -> Result<YandexCredentials, ChatCoreError> {
        let api_key = resolve_value(self.api_key.as_deref(), &self.api_key_env, "API key")?;
        let folder_id = resolve_value(self.folder_id.as_deref(), &self.folder_id_env, "folder id")?;
        Ok(YandexCredentials { api_key, folder_id })
    }
}

fn resolve_value(explicit: Option<&str>, env_var: &str, what: &str) -> Result<String, ChatCoreError> {
    if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
        return Ok(value.to_string());
    }
    match env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ChatCoreError::ConfigError(format!(
            "Yandex {} not configured: set it in the config file or the {} environment variable",
            what, env_var
        ))),
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ChatCoreError> {
        self.compression.validate()?;
        self.parser.validate()?;

        if let Some(yandex) = &self.yandex {
            if yandex.model.trim().is_empty() {
                return Err(ChatCoreError::ValidationError("Yandex model cannot be empty".to_string()));
            }
            if yandex.endpoint.trim().is_empty() {
                return Err(ChatCoreError::ValidationError("Yandex endpoint cannot be empty".to_string()));
            }
            if yandex.timeout_secs == 0 {
                return Err(ChatCoreError::ValidationError(
                    "Yandex timeout_secs must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), ChatCoreError> {
        if self.threshold == 0 {
            return Err(ChatCoreError::ValidationError(
                "Compression threshold must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.summary_temperature) {
            return Err(ChatCoreError::ValidationError(format!(
                "Summary temperature must be within [0, 1], got {}",
                self.summary_temperature
            )));
        }
        if self.summary_max_tokens == 0 {
            return Err(ChatCoreError::ValidationError(
                "Summary max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<(), ChatCoreError> {
        if !(0.0..=1.0).contains(&self.low_confidence_threshold) {
            return Err(ChatCoreError::ValidationError(format!(
                "Low confidence threshold must be within [0, 1], got {}",
                self.low_confidence_threshold
            )));
        }
        Ok(())
    }
}
