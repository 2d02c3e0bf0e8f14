//! Error types for the fallible boundaries of the chat core
//!
//! Parsing a model reply never produces one of these: parse failures are values
//! ([`ParseOutcome::Error`](crate::parsing::ParseOutcome::Error)) so degraded output can
//! still reach the user. `ChatCoreError` covers the places where something outside the
//! core can fail: the summarization call made during history compression, configuration
//! loading, and file I/O in the command-line surface.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatCoreError {
    #[error("LLM interaction failed: {0}")]
    LLMError(String),
    #[error("Summarization failed: {0}")]
    SummarizationError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl From<std::io::Error> for ChatCoreError {
    fn from(err: std::io::Error) -> Self {
        ChatCoreError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for ChatCoreError {
    fn from(err: reqwest::Error) -> Self {
        ChatCoreError::LLMError(err.to_string())
    }
}

impl From<serde_json::Error> for ChatCoreError {
    fn from(err: serde_json::Error) -> Self {
        ChatCoreError::ParsingError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ChatCoreError {
    fn from(err: serde_yaml::Error) -> Self {
        ChatCoreError::ConfigError(err.to_string())
    }
}
