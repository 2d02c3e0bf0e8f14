//! Three-way parse and validation results
//!
//! A model reply is not simply parsed or not parsed. Output that came through a
//! degraded path (plain prose, regex extraction, suspicious values) is still shown to
//! the user, together with a warning, so the result has a middle variant.

use crate::core_types::StructuredResponse;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome<T> {
    /// Clean JSON that matched the schema and passed validation.
    Success { data: T },
    /// Usable data obtained through a fallback, or flagged by validation.
    Partial { data: T, warning: String },
    /// Nothing usable; `raw_response` is the input exactly as received.
    Error { message: String, raw_response: String },
}

impl<T> ParseOutcome<T> {
    pub fn success(data: T) -> Self {
        ParseOutcome::Success { data }
    }

    pub fn partial(data: T, warning: impl Into<String>) -> Self {
        ParseOutcome::Partial {
            data,
            warning: warning.into(),
        }
    }

    pub fn error(message: impl Into<String>, raw_response: impl Into<String>) -> Self {
        ParseOutcome::Error {
            message: message.into(),
            raw_response: raw_response.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, ParseOutcome::Partial { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ParseOutcome::Error { .. })
    }

    /// The parsed data for both usable variants.
    pub fn data(&self) -> Option<&T> {
        match self {
            ParseOutcome::Success { data } | ParseOutcome::Partial { data, .. } => Some(data),
            ParseOutcome::Error { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ParseOutcome::Success { data } | ParseOutcome::Partial { data, .. } => Some(data),
            ParseOutcome::Error { .. } => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            ParseOutcome::Partial { warning, .. } => Some(warning),
            _ => None,
        }
    }

    /// Transforms the data while keeping the variant and any warning.
    pub fn map<U, F>(self, f: F) -> ParseOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            ParseOutcome::Success { data } => ParseOutcome::Success { data: f(data) },
            ParseOutcome::Partial { data, warning } => ParseOutcome::Partial {
                data: f(data),
                warning,
            },
            ParseOutcome::Error {
                message,
                raw_response,
            } => ParseOutcome::Error {
                message,
                raw_response,
            },
        }
    }
}

impl ParseOutcome<StructuredResponse> {
    /// Response content of a usable outcome.
    pub fn content(&self) -> Option<&str> {
        self.data().map(|d| d.response.content.as_str())
    }
}

/// Verdict on a successfully decoded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    /// Usable, but the caller should show the message.
    Warning(String),
    /// Decoded fine but semantically broken; treated as a parse failure.
    Invalid(String),
}

impl<T> From<(T, ValidationResult, &str)> for ParseOutcome<T> {
    fn from((data, validation, raw): (T, ValidationResult, &str)) -> Self {
        match validation {
            ValidationResult::Valid => ParseOutcome::Success { data },
            ValidationResult::Warning(warning) => ParseOutcome::Partial { data, warning },
            ValidationResult::Invalid(message) => ParseOutcome::Error {
                message,
                raw_response: raw.to_string(),
            },
        }
    }
}
