//! Core type definitions shared by the parser and the history compressor
//!
//! `StructuredResponse` is the shape a model is asked to answer in, wrapped in a
//! top-level `response` object exactly as the prompt schema requests it. `ChatTurn` is one
//! message in a conversation, including the bookkeeping fields compression uses to
//! record which turns a summary replaced.

use crate::parsing::ParseOutcome;
use crate::tokens;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Category the parser assigns when the model answered in prose instead of JSON.
pub const CATEGORY_PLAINTEXT_FALLBACK: &str = "plaintext_fallback";
/// Category the parser assigns when content had to be pulled out with regexes.
pub const CATEGORY_MANUAL_EXTRACTION: &str = "manual_extraction";
/// Category used when a decoded reply carries no metadata at all.
pub const CATEGORY_UNKNOWN: &str = "unknown";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StructuredResponse {
    pub response: ResponseContent,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResponseMetadata {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(rename = "wordCount", default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(rename = "hasSteps", default, skip_serializing_if = "Option::is_none")]
    pub has_steps: Option<bool>,
    #[serde(rename = "tokenUsage", default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    // Requirements-gathering progress; only that flow asks the model for these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_completed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_asked: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

impl ResponseMetadata {
    pub fn new(confidence: f64, category: impl Into<String>) -> Self {
        Self {
            confidence,
            category: category.into(),
            word_count: None,
            has_steps: None,
            token_usage: None,
            sections_completed: None,
            questions_asked: None,
            is_complete: None,
        }
    }
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self::new(0.0, default_category())
    }
}

impl StructuredResponse {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        metadata: ResponseMetadata,
    ) -> Self {
        Self {
            response: ResponseContent {
                title: title.into(),
                content: content.into(),
                metadata,
            },
        }
    }
}

/// Token usage as reported by the completion endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub input_text_tokens: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub completion_tokens: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_tokens: u32,
}

fn default_category() -> String {
    CATEGORY_UNKNOWN.to_string()
}

// Models (and the Yandex API, for int64 fields) sometimes quote numbers.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("confidence is not a finite number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("confidence is not numeric: {:?}", s))),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "expected a number for confidence, found {}",
            other
        ))),
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| serde::de::Error::custom("token count out of range")),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| serde::de::Error::custom(format!("token count is not numeric: {:?}", s))),
        Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!(
            "expected a token count, found {}",
            other
        ))),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used when a turn is written into a summarization transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatTurn {
    pub id: String,
    pub text: String,
    pub is_from_user: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_warning: Option<String>,
    #[serde(default)]
    pub is_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarized_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_token_count: Option<usize>,
}

impl ChatTurn {
    /// A bare turn with the given id. Callers normally want [`ChatTurn::user`] or
    /// [`ChatTurn::assistant`], which generate the id and cache a token estimate.
    pub fn new(id: impl Into<String>, text: impl Into<String>, is_from_user: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_from_user,
            timestamp: 0,
            title: None,
            metadata: None,
            parse_warning: None,
            is_summary: false,
            summarized_count: None,
            original_ids: None,
            estimated_token_count: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::generated(text.into(), true)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::generated(text.into(), false)
    }

    fn generated(text: String, is_from_user: bool) -> Self {
        let estimate = tokens::estimate_tokens(&text);
        let mut turn = Self::new(generate_id(), text, is_from_user);
        turn.timestamp = now_millis();
        turn.estimated_token_count = Some(estimate);
        turn
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn role(&self) -> Role {
        if self.is_from_user {
            Role::User
        } else {
            Role::Assistant
        }
    }

    /// Builds the assistant turn shown for a parsed model reply.
    ///
    /// Partial outcomes keep their warning on the turn so it is rendered next to the
    /// content. Errors become a failure message with a bounded preview of the raw reply.
    pub fn from_outcome(outcome: &ParseOutcome<StructuredResponse>, raw_preview_chars: usize) -> Self {
        match outcome {
            ParseOutcome::Success { data } => Self::from_response(data, None),
            ParseOutcome::Partial { data, warning } => Self::from_response(data, Some(warning.clone())),
            ParseOutcome::Error {
                message,
                raw_response,
            } => {
                let mut turn = Self::new(
                    generate_id(),
                    format!(
                        "Parse Error: {}\n\nRaw response: {}",
                        message,
                        truncate_chars(raw_response, raw_preview_chars)
                    ),
                    false,
                );
                turn.timestamp = now_millis();
                turn.parse_warning = Some("Parse failed".to_string());
                turn
            }
        }
    }

    fn from_response(data: &StructuredResponse, parse_warning: Option<String>) -> Self {
        let response = &data.response;
        let mut turn = Self::assistant(response.content.clone())
            .with_title(response.title.clone())
            .with_metadata(response.metadata.clone());
        turn.parse_warning = parse_warning;
        turn
    }
}

pub(crate) fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &text[..byte_idx]),
        None => text.to_string(),
    }
}
