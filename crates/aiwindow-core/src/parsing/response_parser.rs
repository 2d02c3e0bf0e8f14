//! Turns raw model text into a [`ParseOutcome`] of [`StructuredResponse`].
//!
//! Two trust levels exist. Strict parsing is for replies produced under a
//! provider-enforced JSON schema: if that still fails to decode it is a provider
//! defect and no fallback is attempted. Lenient parsing is for prompt-engineered
//! requests, where models wrap JSON in markdown, answer in prose, or truncate output,
//! and runs a chain of fallbacks before giving up.
//!
//! The parser is pure: no I/O, no retries, same input gives the same outcome.

use crate::config::ParserConfig;
use crate::core_types::{
    ResponseMetadata, StructuredResponse, CATEGORY_MANUAL_EXTRACTION, CATEGORY_PLAINTEXT_FALLBACK,
};
use crate::parsing::outcome::{ParseOutcome, ValidationResult};
use log::{debug, warn};
use regex::Regex;
use serde_json::Value;

const FENCE_PATTERN: &str = r"(?is)```(?:json)?\s*(.*?)\s*```";
// Deliberately simple: no escaped quotes, no multi-line values. A value containing
// \" is cut at the escape.
const TITLE_PATTERN: &str = r#""title"\s*:\s*"([^"]+)""#;
const CONTENT_PATTERN: &str = r#""content"\s*:\s*"([^"]+)""#;

pub const WARNING_PLAIN_TEXT: &str = "Model returned plain text instead of JSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// The reply was constrained by a provider-side JSON schema.
    Strict,
    /// No schema enforcement; run the fallback chain.
    Lenient,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    config: ParserConfig,
}

impl ResponseParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, raw: &str, mode: ParseMode) -> ParseOutcome<StructuredResponse> {
        match mode {
            ParseMode::Strict => self.parse_strict(raw),
            ParseMode::Lenient => self.parse_lenient(raw),
        }
    }

    pub fn parse_strict(&self, raw: &str) -> ParseOutcome<StructuredResponse> {
        if raw.trim().is_empty() {
            return ParseOutcome::error("Empty response", raw);
        }

        match Self::decode(raw.trim()) {
            Ok(data) => {
                let validation = self.validate(&data);
                ParseOutcome::from((data, validation, raw))
            }
            Err(e) => {
                warn!("Schema-constrained response failed to decode: {}", e);
                ParseOutcome::error(format!("Failed to parse JSON: {}", e), raw)
            }
        }
    }

    pub fn parse_lenient(&self, raw: &str) -> ParseOutcome<StructuredResponse> {
        if raw.trim().is_empty() {
            return ParseOutcome::error("Empty response", raw);
        }

        // Fences come off before the JSON check: models often put prose around a
        // fenced block of perfectly valid JSON.
        let candidate = Self::strip_code_fence(raw);

        if !(candidate.starts_with('{') || candidate.starts_with('[')) {
            debug!("Response is not JSON, falling back to plain text");
            let data = StructuredResponse::new(
                self.config.fallback_title.clone(),
                raw,
                ResponseMetadata::new(0.0, CATEGORY_PLAINTEXT_FALLBACK),
            );
            return ParseOutcome::partial(data, WARNING_PLAIN_TEXT);
        }

        match Self::decode(candidate) {
            Ok(data) => {
                let validation = self.validate(&data);
                ParseOutcome::from((data, validation, raw))
            }
            Err(e) => {
                warn!("Malformed JSON in model response: {}", e);
                let (title, content) = Self::extract_fields(candidate);
                match content {
                    Some(content) => {
                        let data = StructuredResponse::new(
                            title.unwrap_or_else(|| self.config.fallback_title.clone()),
                            content,
                            ResponseMetadata::new(0.0, CATEGORY_MANUAL_EXTRACTION),
                        );
                        ParseOutcome::partial(
                            data,
                            format!("Malformed JSON, extracted content manually: {}", e),
                        )
                    }
                    None => ParseOutcome::error(format!("Failed to parse JSON: {}", e), raw),
                }
            }
        }
    }

    /// Checks a decoded response. The first matching rule wins.
    pub fn validate(&self, data: &StructuredResponse) -> ValidationResult {
        let response = &data.response;
        let confidence = response.metadata.confidence;

        if response.content.trim().is_empty() {
            return ValidationResult::Invalid("Content is empty".to_string());
        }
        if !(0.0..=1.0).contains(&confidence) {
            return ValidationResult::Invalid(format!("Invalid confidence: {}", confidence));
        }
        if response.content.chars().count() < self.config.min_content_chars {
            return ValidationResult::Warning("Content is very short".to_string());
        }
        if confidence < self.config.low_confidence_threshold {
            return ValidationResult::Warning("Low confidence".to_string());
        }
        ValidationResult::Valid
    }

    // serde would happily read a struct out of a JSON array, so the top level is
    // checked before mapping onto the response type.
    fn decode(text: &str) -> Result<StructuredResponse, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        if !value.is_object() {
            return Err("expected a JSON object at the top level".to_string());
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    /// Inner text of the first fenced code block, or the trimmed input if there is none.
    pub fn strip_code_fence(text: &str) -> &str {
        let Ok(re) = Regex::new(FENCE_PATTERN) else {
            return text.trim();
        };
        match re.captures(text).and_then(|cap| cap.get(1)) {
            Some(inner) => inner.as_str().trim(),
            None => text.trim(),
        }
    }

    fn extract_fields(text: &str) -> (Option<String>, Option<String>) {
        (
            Self::capture_first(TITLE_PATTERN, text),
            Self::capture_first(CONTENT_PATTERN, text),
        )
    }

    fn capture_first(pattern: &str, text: &str) -> Option<String> {
        let re = Regex::new(pattern).ok()?;
        re.captures(text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }
}
