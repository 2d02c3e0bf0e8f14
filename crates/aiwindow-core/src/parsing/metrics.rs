//! Content metrics attached to parsed responses.
//!
//! Used by the reasoning comparison flow to tell terse answers from step-by-step ones.

use crate::core_types::StructuredResponse;
use regex::Regex;

const NUMBERED_STEP_PATTERN: &str = r"(?m)^\s*\d+\.\s+";
const STEP_MARKER_PATTERN: &str = r"(?i)(?:step|шаг|этап)\s*\d+";
const HEADER_PATTERN: &str = r"(?m)^#{1,3}\s+";

/// Any one signal reaching this count marks the content as step-structured.
const MIN_STEP_SIGNALS: usize = 3;

/// Fills `word_count` and `has_steps` in the response metadata.
pub fn enrich_with_metrics(mut response: StructuredResponse) -> StructuredResponse {
    let content = &response.response.content;
    let word_count = count_words(content);
    let has_steps = detect_step_structure(content);

    response.response.metadata.word_count = Some(word_count);
    response.response.metadata.has_steps = Some(has_steps);
    response
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn detect_step_structure(content: &str) -> bool {
    [NUMBERED_STEP_PATTERN, STEP_MARKER_PATTERN, HEADER_PATTERN]
        .iter()
        .any(|pattern| count_matches(pattern, content) >= MIN_STEP_SIGNALS)
}

fn count_matches(pattern: &str, text: &str) -> usize {
    match Regex::new(pattern) {
        Ok(re) => re.find_iter(text).count(),
        Err(e) => {
            log::error!("Invalid metrics pattern {}: {}", pattern, e);
            0
        }
    }
}
