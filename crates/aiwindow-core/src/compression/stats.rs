//! Savings reported for compression
//!
//! [`CompressionStatistics`] describes one compression step. [`ComparisonStats`]
//! accumulates per-request numbers for two conversations fed the same user messages,
//! one compressed and one not, and derives the savings shown to the user.

use crate::core_types::ChatTurn;
use crate::tokens;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionStatistics {
    pub original_message_count: usize,
    pub compressed_message_count: usize,
    pub messages_saved: i64,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub tokens_saved: i64,
    /// Percentage of estimated tokens saved; 0 for an empty original history.
    pub compression_ratio: f64,
}

impl CompressionStatistics {
    pub fn between(original: &[ChatTurn], compressed: &[ChatTurn]) -> Self {
        let original_tokens = tokens::estimate_tokens_for_history(original);
        let compressed_tokens = tokens::estimate_tokens_for_history(compressed);
        let tokens_saved = original_tokens as i64 - compressed_tokens as i64;

        Self {
            original_message_count: original.len(),
            compressed_message_count: compressed.len(),
            messages_saved: original.len() as i64 - compressed.len() as i64,
            original_tokens,
            compressed_tokens,
            tokens_saved,
            compression_ratio: percent(tokens_saved, original_tokens),
        }
    }
}

/// Measurements for one request in one of the two flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestSample {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub response_time_ms: u64,
    /// Turns in the flow's history after the reply was appended.
    pub turn_count: usize,
}

/// Running totals for a compressed flow against an uncompressed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonStats {
    pub turns_with_compression: usize,
    pub turns_without_compression: usize,
    pub summaries_created: usize,

    pub latest_input_tokens_with_compression: usize,
    pub latest_input_tokens_without_compression: usize,
    pub latest_output_tokens_with_compression: usize,
    pub latest_output_tokens_without_compression: usize,

    pub total_input_tokens_with_compression: usize,
    pub total_input_tokens_without_compression: usize,
    pub total_output_tokens_with_compression: usize,
    pub total_output_tokens_without_compression: usize,

    pub latest_response_time_with_compression_ms: u64,
    pub latest_response_time_without_compression_ms: u64,
    pub total_response_time_with_compression_ms: u64,
    pub total_response_time_without_compression_ms: u64,

    pub request_count_with_compression: usize,
    pub request_count_without_compression: usize,

    pub total_summarization_time_ms: u64,
    pub summarization_count: usize,
}

impl ComparisonStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful compression of the compressed flow.
    pub fn record_summarization(&mut self, duration_ms: u64, turns_after: usize) {
        self.summaries_created += 1;
        self.summarization_count += 1;
        self.total_summarization_time_ms += duration_ms;
        self.turns_with_compression = turns_after;
    }

    /// Records one request sent to both flows.
    pub fn record_exchange(&mut self, with_compression: RequestSample, without_compression: RequestSample) {
        self.turns_with_compression = with_compression.turn_count;
        self.turns_without_compression = without_compression.turn_count;

        self.latest_input_tokens_with_compression = with_compression.input_tokens;
        self.latest_output_tokens_with_compression = with_compression.output_tokens;
        self.latest_input_tokens_without_compression = without_compression.input_tokens;
        self.latest_output_tokens_without_compression = without_compression.output_tokens;

        self.total_input_tokens_with_compression += with_compression.input_tokens;
        self.total_output_tokens_with_compression += with_compression.output_tokens;
        self.total_input_tokens_without_compression += without_compression.input_tokens;
        self.total_output_tokens_without_compression += without_compression.output_tokens;

        self.latest_response_time_with_compression_ms = with_compression.response_time_ms;
        self.latest_response_time_without_compression_ms = without_compression.response_time_ms;
        self.total_response_time_with_compression_ms += with_compression.response_time_ms;
        self.total_response_time_without_compression_ms += without_compression.response_time_ms;

        self.request_count_with_compression += 1;
        self.request_count_without_compression += 1;

        log::info!(
            "Comparison updated: {} vs {} input tokens, {}",
            with_compression.input_tokens,
            without_compression.input_tokens,
            self.format_token_savings()
        );
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Input tokens saved by the compressed flow, as a percentage of the uncompressed total.
    pub fn token_savings_percent(&self) -> f64 {
        percent(self.input_tokens_saved(), self.total_input_tokens_without_compression)
    }

    pub fn input_tokens_saved(&self) -> i64 {
        self.total_input_tokens_without_compression as i64
            - self.total_input_tokens_with_compression as i64
    }

    pub fn total_tokens_with_compression(&self) -> usize {
        self.total_input_tokens_with_compression + self.total_output_tokens_with_compression
    }

    pub fn total_tokens_without_compression(&self) -> usize {
        self.total_input_tokens_without_compression + self.total_output_tokens_without_compression
    }

    pub fn avg_response_time_with_compression_ms(&self) -> u64 {
        average(self.total_response_time_with_compression_ms, self.request_count_with_compression)
    }

    pub fn avg_response_time_without_compression_ms(&self) -> u64 {
        average(
            self.total_response_time_without_compression_ms,
            self.request_count_without_compression,
        )
    }

    pub fn avg_summarization_time_ms(&self) -> u64 {
        average(self.total_summarization_time_ms, self.summarization_count)
    }

    /// Positive when compression saved wall time overall, summarization included.
    pub fn net_time_savings_ms(&self) -> i64 {
        let with = self.total_response_time_with_compression_ms + self.total_summarization_time_ms;
        self.total_response_time_without_compression_ms as i64 - with as i64
    }

    pub fn avg_context_size_with_compression(&self) -> usize {
        self.total_input_tokens_with_compression
            .checked_div(self.request_count_with_compression)
            .unwrap_or(0)
    }

    pub fn avg_context_size_without_compression(&self) -> usize {
        self.total_input_tokens_without_compression
            .checked_div(self.request_count_without_compression)
            .unwrap_or(0)
    }

    pub fn format_token_savings(&self) -> String {
        let saved = self.input_tokens_saved();
        let percent = (self.token_savings_percent() * 10.0).trunc() / 10.0;
        match saved {
            s if s > 0 => format!("↓ {} tokens ({:.1}%)", s, percent),
            s if s < 0 => format!("↑ {} tokens ({:.1}%)", -s, -percent),
            _ => "no change".to_string(),
        }
    }

    pub fn quality_assessment(&self) -> &'static str {
        let percent = self.token_savings_percent();
        if percent >= 50.0 {
            "Excellent (>50% savings)"
        } else if percent >= 30.0 {
            "Good (>30% savings)"
        } else if percent >= 10.0 {
            "Acceptable (>10% savings)"
        } else if percent > 0.0 {
            "Low efficiency (<10% savings)"
        } else {
            "No effect"
        }
    }
}

fn percent(part: i64, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(total: u64, count: usize) -> u64 {
    if count == 0 {
        0
    } else {
        total / count as u64
    }
}
