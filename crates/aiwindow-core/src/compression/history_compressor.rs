//! Summary-plus-recent-turns history compression
//!
//! The history is kept as `[existing summaries..] ++ [recent turns..]`. Once enough new
//! turns have piled up after the last summary, everything except the newest
//! `keep_recent_count` of them is sent to the summarizer and replaced by one summary
//! turn. Earlier summaries are never re-summarized, and the input slice is never
//! modified: a failed or abandoned compression leaves the caller's history as it was.

use crate::compression::stats::CompressionStatistics;
use crate::compression::{Summarizer, SummaryRequest};
use crate::config::CompressionConfig;
use crate::core_types::{generate_id, now_millis, ChatTurn, ResponseMetadata};
use crate::errors::ChatCoreError;
use crate::tokens;
use log::{debug, info, warn};
use std::sync::Arc;

const SUMMARIZATION_PROMPT: &str = "Create a brief summary of the following dialogue in 3-5 sentences.\nPreserve the key facts, the topics discussed and any important context.\nReply ONLY with the summary text as plain text, WITHOUT any additional commentary.\n\nDialogue:\n{transcript}\n\nSummary:";

const SUMMARY_CONFIDENCE: f64 = 0.8;
const SUMMARY_CATEGORY: &str = "general";

/// Whether at least `threshold` turns have accumulated since the last summary.
///
/// With no summary yet, the whole history counts as new.
pub fn should_compress(history: &[ChatTurn], threshold: usize) -> bool {
    if history.len() < threshold {
        return false;
    }

    match history.iter().rposition(|turn| turn.is_summary) {
        None => history.len() >= threshold,
        Some(last_summary) => history.len() - last_summary - 1 >= threshold,
    }
}

/// Role-labelled transcript handed to the summarizer.
pub fn format_transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role().label(), turn.text))
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Outcome of [`HistoryCompressor::compress_or_keep`].
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// History to use for the next request.
    pub history: Vec<ChatTurn>,
    /// True when a new summary turn was spliced in.
    pub compressed: bool,
    /// The summarizer failure, when compression was attempted and abandoned.
    pub error: Option<ChatCoreError>,
}

pub struct HistoryCompressor {
    summarizer: Arc<dyn Summarizer>,
    config: CompressionConfig,
}

impl HistoryCompressor {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: CompressionConfig) -> Self {
        Self { summarizer, config }
    }

    /// Sets the number of new turns that triggers compression
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Sets the default number of recent turns kept verbatim
    pub fn with_keep_recent_count(mut self, keep_recent_count: usize) -> Self {
        self.config.keep_recent_count = keep_recent_count;
        self
    }

    pub fn threshold(&self) -> usize {
        self.config.threshold
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn should_compress(&self, history: &[ChatTurn]) -> bool {
        should_compress(history, self.config.threshold)
    }

    /// Compresses with the configured `keep_recent_count`.
    pub async fn compress(&self, history: &[ChatTurn]) -> Result<Vec<ChatTurn>, ChatCoreError> {
        self.compress_history(history, self.config.keep_recent_count)
            .await
    }

    /// Replaces old turns with a summary when the threshold is reached.
    ///
    /// Returns the history unchanged when compression is not due or nothing is old
    /// enough to summarize. The only error is a failed summarizer call.
    pub async fn compress_history(
        &self,
        history: &[ChatTurn],
        keep_recent_count: usize,
    ) -> Result<Vec<ChatTurn>, ChatCoreError> {
        if !self.should_compress(history) {
            return Ok(history.to_vec());
        }

        info!("Compressing history: {} turns", history.len());

        let summary_count = history.iter().take_while(|turn| turn.is_summary).count();
        let (existing_summaries, rest) = history.split_at(summary_count);

        if rest.len() <= keep_recent_count {
            debug!(
                "Nothing to summarize: {} new turns, keeping {}",
                rest.len(),
                keep_recent_count
            );
            return Ok(history.to_vec());
        }

        let (to_summarize, to_keep) = rest.split_at(rest.len() - keep_recent_count);
        info!(
            "Found {} existing summaries, summarizing {} turns, keeping {}",
            existing_summaries.len(),
            to_summarize.len(),
            to_keep.len()
        );

        let request = self.build_summary_request(to_summarize);
        let summary_text = match self.summarizer.summarize(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Summarizer returned an empty summary");
                return Err(ChatCoreError::SummarizationError(
                    "Empty summary from summarizer".to_string(),
                ));
            }
            Err(e) => {
                warn!("Compression failed: {}", e);
                return Err(e);
            }
        };

        let summary = Self::summary_turn(summary_text, to_summarize, existing_summaries.len() + 1);

        let mut compressed = Vec::with_capacity(existing_summaries.len() + 1 + to_keep.len());
        compressed.extend_from_slice(existing_summaries);
        compressed.push(summary);
        compressed.extend_from_slice(to_keep);

        info!(
            "Compression complete: {} -> {} turns, ~{} -> ~{} tokens",
            history.len(),
            compressed.len(),
            tokens::estimate_tokens_for_history(history),
            tokens::estimate_tokens_for_history(&compressed)
        );

        Ok(compressed)
    }

    /// Compression as a best-effort step: on summarizer failure the original history is
    /// returned and the error is reported alongside it.
    pub async fn compress_or_keep(
        &self,
        history: &[ChatTurn],
        keep_recent_count: usize,
    ) -> CompressionResult {
        match self.compress_history(history, keep_recent_count).await {
            Ok(result) => CompressionResult {
                compressed: result.len() < history.len(),
                history: result,
                error: None,
            },
            Err(e) => {
                warn!("Continuing with uncompressed history: {}", e);
                CompressionResult {
                    history: history.to_vec(),
                    compressed: false,
                    error: Some(e),
                }
            }
        }
    }

    pub fn calculate_compression_stats(
        original: &[ChatTurn],
        compressed: &[ChatTurn],
    ) -> CompressionStatistics {
        CompressionStatistics::between(original, compressed)
    }

    fn build_summary_request(&self, turns: &[ChatTurn]) -> SummaryRequest {
        SummaryRequest {
            prompt: SUMMARIZATION_PROMPT.replace("{transcript}", &format_transcript(turns)),
            temperature: self.config.summary_temperature,
            max_tokens: self.config.summary_max_tokens,
        }
    }

    fn summary_turn(text: String, replaced: &[ChatTurn], ordinal: usize) -> ChatTurn {
        let estimate = tokens::estimate_tokens(&text);
        let mut turn = ChatTurn::new(generate_id(), text, false)
            .with_title(format!("Summary #{}", ordinal))
            .with_metadata(ResponseMetadata::new(SUMMARY_CONFIDENCE, SUMMARY_CATEGORY));
        turn.timestamp = now_millis();
        turn.is_summary = true;
        turn.summarized_count = Some(replaced.len());
        turn.original_ids = Some(replaced.iter().map(|t| t.id.clone()).collect());
        turn.estimated_token_count = Some(estimate);
        turn
    }
}
