//! Conversation history compression.
//!
//! Old turns are periodically folded into a single summary turn produced by a model,
//! while the most recent turns stay verbatim. The model call is reached through the
//! [`Summarizer`] capability so the policy here can be exercised without a network.

pub mod history_compressor;
pub mod stats;

pub use history_compressor::{
    format_transcript, should_compress, CompressionResult, HistoryCompressor,
};
pub use stats::{ComparisonStats, CompressionStatistics, RequestSample};

use crate::errors::ChatCoreError;
use async_trait::async_trait;

/// One summarization call: the full prompt plus the sampling parameters to use.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Asks a model to summarize a transcript.
///
/// Implementations return the summary text. Network, decode and cancellation problems
/// are reported as errors; the compressor never retries.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, ChatCoreError>;
}
