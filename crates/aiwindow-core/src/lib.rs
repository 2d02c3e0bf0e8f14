//! Structured LLM response parsing and conversation history compression.
//!
//! Two pieces sit between a chat front end and a language model:
//!
//! - **Response parsing**: model replies are asked to follow a JSON envelope
//!   (`title`, `content`, `metadata`) but often come back fenced, truncated, or as plain
//!   prose. [`parsing::ResponseParser`] turns any reply into a three-way
//!   [`parsing::ParseOutcome`] so degraded output still reaches the user with a warning.
//! - **History compression**: [`compression::HistoryCompressor`] folds old turns into a
//!   summary produced by a [`compression::Summarizer`] once enough new turns accumulate,
//!   keeping recent turns verbatim. Token counts come from the word-based estimate in
//!   [`tokens`].
//!
//! Configuration is YAML ([`config`]); the YandexGPT summarizer lives in [`llm`].

pub mod compression;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod parsing;
pub mod tokens;

pub use compression::{HistoryCompressor, Summarizer, SummaryRequest};
pub use config::*;
pub use core_types::{ChatTurn, ResponseMetadata, StructuredResponse};
pub use errors::ChatCoreError;
pub use llm::YandexGptSummarizer;
pub use parsing::{ParseMode, ParseOutcome, ResponseParser, ValidationResult};
