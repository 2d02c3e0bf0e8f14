//! Model-backed summarization.
//!
//! The compressor only sees the [`Summarizer`](crate::compression::Summarizer)
//! capability; this module holds the concrete HTTP client for YandexGPT together with
//! its wire types.

pub mod yandex;

pub use yandex::{
    extract_summary, parse_completion, CompletionRequest, CompletionResponse, YandexGptSummarizer,
};
