//! Model reply parsing: raw text in, [`ParseOutcome`] out.
//!
//! [`ResponseParser`] classifies a reply as clean, degraded-but-usable, or unusable;
//! [`metrics`] adds word-count and step-structure annotations for the comparison flows.

pub mod metrics;
pub mod outcome;
pub mod response_parser;

pub use metrics::enrich_with_metrics;
pub use outcome::{ParseOutcome, ValidationResult};
pub use response_parser::{ParseMode, ResponseParser};
