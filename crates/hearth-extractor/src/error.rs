//! Error types for the Extractor
//!
//! None of these escape `Extractor::extract`; they drive the fallback chain
//! and end up as the result's `error` message.

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The language-model request failed
    #[error("LLM error: {0}")]
    ModelRequest(String),

    /// The model replied, but nothing usable could be parsed from it
    #[error("Unusable model output: {0}")]
    ModelOutput(String),

    /// Applied filters supplied by the caller are malformed
    #[error("Invalid applied filters: {0}")]
    InvalidApplied(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
