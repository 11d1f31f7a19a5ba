//! Hearth Extractor
//!
//! Converts a natural-language search prompt into a canonical, typed filter set.
//!
//! # Overview
//!
//! The Extractor asks a language model for candidate filters, passes every
//! candidate through the Gatekeeper (validation, repair, enrichment) and
//! merges the survivors with the filters the caller already applied.
//!
//! # Architecture
//!
//! ```text
//! Prompt → Extractor → LLM → Candidates → Gatekeeper → MergeEngine → ExtractionResult
//! ```
//!
//! # Key Features
//!
//! - **Structured first**: a JSON-mode request, then free-text parsing, then a
//!   scan for a fenced array of filters
//! - **Never fails**: model errors return the applied filters plus an `error`
//! - **Refinement**: new filters update applied ones by `id:operator`, then by id
//! - **Naming**: model-supplied names with deterministic fallbacks
//!
//! # Example Usage
//!
//! ```no_run
//! use hearth_domain::{FilterCatalog, SourceType};
//! use hearth_extractor::{Extractor, ExtractorConfig, ExtractionRequest};
//! use hearth_gatekeeper::Gatekeeper;
//! use hearth_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let llm = MockProvider::new(r#"{"filters": [], "explanation": {"matched": "", "unmatched": ""}}"#);
//! let gatekeeper = Gatekeeper::new(Arc::new(FilterCatalog::builtin()));
//! let extractor = Extractor::new(llm, gatekeeper, ExtractorConfig::default());
//!
//! let request = ExtractionRequest::new("3 bedroom homes under 400k", SourceType::Properties);
//! let result = extractor.extract(request).await;
//!
//! println!("{}: {} filters", result.search_name, result.filter_count);
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod merge;
mod parser;
mod prompt;
mod types;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use merge::{MergeEngine, MergeOutcome};
pub use prompt::{filter_schema, response_schema};
pub use types::{parse_applied_filters, ExtractionRequest, ExtractionResult, Explanation};
