//! Hearth Domain Layer
//!
//! This crate contains the filter model shared by every other Hearth crate:
//! the static filter catalog, the filter instances that flow between the
//! language model, the validator and the merge engine, and the trait boundary
//! to the language-model provider.
//!
//! ## Key Concepts
//!
//! - **Filter Definition**: an immutable catalog entry (id, label, value type)
//! - **Filter Instance**: a candidate or applied filter in wire shape
//! - **Catalog**: the read-only lookup table of definitions per source type
//! - **Source Type**: the dataset a filter applies to (properties, contacts)
//!
//! ## Architecture
//!
//! - Pure data and lookup logic only
//! - Infrastructure implementations (LLM clients) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod filter;
pub mod kind;
pub mod traits;

// Re-exports for convenience
pub use catalog::{CatalogError, FilterCatalog};
pub use filter::{FilterDefinition, FilterInstance, FilterOption};
pub use kind::{SourceType, ValueType};
pub use traits::{CompletionOptions, LlmProvider};
