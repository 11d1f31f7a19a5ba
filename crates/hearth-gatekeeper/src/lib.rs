//! Hearth Gatekeeper
//!
//! Validates, repairs and enriches untrusted candidate filters.
//!
//! The Gatekeeper provides:
//! - Catalog checks (known id, matching type, matching source type)
//! - One value validator per value type, selected by pattern match
//! - Light repair of common model-output malformations
//! - Enrichment with catalog metadata and multiselect option records
//!
//! A candidate is either admitted whole or dropped; there is no partially
//! applied filter.
//!
//! # Examples
//!
//! ```
//! use hearth_domain::{FilterCatalog, SourceType};
//! use hearth_gatekeeper::Gatekeeper;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let gatekeeper = Gatekeeper::new(Arc::new(FilterCatalog::builtin()));
//! let candidate = json!({
//!     "id": 1, "type": "number", "source_type": "properties",
//!     "label": "Property Value", "filterType": "lt", "value": 100000
//! });
//!
//! let filter = gatekeeper.admit(&candidate, SourceType::Properties).unwrap();
//! assert_eq!(filter.value, json!({"lt": 100000}));
//! ```

#![warn(missing_docs)]

mod enricher;
mod error;
mod shapes;
mod validator;

pub use enricher::enrich;
pub use error::{RejectionKind, RejectionReason};
pub use shapes::{operators_for, DateOp, MultiselectOp, NumberOp, TextOp};
pub use validator::{Gatekeeper, Rejection, ValidationReport};
