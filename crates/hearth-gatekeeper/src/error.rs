//! Rejection reasons for candidate filters

use hearth_domain::{SourceType, ValueType};
use thiserror::Error;

/// Broad category of a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Unknown id, type or source type for the catalog
    CatalogMismatch,

    /// Value or operator does not fit the type contract after repair
    ShapeViolation,
}

/// Why a candidate filter was dropped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// Candidate is not a JSON object
    #[error("candidate is not an object")]
    NotAnObject,

    /// A required wire field is missing or has the wrong JSON type
    #[error("missing or malformed field '{0}'")]
    MissingField(&'static str),

    /// Declared type is not one of the five value types
    #[error("unknown filter type '{0}'")]
    UnknownType(String),

    /// Declared source type differs from the extraction context
    #[error("source type '{found}' does not match context '{expected}'")]
    SourceMismatch {
        /// Source type the candidate declared
        found: String,
        /// Source type being extracted
        expected: SourceType,
    },

    /// Id is not in the catalog for the source type
    #[error("filter id {id} is not defined for {source_type}")]
    UnknownId {
        /// Candidate id
        id: i64,
        /// Source type searched
        source_type: SourceType,
    },

    /// Declared type differs from the catalog's value type
    #[error("filter {id} declares type {declared} but is defined as {expected}")]
    TypeMismatch {
        /// Candidate id
        id: i64,
        /// Type the candidate declared
        declared: ValueType,
        /// Type in the catalog
        expected: ValueType,
    },

    /// Operator is not valid for the value type
    #[error("operator '{operator}' is not valid for {value_type} filters")]
    InvalidOperator {
        /// Value type of the filter
        value_type: ValueType,
        /// Operator the candidate used
        operator: String,
    },

    /// Value does not match the operator's shape
    #[error("invalid {value_type} value: {detail}")]
    InvalidValue {
        /// Value type of the filter
        value_type: ValueType,
        /// What was wrong
        detail: String,
    },
}

impl RejectionReason {
    /// Classify the rejection
    pub fn kind(&self) -> RejectionKind {
        match self {
            RejectionReason::UnknownType(_)
            | RejectionReason::SourceMismatch { .. }
            | RejectionReason::UnknownId { .. }
            | RejectionReason::TypeMismatch { .. } => RejectionKind::CatalogMismatch,
            RejectionReason::NotAnObject
            | RejectionReason::MissingField(_)
            | RejectionReason::InvalidOperator { .. }
            | RejectionReason::InvalidValue { .. } => RejectionKind::ShapeViolation,
        }
    }

    pub(crate) fn invalid(value_type: ValueType, detail: impl Into<String>) -> Self {
        RejectionReason::InvalidValue {
            value_type,
            detail: detail.into(),
        }
    }
}
