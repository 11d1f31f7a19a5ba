//! Candidate filter validation

use crate::enricher::enrich;
use crate::shapes::validate_value;
use crate::RejectionReason;
use hearth_domain::{FilterCatalog, FilterInstance, SourceType, ValueType};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Keys of the core wire shape; everything else is carried in `extra`
const CORE_FIELDS: [&str; 7] = [
    "id",
    "type",
    "source_type",
    "label",
    "filterType",
    "value",
    "timestamp",
];

/// A dropped candidate and why it was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position of the candidate in the input batch
    pub index: usize,

    /// Reason for rejection
    pub reason: RejectionReason,
}

/// Outcome of validating a batch of candidates
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Admitted filters, in input order
    pub accepted: Vec<FilterInstance>,

    /// Dropped candidates
    pub rejected: Vec<Rejection>,
}

/// The Gatekeeper validates untrusted candidate filters against the catalog
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    catalog: Arc<FilterCatalog>,
}

impl Gatekeeper {
    /// Create a Gatekeeper over a shared catalog
    pub fn new(catalog: Arc<FilterCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog candidates are checked against
    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// Validate one candidate, stamping missing timestamps with the current time
    pub fn validate(
        &self,
        candidate: &Value,
        context: SourceType,
    ) -> Result<FilterInstance, RejectionReason> {
        self.validate_at(candidate, context, chrono::Utc::now().timestamp())
    }

    /// Validate one candidate with an explicit "now" (unix seconds)
    ///
    /// Checks run in order: wire shape, declared type, source type, catalog
    /// id, declared type against the definition, then the per-type value
    /// validator. The first failure rejects the candidate.
    pub fn validate_at(
        &self,
        candidate: &Value,
        context: SourceType,
        now: i64,
    ) -> Result<FilterInstance, RejectionReason> {
        let fields = candidate.as_object().ok_or(RejectionReason::NotAnObject)?;

        let id = fields
            .get("id")
            .and_then(integer_id)
            .ok_or(RejectionReason::MissingField("id"))?;
        let declared_type = str_field(fields, "type")?;
        let declared_source = str_field(fields, "source_type")?;
        let label = str_field(fields, "label")?;
        let value = fields
            .get("value")
            .filter(|v| !v.is_null())
            .ok_or(RejectionReason::MissingField("value"))?;

        let value_type = ValueType::parse(declared_type)
            .ok_or_else(|| RejectionReason::UnknownType(declared_type.to_string()))?;

        if SourceType::parse(declared_source) != Some(context) {
            return Err(RejectionReason::SourceMismatch {
                found: declared_source.to_string(),
                expected: context,
            });
        }

        let definition =
            self.catalog
                .lookup(id, context)
                .ok_or(RejectionReason::UnknownId {
                    id,
                    source_type: context,
                })?;

        if definition.value_type != value_type {
            return Err(RejectionReason::TypeMismatch {
                id,
                declared: value_type,
                expected: definition.value_type,
            });
        }

        let operator = match value_type {
            ValueType::Bool => None,
            _ => Some(str_field(fields, "filterType")?.to_string()),
        };

        let value = validate_value(value_type, operator.as_deref(), value.clone())?;

        let timestamp = fields
            .get("timestamp")
            .and_then(Value::as_i64)
            .unwrap_or(now);

        let extra = fields
            .iter()
            .filter(|(key, _)| !CORE_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(FilterInstance {
            id,
            value_type,
            source_type: context,
            label: label.to_string(),
            operator,
            value,
            timestamp: Some(timestamp),
            extra,
        })
    }

    /// Validate and enrich one candidate
    pub fn admit(
        &self,
        candidate: &Value,
        context: SourceType,
    ) -> Result<FilterInstance, RejectionReason> {
        let filter = self.validate(candidate, context)?;
        Ok(self.enrich_from_catalog(filter))
    }

    /// Validate and enrich a batch, dropping (and logging) invalid candidates
    pub fn admit_all(&self, candidates: &[Value], context: SourceType) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (index, candidate) in candidates.iter().enumerate() {
            match self.admit(candidate, context) {
                Ok(filter) => {
                    debug!("Admitted filter {} ({})", filter.key(), filter.label);
                    report.accepted.push(filter);
                }
                Err(reason) => {
                    warn!(
                        "Dropping candidate filter #{} ({:?}): {}",
                        index,
                        reason.kind(),
                        reason
                    );
                    report.rejected.push(Rejection { index, reason });
                }
            }
        }

        report
    }

    fn enrich_from_catalog(&self, filter: FilterInstance) -> FilterInstance {
        match self.catalog.lookup(filter.id, filter.source_type) {
            Some(definition) => enrich(filter, definition),
            None => filter,
        }
    }
}

/// Integer id, also accepted as a string such as `"3"`
fn integer_id(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    }
}

fn str_field<'a>(
    fields: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, RejectionReason> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or(RejectionReason::MissingField(name))
}
