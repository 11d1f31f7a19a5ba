//! Reconcile newly validated filters with an applied filter set
//!
//! Identity is the composite key `id:operator`. A new filter with the same
//! key as an applied one updates it; failing that, a new filter updates the
//! first still-unclaimed applied filter with the same id. Applied filters no
//! new filter claimed are carried over unchanged after the new ones.

use hearth_domain::FilterInstance;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Result of a merge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Canonical filter set, unique by `id:operator`
    pub filters: Vec<FilterInstance>,

    /// New filters whose id was not applied before
    pub new_filter_count: usize,

    /// New filters whose id was already applied
    pub updated_filter_count: usize,
}

/// Stateless merge of applied and new filter sets
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    /// Create a merge engine
    pub fn new() -> Self {
        Self
    }

    /// Merge `incoming` into `applied`, producing a new canonical set
    ///
    /// Repeated keys are collapsed in both inputs first. Exact key matches
    /// are resolved for the whole batch before id-only matches, so no applied
    /// filter is claimed twice.
    pub fn merge(&self, applied: &[FilterInstance], incoming: Vec<FilterInstance>) -> MergeOutcome {
        let applied_set = dedupe_by_key(applied.to_vec());
        let applied = applied_set.as_slice();
        let incoming = dedupe_by_key(incoming);

        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut by_id: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, filter) in applied.iter().enumerate() {
            by_key.entry(filter.key()).or_insert(index);
            by_id.entry(filter.id).or_default().push(index);
        }

        let mut claimed = vec![false; applied.len()];
        let mut targets: Vec<Option<usize>> = vec![None; incoming.len()];

        for (slot, filter) in incoming.iter().enumerate() {
            if let Some(&index) = by_key.get(&filter.key()) {
                if !claimed[index] {
                    claimed[index] = true;
                    targets[slot] = Some(index);
                }
            }
        }

        for (slot, filter) in incoming.iter().enumerate() {
            if targets[slot].is_some() {
                continue;
            }
            let candidates = by_id.get(&filter.id).map(Vec::as_slice).unwrap_or_default();
            if let Some(&index) = candidates.iter().find(|&&index| !claimed[index]) {
                claimed[index] = true;
                targets[slot] = Some(index);
            }
        }

        let applied_ids: HashSet<i64> = applied.iter().map(|f| f.id).collect();
        let updated_filter_count = incoming
            .iter()
            .filter(|f| applied_ids.contains(&f.id))
            .count();
        let new_filter_count = incoming.len() - updated_filter_count;

        let mut filters = Vec::with_capacity(incoming.len() + applied.len());
        for (filter, target) in incoming.into_iter().zip(targets) {
            match target {
                Some(index) => {
                    debug!("Updating applied filter {} with {}", applied[index].key(), filter.key());
                    filters.push(update(&applied[index], filter));
                }
                None => filters.push(filter),
            }
        }
        filters.extend(
            applied
                .iter()
                .zip(claimed.iter())
                .filter_map(|(filter, &was_claimed)| (!was_claimed).then(|| filter.clone())),
        );

        MergeOutcome {
            filters,
            new_filter_count,
            updated_filter_count,
        }
    }
}

/// Field-level update: the new filter wins, applied-only fields carry forward
fn update(previous: &FilterInstance, mut next: FilterInstance) -> FilterInstance {
    for (name, value) in &previous.extra {
        if !next.has_field(name) {
            next.extra.insert(name.clone(), value.clone());
        }
    }
    if next.timestamp.is_none() {
        next.timestamp = previous.timestamp;
    }
    next
}

/// Collapse repeated keys within one set; a later filter replaces the earlier one in place
fn dedupe_by_key(filters: Vec<FilterInstance>) -> Vec<FilterInstance> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<FilterInstance> = Vec::with_capacity(filters.len());

    for filter in filters {
        match position.get(&filter.key()) {
            Some(&index) => {
                debug!("Duplicate filter {} replaces an earlier one", filter.key());
                unique[index] = filter;
            }
            None => {
                position.insert(filter.key(), unique.len());
                unique.push(filter);
            }
        }
    }

    unique
}
