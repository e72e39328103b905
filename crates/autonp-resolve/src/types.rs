use std::collections::{BTreeMap, BTreeSet};

use autonp_core::{
    CanonicalCompound, CanonicalTarget, Disease, Edge, Herb, MergeStatus, RejectReason, SourceTag,
};
use serde::Serialize;

/// What merging did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Accepted and founded its canonical entity.
    NewCanonical,
    /// Accepted (or a reference record) and joined an existing entity.
    MergedIntoExisting,
    /// Rejected, kept as provenance on an admitted entity.
    ProvenanceOnly,
    /// Rejected, and no accepted record shares its identity.
    RejectedOnly,
    /// Reference record that matched no admitted target.
    ReferenceOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome {
    pub source: SourceTag,
    pub native_id: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    pub resolution: Resolution,
    /// Primary key of the admitted entity the record ended up in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

/// A canonical entity that absorbed others in the reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub canonical: String,
    pub absorbed: Vec<String>,
}

/// Admitted entities and edges, keyed by primary key (or term).
#[derive(Debug, Clone, Default)]
pub struct MergedEntities {
    pub compounds: BTreeMap<String, CanonicalCompound>,
    pub targets: BTreeMap<String, CanonicalTarget>,
    pub herbs: BTreeMap<String, Herb>,
    pub diseases: BTreeMap<String, Disease>,
    /// Sorted by (kind, from, to).
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    pub entities: MergedEntities,
    /// One per input record, in input order.
    pub outcomes: Vec<RecordOutcome>,
    pub reconciliations: Vec<Reconciliation>,
    /// Herb names seen in records that matched no configured term.
    pub unmatched_herbs: BTreeSet<String>,
}

impl MergeResult {
    /// Primary keys of compounds and targets merged on name alone.
    pub fn ambiguous_keys(&self) -> Vec<String> {
        let compounds = self
            .entities
            .compounds
            .values()
            .filter(|c| c.status == MergeStatus::AmbiguousMerge)
            .map(|c| c.primary_key.clone());
        let targets = self
            .entities
            .targets
            .values()
            .filter(|t| t.status == MergeStatus::AmbiguousMerge)
            .map(|t| t.primary_key.clone());
        compounds.chain(targets).collect()
    }
}
