//! Runtime types.

use std::collections::{BTreeMap, BTreeSet};

use autonp_core::{RawRecord, RejectReason, SourceTag};
use autonp_resolve::{RecordOutcome, Reconciliation};
use autonp_store::{GraphStats, Network};
use serde::{Deserialize, Serialize};

/// Raw records fetched from one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBatch {
    pub source: String,
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn new(source: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }
}

/// A record that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationFailure {
    pub source: SourceTag,
    pub native_id: String,
    pub reason: String,
}

/// Result of one stage over one source batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageStats {
    pub fetched: usize,
    pub normalized: usize,
    pub failures: Vec<NormalizationFailure>,
}

/// Everything the report is computed from.
#[derive(Debug)]
pub struct PipelineState {
    pub stages: BTreeMap<SourceTag, StageStats>,
    pub outcomes: Vec<RecordOutcome>,
    /// Primary keys of entities merged on name alone.
    pub ambiguous_merges: Vec<String>,
    pub reconciliations: Vec<Reconciliation>,
    pub unmatched_herbs: BTreeSet<String>,
    pub network: Network,
    /// `Network::fingerprint` of `network`.
    pub network_digest: String,
}

/// Per-source counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub fetched: usize,
    pub normalized: usize,
    pub normalization_failures: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Keyed by reason label, e.g. `below_threshold(oral_bioavailability)`.
    pub rejected_by_reason: BTreeMap<String, usize>,
    pub new_canonical: usize,
    pub merged_into_existing: usize,
    pub provenance_only: usize,
    pub reference_only: usize,
}

/// Which sources contributed compounds to a configured herb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HerbCoverage {
    pub compounds: usize,
    pub sources: BTreeSet<SourceTag>,
}

/// One rejected record, for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionAudit {
    pub source: SourceTag,
    pub native_id: String,
    pub reason: RejectReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub sources: BTreeMap<SourceTag, SourceSummary>,
    pub ambiguous_merges: Vec<String>,
    pub reconciliations: Vec<Reconciliation>,
    pub unmatched_herbs: Vec<String>,
    pub herb_coverage: BTreeMap<String, HerbCoverage>,
    /// Configured herbs with no compound from any source.
    pub uncovered_herbs: Vec<String>,
    pub normalization_failures: Vec<NormalizationFailure>,
    pub rejections: Vec<RejectionAudit>,
    pub network: GraphStats,
    pub network_digest: String,
}

/// What a run produces.
#[derive(Debug)]
pub struct PipelineOutput {
    pub network: Network,
    pub report: Report,
}
