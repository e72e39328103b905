//! Run report: pure aggregation over a finished pipeline state.

use std::collections::BTreeMap;

use autonp_core::{EdgeKind, SourceTag};
use autonp_resolve::Resolution;

use crate::types::{HerbCoverage, PipelineState, RejectionAudit, Report, SourceSummary};

pub fn summarize(state: &PipelineState) -> Report {
    let mut sources: BTreeMap<SourceTag, SourceSummary> = BTreeMap::new();

    for (source, stage) in &state.stages {
        let summary = sources.entry(*source).or_default();
        summary.fetched += stage.fetched;
        summary.normalized += stage.normalized;
        summary.normalization_failures += stage.failures.len();
    }

    let mut rejections = Vec::new();
    for outcome in &state.outcomes {
        let summary = sources.entry(outcome.source).or_default();
        if outcome.accepted {
            summary.accepted += 1;
        } else {
            summary.rejected += 1;
            if let Some(reason) = outcome.reason {
                *summary.rejected_by_reason.entry(reason.label()).or_default() += 1;
                rejections.push(RejectionAudit {
                    source: outcome.source,
                    native_id: outcome.native_id.clone(),
                    reason,
                    canonical: outcome.canonical.clone(),
                });
            }
        }
        match outcome.resolution {
            Resolution::NewCanonical => summary.new_canonical += 1,
            Resolution::MergedIntoExisting => summary.merged_into_existing += 1,
            Resolution::ProvenanceOnly => summary.provenance_only += 1,
            Resolution::ReferenceOnly => summary.reference_only += 1,
            Resolution::RejectedOnly => {}
        }
    }

    let network = &state.network;

    let mut herb_coverage: BTreeMap<String, HerbCoverage> = network
        .herbs()
        .keys()
        .map(|term| (term.clone(), HerbCoverage::default()))
        .collect();
    for edge in network.edges() {
        if edge.kind != EdgeKind::HerbCompound {
            continue;
        }
        if let Some(coverage) = herb_coverage.get_mut(&edge.from) {
            coverage.compounds += 1;
            coverage.sources.extend(
                edge.evidence
                    .iter()
                    .filter(|e| e.verdict.accepted)
                    .map(|e| e.source),
            );
        }
    }
    let uncovered_herbs = herb_coverage
        .iter()
        .filter(|(_, c)| c.compounds == 0)
        .map(|(term, _)| term.clone())
        .collect();

    let normalization_failures = state
        .stages
        .values()
        .flat_map(|stage| stage.failures.iter().cloned())
        .collect();

    Report {
        sources,
        ambiguous_merges: state.ambiguous_merges.clone(),
        reconciliations: state.reconciliations.clone(),
        unmatched_herbs: state.unmatched_herbs.iter().cloned().collect(),
        herb_coverage,
        uncovered_herbs,
        normalization_failures,
        rejections,
        network: network.stats(),
        network_digest: state.network_digest.clone(),
    }
}
