//! Normalize, filter, merge, assemble, summarize.

use std::collections::BTreeMap;
use std::sync::Arc;

use autonp_core::{
    AutonpConfig, Error, FilterVerdict, NormalizedRecord, RawRecord, Result, SourceTag,
};
use autonp_filter::FilterEngine;
use autonp_ingest::normalize;
use autonp_resolve::Merger;
use autonp_store::assemble;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::report::summarize;
use crate::types::*;

/// Normalized and judged records from one batch.
struct BatchResult {
    position: usize,
    source: SourceTag,
    judged: Vec<(NormalizedRecord, FilterVerdict)>,
    stats: StageStats,
}

/// Runs one configuration over any number of source batches.
pub struct Pipeline {
    config: Arc<AutonpConfig>,
    engine: Arc<FilterEngine>,
}

impl Pipeline {
    /// Validate the configuration and build the filter tables once.
    pub fn new(config: AutonpConfig) -> Result<Self> {
        config.validate()?;
        let engine = FilterEngine::new(&config.filter);
        info!(
            "Pipeline initialized: {} herbs, {} diseases, exact_match={}",
            config.search.herbs.len(),
            config.search.diseases.len(),
            config.search.exact_match
        );
        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
        })
    }

    /// Run the whole pipeline.
    ///
    /// Fails on an unknown source tag or a dangling edge; per-record
    /// normalization failures are logged and reported instead.
    pub async fn run(&self, batches: Vec<SourceBatch>) -> Result<PipelineOutput> {
        let mut tasks = JoinSet::new();
        for (position, batch) in batches.into_iter().enumerate() {
            let source: SourceTag = batch.source.parse()?;
            let engine = Arc::clone(&self.engine);
            tasks.spawn(async move { process_batch(position, source, batch.records, &engine) });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let result =
                joined.map_err(|e| Error::Internal(format!("source task failed: {}", e)))??;
            results.push(result);
        }
        // Merge order is fixed regardless of task completion order.
        results.sort_by_key(|r| (r.source, r.position));

        let mut stages: BTreeMap<SourceTag, StageStats> = BTreeMap::new();
        let mut judged = Vec::new();
        for result in results {
            let stage = stages.entry(result.source).or_default();
            stage.fetched += result.stats.fetched;
            stage.normalized += result.stats.normalized;
            stage.failures.extend(result.stats.failures);
            judged.extend(result.judged);
        }

        let merged = Merger::new(&self.config.search).merge(judged);
        let ambiguous_merges = merged.ambiguous_keys();
        let entities = merged.entities;
        let network = assemble(
            entities.compounds,
            entities.targets,
            entities.herbs,
            entities.diseases,
            entities.edges,
        )?;
        network.verify()?;
        let network_digest = network.fingerprint()?;

        let state = PipelineState {
            stages,
            outcomes: merged.outcomes,
            ambiguous_merges,
            reconciliations: merged.reconciliations,
            unmatched_herbs: merged.unmatched_herbs,
            network,
            network_digest,
        };
        let report = summarize(&state);
        info!(
            "Run complete: {} nodes, {} edges, digest {}",
            report.network.node_count, report.network.edge_count, report.network_digest
        );

        Ok(PipelineOutput {
            network: state.network,
            report,
        })
    }
}

/// Normalize and filter one batch. Records with a blank source inherit the
/// batch's; records tagged with another source count as normalization
/// failures of the batch's source.
fn process_batch(
    position: usize,
    source: SourceTag,
    records: Vec<RawRecord>,
    engine: &FilterEngine,
) -> Result<BatchResult> {
    let mut stats = StageStats {
        fetched: records.len(),
        ..Default::default()
    };
    let mut judged = Vec::with_capacity(records.len());

    for mut raw in records {
        if raw.source.trim().is_empty() {
            raw.source = source.as_str().to_string();
        }
        let outcome = normalize(&raw).and_then(|record| {
            if record.source == source {
                Ok(record)
            } else {
                Err(Error::Normalization {
                    source_tag: record.source,
                    native_id: record.native_id,
                    reason: "tagged for another source".to_string(),
                })
            }
        });

        match outcome {
            Ok(record) => {
                let verdict = engine.evaluate(&record);
                stats.normalized += 1;
                judged.push((record, verdict));
            }
            Err(Error::Normalization {
                source_tag,
                native_id,
                reason,
            }) => {
                let reason = if source_tag == source {
                    reason
                } else {
                    format!("{} record: {}", source_tag, reason)
                };
                warn!("Skipping {}/{}: {}", source, native_id, reason);
                stats.failures.push(NormalizationFailure {
                    source,
                    native_id,
                    reason,
                });
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Batch {} ({}): {} fetched, {} normalized, {} accepted",
        position,
        source,
        stats.fetched,
        stats.normalized,
        judged.iter().filter(|(_, v)| v.accepted).count()
    );

    Ok(BatchResult {
        position,
        source,
        judged,
        stats,
    })
}
