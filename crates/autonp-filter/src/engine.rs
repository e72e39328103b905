//! Filter evaluation.

use std::collections::BTreeMap;

use autonp_core::{FilterConfig, FilterVerdict, NormalizedRecord, RejectReason, SourceTag};
use tracing::debug;

use crate::thresholds::SourceThresholds;

/// Evaluate a record against its source's thresholds.
///
/// Only the thresholds applicable to the record's columns are checked (see
/// `SourceThresholds::applicable`), in table order, and the first failure
/// becomes the rejection reason. A malformed value rejects as `malformed_value`, an
/// absent one as `missing_field`, and a failed comparison (NaN included) as
/// `below_threshold`.
pub fn evaluate(record: &NormalizedRecord, thresholds: &SourceThresholds) -> FilterVerdict {
    let applied = thresholds.applicable(record);

    for threshold in &applied {
        let attribute = threshold.attribute;
        let reason = if record.malformed.contains_key(&attribute) {
            Some(RejectReason::MalformedValue(attribute))
        } else {
            match record.attribute(attribute) {
                None => Some(RejectReason::MissingField(attribute)),
                Some(v) if !threshold.admits(v) => Some(RejectReason::BelowThreshold(attribute)),
                Some(_) => None,
            }
        };

        if let Some(reason) = reason {
            debug!(
                "{}/{} rejected: {} (threshold {})",
                record.source, record.native_id, reason, threshold
            );
            return FilterVerdict::reject(record.source, reason, applied.clone());
        }
    }

    FilterVerdict::accept(record.source, applied)
}

/// Holds one threshold table per source.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    tables: BTreeMap<SourceTag, SourceThresholds>,
}

impl FilterEngine {
    pub fn new(config: &FilterConfig) -> Self {
        let tables = SourceTag::all()
            .iter()
            .map(|&source| (source, SourceThresholds::from_config(source, config)))
            .collect();
        Self { tables }
    }

    /// Threshold table for a source.
    pub fn thresholds_for(&self, source: SourceTag) -> Option<&SourceThresholds> {
        self.tables.get(&source)
    }

    /// Evaluate a record against the table of its own source.
    pub fn evaluate(&self, record: &NormalizedRecord) -> FilterVerdict {
        match self.thresholds_for(record.source) {
            Some(table) => evaluate(record, table),
            None => evaluate(record, &SourceThresholds::new(record.source)),
        }
    }
}
