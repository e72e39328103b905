//! Per-source threshold tables.

use autonp_core::{Attribute, FilterConfig, NormalizedRecord, Operator, SourceTag, Threshold};
use serde::Serialize;

/// Swiss rows come from two tools sharing one tag: SwissTargetPrediction
/// rows carry a target and a probability, SwissADME rows carry rule and
/// absorption columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnFamily {
    Prediction,
    Adme,
}

impl ColumnFamily {
    const ALL: [ColumnFamily; 2] = [ColumnFamily::Prediction, ColumnFamily::Adme];

    fn of(attribute: Attribute) -> Option<Self> {
        match attribute {
            Attribute::PredictionProbability => Some(Self::Prediction),
            Attribute::AdmeRulesPassed | Attribute::GiAbsorptionHigh => Some(Self::Adme),
            _ => None,
        }
    }

    fn present_in(self, record: &NormalizedRecord) -> bool {
        let has = |a: Attribute| {
            record.attributes.contains_key(&a) || record.malformed.contains_key(&a)
        };
        match self {
            Self::Prediction => record.target.is_some() || has(Attribute::PredictionProbability),
            Self::Adme => has(Attribute::AdmeRulesPassed) || has(Attribute::GiAbsorptionHigh),
        }
    }
}

/// The thresholds configured for one source, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceThresholds {
    pub source: SourceTag,
    pub thresholds: Vec<Threshold>,
}

impl SourceThresholds {
    pub fn new(source: SourceTag) -> Self {
        Self {
            source,
            thresholds: Vec::new(),
        }
    }

    /// Append a threshold if a value is configured.
    pub fn with(mut self, attribute: Attribute, operator: Operator, value: Option<f64>) -> Self {
        if let Some(value) = value {
            self.thresholds.push(Threshold::new(attribute, operator, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// The thresholds that apply to `record`, in table order.
    ///
    /// A threshold tied to a column family is skipped when the record
    /// carries another family but none of its own. A record carrying no
    /// family at all gets every threshold.
    pub fn applicable(&self, record: &NormalizedRecord) -> Vec<Threshold> {
        let carried: Vec<ColumnFamily> = ColumnFamily::ALL
            .into_iter()
            .filter(|f| f.present_in(record))
            .collect();
        self.thresholds
            .iter()
            .filter(|t| match ColumnFamily::of(t.attribute) {
                Some(family) => carried.is_empty() || carried.contains(&family),
                None => true,
            })
            .copied()
            .collect()
    }

    /// Build the table for a source from the filter configuration.
    ///
    /// TCMSP keeps compounds above the OB/DL cut-offs; HERBac and PubChem
    /// apply Lipinski-style upper bounds; Swiss keeps predictions above the
    /// probability cut-off and SwissADME rows by rule and absorption
    /// screens. Reference and aggregate sources have no thresholds.
    pub fn from_config(source: SourceTag, config: &FilterConfig) -> Self {
        let table = Self::new(source);
        match source {
            SourceTag::Tcmsp => table
                .with(Attribute::OralBioavailability, Operator::Gt, config.tcmsp.ob)
                .with(Attribute::DrugLikeness, Operator::Gt, config.tcmsp.dl),
            SourceTag::Herbac => {
                table.with(Attribute::MolecularWeight, Operator::Le, config.herbac.weight)
            }
            SourceTag::Pubchem => table
                .with(Attribute::LogP, Operator::Le, config.pubchem.xlogp)
                .with(Attribute::HbondDonorCount, Operator::Le, config.pubchem.hbonddonor)
                .with(Attribute::HbondAcceptorCount, Operator::Le, config.pubchem.hbondacc),
            SourceTag::Swiss => table
                .with(Attribute::PredictionProbability, Operator::Gt, config.swiss.prob)
                .with(Attribute::AdmeRulesPassed, Operator::Ge, config.swiss.adme_rules)
                .with(
                    Attribute::GiAbsorptionHigh,
                    Operator::Ge,
                    config.swiss.gi_absorption_high.then_some(1.0),
                ),
            SourceTag::Uniprot | SourceTag::Autonp => table,
        }
    }
}
