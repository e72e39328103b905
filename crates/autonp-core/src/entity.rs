//! Canonical entities and typed edges produced by merging.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Alias, Attribute, Confidence, SourceTag, StructuralKey};
use crate::verdict::{FilterVerdict, RejectReason};

/// One value of a numeric attribute together with the record it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub value: f64,
    pub source: SourceTag,
    pub native_id: String,
}

/// A rejection kept as provenance on an admitted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionNote {
    pub source: SourceTag,
    pub native_id: String,
    pub reason: RejectReason,
}

/// Outcome of merging records into a canonical identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeStatus {
    /// Single structural identity, or a name identity backed by one record.
    Clean,
    /// Several records merged on display name alone; needs manual audit.
    AmbiguousMerge,
    /// Identities found to share a structural key after the first pass were
    /// folded into this one.
    Reconciled { absorbed: Vec<String> },
}

/// A deduplicated compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCompound {
    pub primary_key: String,
    pub display_name: String,
    pub confidence: Confidence,
    pub structural_keys: BTreeSet<StructuralKey>,
    pub aliases: BTreeSet<Alias>,
    pub attributes: BTreeMap<Attribute, Vec<AttributeValue>>,
    pub rejections: Vec<RejectionNote>,
    pub status: MergeStatus,
}

impl CanonicalCompound {
    /// All values recorded for an attribute, in record order.
    pub fn attribute_values(&self, attribute: Attribute) -> &[AttributeValue] {
        self.attributes
            .get(&attribute)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute reported by a given source.
    pub fn value_from(&self, attribute: Attribute, source: SourceTag) -> Option<f64> {
        self.attribute_values(attribute)
            .iter()
            .find(|v| v.source == source)
            .map(|v| v.value)
    }

    pub fn sources(&self) -> BTreeSet<SourceTag> {
        self.aliases.iter().map(|a| a.source).collect()
    }
}

/// A deduplicated biological target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTarget {
    pub primary_key: String,
    pub display_name: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    pub aliases: BTreeSet<Alias>,
    pub rejections: Vec<RejectionNote>,
    pub status: MergeStatus,
}

/// A configured herb search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Herb {
    pub term: String,
    /// Source herb names that resolved to this term.
    pub matched_names: BTreeSet<String>,
}

impl Herb {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            matched_names: BTreeSet::new(),
        }
    }
}

/// A configured disease term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disease {
    pub term: String,
}

/// Relation type; also fixes which entity kinds the endpoints refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    HerbCompound,
    CompoundTarget,
    TargetDisease,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::HerbCompound => "herb_compound",
            EdgeKind::CompoundTarget => "compound_target",
            EdgeKind::TargetDisease => "target_disease",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source record supporting an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: SourceTag,
    pub native_id: String,
    pub verdict: FilterVerdict,
}

/// A directed relation with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: String,
    pub to: String,
    pub sources: BTreeSet<SourceTag>,
    pub evidence: Vec<Evidence>,
}

impl Edge {
    pub fn new(kind: EdgeKind, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
            sources: BTreeSet::new(),
            evidence: Vec::new(),
        }
    }

    pub fn add_evidence(&mut self, evidence: Evidence) {
        self.sources.insert(evidence.source);
        self.evidence.push(evidence);
    }

    /// Whether at least one accepted record supports this edge.
    pub fn is_admitted(&self) -> bool {
        self.evidence.iter().any(|e| e.verdict.accepted)
    }
}
