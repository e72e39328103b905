use std::collections::BTreeMap;
use std::fmt;

use autonp_core::{EdgeKind, Evidence, SourceTag};
use serde::{Deserialize, Serialize};

/// Entity kind of a network node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Herb,
    Compound,
    Target,
    Disease,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Herb => "herb",
            NodeKind::Compound => "compound",
            NodeKind::Target => "target",
            NodeKind::Disease => "disease",
        }
    }

    /// Node kinds an edge of `kind` connects, as (from, to).
    pub fn endpoints(kind: EdgeKind) -> (NodeKind, NodeKind) {
        match kind {
            EdgeKind::HerbCompound => (NodeKind::Herb, NodeKind::Compound),
            EdgeKind::CompoundTarget => (NodeKind::Compound, NodeKind::Target),
            EdgeKind::TargetDisease => (NodeKind::Target, NodeKind::Disease),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph node weight: which entity the node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub key: String,
}

/// A node in the serialized graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// An edge in the serialized graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relationship: EdgeKind,
    pub sources: Vec<SourceTag>,
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_kind: BTreeMap<NodeKind, usize>,
    pub edges_by_kind: BTreeMap<EdgeKind, usize>,
}

/// One row of the herb / compound / target / gene table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetGeneRow {
    pub herb: String,
    pub compound_id: String,
    pub compound_name: String,
    pub target_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
}
