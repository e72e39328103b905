//! Herb-compound-target-disease network backed by petgraph.

use std::collections::{BTreeMap, HashMap};

use autonp_core::{
    CanonicalCompound, CanonicalTarget, Disease, Edge, EdgeKind, Error, Herb, Result,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::types::{
    GraphDocument, GraphEdge, GraphNode, GraphStats, NodeKind, NodeRef, TargetGeneRow,
};

/// The assembled network. Read-only once built.
#[derive(Debug)]
pub struct Network {
    graph: DiGraph<NodeRef, Edge>,
    node_index: HashMap<(NodeKind, String), NodeIndex>,
    compounds: BTreeMap<String, CanonicalCompound>,
    targets: BTreeMap<String, CanonicalTarget>,
    herbs: BTreeMap<String, Herb>,
    diseases: BTreeMap<String, Disease>,
}

/// Build a network from merged entities and edges.
///
/// Every edge endpoint must name an entity of the kind its edge kind
/// implies; the first one that does not aborts assembly with
/// `Error::DanglingReference`. Edges repeated with the same kind and
/// endpoints are folded, keeping all evidence.
pub fn assemble(
    compounds: BTreeMap<String, CanonicalCompound>,
    targets: BTreeMap<String, CanonicalTarget>,
    herbs: BTreeMap<String, Herb>,
    diseases: BTreeMap<String, Disease>,
    edges: Vec<Edge>,
) -> Result<Network> {
    let mut network = Network {
        graph: DiGraph::new(),
        node_index: HashMap::new(),
        compounds,
        targets,
        herbs,
        diseases,
    };

    let keys: Vec<(NodeKind, String)> = network
        .herbs
        .keys()
        .map(|k| (NodeKind::Herb, k.clone()))
        .chain(network.compounds.keys().map(|k| (NodeKind::Compound, k.clone())))
        .chain(network.targets.keys().map(|k| (NodeKind::Target, k.clone())))
        .chain(network.diseases.keys().map(|k| (NodeKind::Disease, k.clone())))
        .collect();
    for (kind, key) in keys {
        let idx = network.graph.add_node(NodeRef {
            kind,
            key: key.clone(),
        });
        network.node_index.insert((kind, key), idx);
    }

    let mut folded: BTreeMap<(EdgeKind, String, String), Edge> = BTreeMap::new();
    for edge in edges {
        match folded.get_mut(&(edge.kind, edge.from.clone(), edge.to.clone())) {
            Some(existing) => {
                for evidence in edge.evidence {
                    existing.add_evidence(evidence);
                }
            }
            None => {
                folded.insert((edge.kind, edge.from.clone(), edge.to.clone()), edge);
            }
        }
    }

    for edge in folded.into_values() {
        let (from_kind, to_kind) = NodeKind::endpoints(edge.kind);
        let from = network.resolve_endpoint(&edge, from_kind, &edge.from)?;
        let to = network.resolve_endpoint(&edge, to_kind, &edge.to)?;
        network.graph.add_edge(from, to, edge);
    }

    info!(
        "Assembled network: {} nodes, {} edges",
        network.graph.node_count(),
        network.graph.edge_count()
    );
    Ok(network)
}

impl Network {
    fn resolve_endpoint(&self, edge: &Edge, kind: NodeKind, key: &str) -> Result<NodeIndex> {
        self.node(kind, key).ok_or_else(|| Error::DanglingReference {
            kind: edge.kind,
            from: edge.from.clone(),
            to: edge.to.clone(),
            missing: format!("{} {}", kind, key),
        })
    }

    fn node(&self, kind: NodeKind, key: &str) -> Option<NodeIndex> {
        self.node_index.get(&(kind, key.to_string())).copied()
    }

    fn contains(&self, kind: NodeKind, key: &str) -> bool {
        match kind {
            NodeKind::Herb => self.herbs.contains_key(key),
            NodeKind::Compound => self.compounds.contains_key(key),
            NodeKind::Target => self.targets.contains_key(key),
            NodeKind::Disease => self.diseases.contains_key(key),
        }
    }

    /// Re-check that every edge connects existing entities of the right kinds.
    pub fn verify(&self) -> Result<()> {
        for edge_ref in self.graph.edge_references() {
            let edge = edge_ref.weight();
            let (from_kind, to_kind) = NodeKind::endpoints(edge.kind);
            let ends = [
                (edge_ref.source(), from_kind, &edge.from),
                (edge_ref.target(), to_kind, &edge.to),
            ];
            for (idx, kind, key) in ends {
                let node = &self.graph[idx];
                if node.kind != kind || node.key != *key || !self.contains(kind, key) {
                    return Err(Error::DanglingReference {
                        kind: edge.kind,
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: format!("{} {}", kind, key),
                    });
                }
            }
        }
        debug!("Network verified: {} edges", self.graph.edge_count());
        Ok(())
    }

    /// Keys of nodes one `edge_kind` hop away, sorted.
    fn neighbors(
        &self,
        kind: NodeKind,
        key: &str,
        edge_kind: EdgeKind,
        direction: Direction,
    ) -> Vec<&str> {
        let Some(idx) = self.node(kind, key) else {
            return Vec::new();
        };
        let mut keys: Vec<&str> = self
            .graph
            .edges_directed(idx, direction)
            .filter(|e| e.weight().kind == edge_kind)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                self.graph[other].key.as_str()
            })
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn compounds_of_herb(&self, herb: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Herb, herb, EdgeKind::HerbCompound, Direction::Outgoing)
    }

    pub fn targets_of_compound(&self, compound: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Compound, compound, EdgeKind::CompoundTarget, Direction::Outgoing)
    }

    pub fn diseases_of_target(&self, target: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Target, target, EdgeKind::TargetDisease, Direction::Outgoing)
    }

    pub fn herbs_of_compound(&self, compound: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Compound, compound, EdgeKind::HerbCompound, Direction::Incoming)
    }

    pub fn compounds_of_target(&self, target: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Target, target, EdgeKind::CompoundTarget, Direction::Incoming)
    }

    pub fn targets_of_disease(&self, disease: &str) -> Vec<&str> {
        self.neighbors(NodeKind::Disease, disease, EdgeKind::TargetDisease, Direction::Incoming)
    }

    pub fn compound(&self, key: &str) -> Option<&CanonicalCompound> {
        self.compounds.get(key)
    }

    pub fn target(&self, key: &str) -> Option<&CanonicalTarget> {
        self.targets.get(key)
    }

    pub fn compounds(&self) -> &BTreeMap<String, CanonicalCompound> {
        &self.compounds
    }

    pub fn targets(&self) -> &BTreeMap<String, CanonicalTarget> {
        &self.targets
    }

    pub fn herbs(&self) -> &BTreeMap<String, Herb> {
        &self.herbs
    }

    pub fn diseases(&self) -> &BTreeMap<String, Disease> {
        &self.diseases
    }

    /// Edges in (kind, from, to) order.
    pub fn edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.graph.edge_weights().collect();
        edges.sort_by(|a, b| (a.kind, &a.from, &a.to).cmp(&(b.kind, &b.from, &b.to)));
        edges
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            ..Default::default()
        };
        for node in self.graph.node_weights() {
            *stats.nodes_by_kind.entry(node.kind).or_default() += 1;
        }
        for edge in self.graph.edge_weights() {
            *stats.edges_by_kind.entry(edge.kind).or_default() += 1;
        }
        stats
    }

    /// Serializable form of the network: nodes carry their entity as
    /// metadata, edges carry provenance.
    pub fn to_document(&self) -> Result<GraphDocument> {
        let mut nodes = Vec::with_capacity(self.graph.node_count());
        for herb in self.herbs.values() {
            nodes.push(node(NodeKind::Herb, &herb.term, &herb.term, herb)?);
        }
        for compound in self.compounds.values() {
            nodes.push(node(
                NodeKind::Compound,
                &compound.primary_key,
                &compound.display_name,
                compound,
            )?);
        }
        for target in self.targets.values() {
            nodes.push(node(
                NodeKind::Target,
                &target.primary_key,
                &target.display_name,
                target,
            )?);
        }
        for disease in self.diseases.values() {
            nodes.push(node(NodeKind::Disease, &disease.term, &disease.term, disease)?);
        }

        let edges = self
            .edges()
            .into_iter()
            .map(|edge| {
                let (from_kind, to_kind) = NodeKind::endpoints(edge.kind);
                GraphEdge {
                    source: node_id(from_kind, &edge.from),
                    target: node_id(to_kind, &edge.to),
                    relationship: edge.kind,
                    sources: edge.sources.iter().copied().collect(),
                    evidence: edge.evidence.clone(),
                }
            })
            .collect();

        Ok(GraphDocument {
            nodes,
            edges,
            stats: self.stats(),
        })
    }

    /// SHA-256 of the serialized graph document, hex encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.to_document()?)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// One row per herb → compound → target path, sorted by herb, then
    /// compound, then target.
    pub fn target_gene_rows(&self) -> Vec<TargetGeneRow> {
        let mut rows = Vec::new();
        for herb in self.herbs.keys() {
            for compound_key in self.compounds_of_herb(herb) {
                let Some(compound) = self.compounds.get(compound_key) else {
                    continue;
                };
                for target_key in self.targets_of_compound(compound_key) {
                    let Some(target) = self.targets.get(target_key) else {
                        continue;
                    };
                    rows.push(TargetGeneRow {
                        herb: herb.clone(),
                        compound_id: compound.primary_key.clone(),
                        compound_name: compound.display_name.clone(),
                        target_name: target.display_name.clone(),
                        gene_symbol: target.gene_symbol.clone(),
                    });
                }
            }
        }
        rows.sort();
        rows
    }
}

fn node_id(kind: NodeKind, key: &str) -> String {
    format!("{}:{}", kind, key)
}

fn node<T: Serialize>(kind: NodeKind, key: &str, label: &str, entity: &T) -> Result<GraphNode> {
    Ok(GraphNode {
        id: node_id(kind, key),
        label: label.to_string(),
        node_type: kind,
        metadata: Some(serde_json::to_value(entity)?),
    })
}
