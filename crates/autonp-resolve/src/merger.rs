//! Cross-source merge.
//!
//! Records are resolved in input order: compounds by structural key (name
//! as a low-confidence fallback), targets by UniProt accession (looked up
//! through the directory when a source only gives a gene or name). After a
//! reconcile pass, an identity is admitted iff at least one accepted record
//! resolved to it. Rejected records never create entities; they are kept
//! as provenance on admitted ones.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use autonp_core::{
    Alias, AttributeValue, CanonicalCompound, CanonicalTarget, Confidence, Disease, Edge,
    EdgeKind, Evidence, FilterVerdict, Herb, MergeStatus, NormalizedRecord, RejectionNote,
    SearchConfig, StructuralKey,
};
use autonp_ingest::SearchMatcher;
use tracing::{debug, info};

use crate::arena::{Identity, IdentityArena};
use crate::directory::{Accession, TargetDirectory};
use crate::types::{MergeResult, MergedEntities, RecordOutcome, Reconciliation, Resolution};

pub struct Merger<'a> {
    search: &'a SearchConfig,
    matcher: SearchMatcher,
}

/// Per-record arena assignments.
struct Assignment {
    compound: Option<usize>,
    target: Option<usize>,
}

impl<'a> Merger<'a> {
    pub fn new(search: &'a SearchConfig) -> Self {
        Self {
            search,
            matcher: SearchMatcher::from_config(search),
        }
    }

    pub fn merge(&self, records: Vec<(NormalizedRecord, FilterVerdict)>) -> MergeResult {
        let directory = TargetDirectory::from_records(
            records
                .iter()
                .filter(|(r, v)| r.source.is_reference() && v.accepted)
                .map(|(r, _)| r),
        );

        let mut compounds: IdentityArena<StructuralKey> = IdentityArena::new();
        let mut targets: IdentityArena<Accession> = IdentityArena::new();
        let mut assigned: Vec<Assignment> = Vec::with_capacity(records.len());

        for (idx, (record, _)) in records.iter().enumerate() {
            if record.source.is_reference() {
                assigned.push(Assignment {
                    compound: None,
                    target: None,
                });
                continue;
            }
            let compound = record.compound.as_ref().and_then(|c| {
                let name = c.structural_keys.is_empty().then_some(c.name_key.as_deref()).flatten();
                compounds.resolve(&c.structural_keys, name, idx)
            });
            let target = record.target.as_ref().and_then(|t| {
                let keys: Vec<Accession> = directory
                    .resolve(t)
                    .map(|a| Accession(a.to_string()))
                    .into_iter()
                    .collect();
                let name = t
                    .name_key
                    .clone()
                    .or_else(|| t.gene_symbol.as_ref().map(|g| g.to_lowercase()));
                targets.resolve(&keys, name.as_deref(), idx)
            });
            assigned.push(Assignment { compound, target });
        }

        // Reference records only attach to targets named elsewhere.
        for (idx, (record, _)) in records.iter().enumerate() {
            if !record.source.is_reference() {
                continue;
            }
            let accession = record.target.as_ref().and_then(|t| t.accession.clone());
            if let Some(id) = accession.and_then(|a| targets.lookup(&Accession(a))) {
                targets.attach(id, idx);
                assigned[idx].target = Some(id);
            }
        }

        let folded = compounds.reconcile() + targets.reconcile();
        if folded > 0 {
            debug!("Reconcile pass folded {} identities", folded);
        }

        let admitted_compounds = admitted(&compounds, &records);
        let admitted_targets = admitted(&targets, &records);

        let mut entities = MergedEntities::default();
        let mut reconciliations = Vec::new();

        for (id, identity) in compounds.roots() {
            if !admitted_compounds.contains(&id) {
                continue;
            }
            let compound = build_compound(identity, &records);
            if let MergeStatus::Reconciled { absorbed } = &compound.status {
                reconciliations.push(Reconciliation {
                    canonical: compound.primary_key.clone(),
                    absorbed: absorbed.clone(),
                });
            }
            entities.compounds.insert(compound.primary_key.clone(), compound);
        }
        for (id, identity) in targets.roots() {
            if !admitted_targets.contains(&id) {
                continue;
            }
            let target = build_target(identity, &records, &directory);
            if let MergeStatus::Reconciled { absorbed } = &target.status {
                reconciliations.push(Reconciliation {
                    canonical: target.primary_key.clone(),
                    absorbed: absorbed.clone(),
                });
            }
            entities.targets.insert(target.primary_key.clone(), target);
        }

        for term in &self.search.herbs {
            entities.herbs.insert(term.clone(), Herb::new(term.clone()));
        }
        for term in &self.search.diseases {
            entities.diseases.insert(term.clone(), Disease { term: term.clone() });
        }

        let mut edges: BTreeMap<(EdgeKind, String, String), Edge> = BTreeMap::new();
        let mut unmatched_herbs = BTreeSet::new();

        for (idx, (record, verdict)) in records.iter().enumerate() {
            let compound_key = assigned[idx]
                .compound
                .map(|id| compounds.find(id))
                .filter(|id| admitted_compounds.contains(id))
                .map(|id| compounds.get(id).primary_key.clone());
            let target_key = assigned[idx]
                .target
                .map(|id| targets.find(id))
                .filter(|id| admitted_targets.contains(id))
                .map(|id| targets.get(id).primary_key.clone());

            let evidence = Evidence {
                source: record.source,
                native_id: record.native_id.clone(),
                verdict: verdict.clone(),
            };
            let mut link = |kind: EdgeKind, from: &str, to: &str| {
                edges
                    .entry((kind, from.to_string(), to.to_string()))
                    .or_insert_with(|| Edge::new(kind, from, to))
                    .add_evidence(evidence.clone());
            };

            if let Some(names) = &record.herb {
                match self.matcher.resolve_herb(&self.search.herbs, names) {
                    Some(term) => {
                        if verdict.accepted {
                            if let Some(herb) = entities.herbs.get_mut(term) {
                                herb.matched_names.insert(names.name.clone());
                            }
                        }
                        if let Some(compound_key) = &compound_key {
                            link(EdgeKind::HerbCompound, term, compound_key);
                        }
                    }
                    None => {
                        unmatched_herbs.insert(names.name.clone());
                    }
                }
            }

            if let (Some(compound_key), Some(target_key)) = (&compound_key, &target_key) {
                link(EdgeKind::CompoundTarget, compound_key, target_key);
            }

            if let Some(target_key) = &target_key {
                for term in self.matcher.resolve_diseases(&self.search.diseases, &record.diseases) {
                    link(EdgeKind::TargetDisease, target_key, term);
                }
            }
        }

        entities.edges = edges.into_values().filter(Edge::is_admitted).collect();

        let outcomes = records
            .iter()
            .enumerate()
            .map(|(idx, (record, verdict))| {
                let (resolution, canonical) = if record.source.is_reference() {
                    match assigned[idx].target.map(|id| targets.find(id)) {
                        Some(id) if admitted_targets.contains(&id) => (
                            Resolution::MergedIntoExisting,
                            Some(targets.get(id).primary_key.clone()),
                        ),
                        _ => (Resolution::ReferenceOnly, None),
                    }
                } else {
                    let primary = match (assigned[idx].compound, assigned[idx].target) {
                        (Some(id), _) => {
                            let root = compounds.find(id);
                            Some((IdentityView::from(compounds.get(root)), admitted_compounds.contains(&root)))
                        }
                        (None, Some(id)) => {
                            let root = targets.find(id);
                            Some((IdentityView::from(targets.get(root)), admitted_targets.contains(&root)))
                        }
                        (None, None) => None,
                    };
                    classify(idx, verdict.accepted, primary, &records)
                };
                RecordOutcome {
                    source: record.source,
                    native_id: record.native_id.clone(),
                    accepted: verdict.accepted,
                    reason: verdict.reason,
                    resolution,
                    canonical,
                }
            })
            .collect();

        info!(
            "Merged {} records into {} compounds, {} targets, {} edges",
            records.len(),
            entities.compounds.len(),
            entities.targets.len(),
            entities.edges.len()
        );

        MergeResult {
            entities,
            outcomes,
            reconciliations,
            unmatched_herbs,
        }
    }
}

/// Borrowed view of an identity's primary key and members, independent of
/// its key type.
struct IdentityView<'a> {
    primary_key: &'a str,
    members: &'a [usize],
}

impl<'a, K> From<&'a Identity<K>> for IdentityView<'a> {
    fn from(identity: &'a Identity<K>) -> Self {
        Self {
            primary_key: &identity.primary_key,
            members: &identity.members,
        }
    }
}

/// Resolution of a non-reference record from its primary identity: the
/// first accepted member founds the canonical, later accepted ones merge.
fn classify(
    idx: usize,
    accepted: bool,
    primary: Option<(IdentityView<'_>, bool)>,
    records: &[(NormalizedRecord, FilterVerdict)],
) -> (Resolution, Option<String>) {
    let Some((view, is_admitted)) = primary else {
        return if accepted {
            (Resolution::NewCanonical, None)
        } else {
            (Resolution::RejectedOnly, None)
        };
    };
    let canonical = is_admitted.then(|| view.primary_key.to_string());
    let resolution = match (accepted, is_admitted) {
        (true, _) => {
            let founder = view
                .members
                .iter()
                .copied()
                .find(|&m| counts_for_admission(&records[m]));
            if founder == Some(idx) {
                Resolution::NewCanonical
            } else {
                Resolution::MergedIntoExisting
            }
        }
        (false, true) => Resolution::ProvenanceOnly,
        (false, false) => Resolution::RejectedOnly,
    };
    (resolution, canonical)
}

fn counts_for_admission((record, verdict): &(NormalizedRecord, FilterVerdict)) -> bool {
    verdict.accepted && !record.source.is_reference()
}

fn admitted<K: Clone + Ord + std::hash::Hash + std::fmt::Display>(
    arena: &IdentityArena<K>,
    records: &[(NormalizedRecord, FilterVerdict)],
) -> HashSet<usize> {
    arena
        .roots()
        .filter(|(_, identity)| identity.members.iter().any(|&m| counts_for_admission(&records[m])))
        .map(|(id, _)| id)
        .collect()
}

fn merge_status<K>(identity: &Identity<K>, aliases: &BTreeSet<Alias>) -> MergeStatus {
    if !identity.absorbed.is_empty() {
        MergeStatus::Reconciled {
            absorbed: identity.absorbed.clone(),
        }
    } else if identity.by_name && aliases.len() > 1 {
        MergeStatus::AmbiguousMerge
    } else {
        MergeStatus::Clean
    }
}

fn build_compound(
    identity: &Identity<StructuralKey>,
    records: &[(NormalizedRecord, FilterVerdict)],
) -> CanonicalCompound {
    let mut aliases = BTreeSet::new();
    let mut attributes: BTreeMap<_, Vec<AttributeValue>> = BTreeMap::new();
    let mut rejections = Vec::new();
    let mut display_name = None;

    for &m in &identity.members {
        let (record, verdict) = &records[m];
        aliases.insert(record.alias());
        if verdict.accepted {
            if display_name.is_none() {
                display_name = record.compound.as_ref().map(|c| c.display_name.clone());
            }
            for (&attribute, &value) in &record.attributes {
                attributes.entry(attribute).or_default().push(AttributeValue {
                    value,
                    source: record.source,
                    native_id: record.native_id.clone(),
                });
            }
        } else if let Some(reason) = verdict.reason {
            rejections.push(RejectionNote {
                source: record.source,
                native_id: record.native_id.clone(),
                reason,
            });
        }
    }

    let status = merge_status(identity, &aliases);
    CanonicalCompound {
        primary_key: identity.primary_key.clone(),
        display_name: display_name.unwrap_or_else(|| identity.primary_key.clone()),
        confidence: if identity.by_name {
            Confidence::Low
        } else {
            Confidence::High
        },
        structural_keys: identity.keys.clone(),
        aliases,
        attributes,
        rejections,
        status,
    }
}

fn build_target(
    identity: &Identity<Accession>,
    records: &[(NormalizedRecord, FilterVerdict)],
    directory: &TargetDirectory,
) -> CanonicalTarget {
    let accession = identity.keys.iter().next().map(|a| a.0.clone());
    let entry = accession.as_deref().and_then(|a| directory.entry(a));

    let mut aliases = BTreeSet::new();
    let mut rejections = Vec::new();
    let mut display_name = entry.and_then(|e| e.protein_name.clone());
    let mut gene_symbol = entry.and_then(|e| e.gene_symbol.clone());

    for &m in &identity.members {
        let (record, verdict) = &records[m];
        aliases.insert(record.alias());
        if verdict.accepted {
            if let Some(target) = &record.target {
                if display_name.is_none() && !target.display_name.is_empty() {
                    display_name = Some(target.display_name.clone());
                }
                if gene_symbol.is_none() {
                    gene_symbol = target.gene_symbol.clone();
                }
            }
        } else if let Some(reason) = verdict.reason {
            rejections.push(RejectionNote {
                source: record.source,
                native_id: record.native_id.clone(),
                reason,
            });
        }
    }

    let status = merge_status(identity, &aliases);
    CanonicalTarget {
        primary_key: identity.primary_key.clone(),
        display_name: display_name.unwrap_or_else(|| identity.primary_key.clone()),
        confidence: if identity.by_name {
            Confidence::Low
        } else {
            Confidence::High
        },
        accession,
        gene_symbol,
        aliases,
        rejections,
        status,
    }
}
