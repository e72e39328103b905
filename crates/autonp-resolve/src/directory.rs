//! UniProt-backed target directory.
//!
//! Resolves gene symbols and protein names from other sources to UniProt
//! accessions. UniProt records only enrich targets that other sources
//! already name; they never create targets on their own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use autonp_core::{NormalizedRecord, SourceTag, TargetRef};
use autonp_ingest::normalize_name;
use tracing::debug;

/// A UniProt accession used as the structural key of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Accession(pub String);

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uniprot:{}", self.0)
    }
}

/// What UniProt says about one accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniprotEntry {
    pub accession: String,
    pub protein_name: Option<String>,
    pub gene_symbol: Option<String>,
}

#[derive(Debug, Default)]
pub struct TargetDirectory {
    entries: BTreeMap<String, UniprotEntry>,
    by_gene: BTreeMap<String, BTreeSet<String>>,
    by_name: BTreeMap<String, BTreeSet<String>>,
}

impl TargetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the UniProt records among `records`; others are ignored.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a NormalizedRecord>) -> Self {
        let mut directory = Self::new();
        for record in records {
            directory.insert(record);
        }
        debug!("Target directory holds {} accessions", directory.len());
        directory
    }

    /// Index a UniProt record. Repeated accessions keep the first names
    /// seen and add their gene and name to the reverse indexes.
    pub fn insert(&mut self, record: &NormalizedRecord) {
        if record.source != SourceTag::Uniprot {
            return;
        }
        let Some(target) = &record.target else {
            return;
        };
        let Some(accession) = &target.accession else {
            return;
        };

        let entry = self
            .entries
            .entry(accession.clone())
            .or_insert_with(|| UniprotEntry {
                accession: accession.clone(),
                protein_name: None,
                gene_symbol: None,
            });
        if entry.protein_name.is_none() && !target.display_name.is_empty() {
            entry.protein_name = Some(target.display_name.clone());
        }
        if entry.gene_symbol.is_none() {
            entry.gene_symbol = target.gene_symbol.clone();
        }
        if let Some(gene) = &target.gene_symbol {
            self.by_gene
                .entry(gene.to_uppercase())
                .or_default()
                .insert(accession.clone());
        }
        if let Some(name) = &target.name_key {
            self.by_name
                .entry(name.clone())
                .or_default()
                .insert(accession.clone());
        }
    }

    /// Accession for a target reference: its own accession if it carries
    /// one, else a gene symbol match, else a protein name match. When
    /// several accessions share a gene or name the smallest wins.
    pub fn resolve<'a>(&'a self, target: &'a TargetRef) -> Option<&'a str> {
        if let Some(accession) = &target.accession {
            return Some(accession.as_str());
        }
        let by_gene = target
            .gene_symbol
            .as_ref()
            .and_then(|g| self.by_gene.get(&g.to_uppercase()));
        let by_name = || {
            target
                .name_key
                .clone()
                .or_else(|| {
                    (!target.display_name.is_empty())
                        .then(|| normalize_name(&target.display_name))
                })
                .and_then(|n| self.by_name.get(&n))
        };
        by_gene
            .or_else(by_name)
            .and_then(|set| set.iter().next())
            .map(String::as_str)
    }

    pub fn entry(&self, accession: &str) -> Option<&UniprotEntry> {
        self.entries.get(accession)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniprot(accession: &str, gene: &str, name: &str, diseases: &[&str]) -> NormalizedRecord {
        let mut record = NormalizedRecord::new(SourceTag::Uniprot, accession);
        record.target = Some(TargetRef {
            accession: Some(accession.into()),
            gene_symbol: Some(gene.into()),
            name_key: Some(normalize_name(name)),
            display_name: name.into(),
        });
        record.diseases = diseases.iter().map(|d| d.to_string()).collect();
        record
    }

    fn named(gene: Option<&str>, name: &str) -> TargetRef {
        TargetRef {
            accession: None,
            gene_symbol: gene.map(String::from),
            name_key: Some(normalize_name(name)),
            display_name: name.into(),
        }
    }

    #[test]
    fn test_resolve_by_gene_then_name() {
        let records = vec![
            uniprot("P35354", "PTGS2", "Prostaglandin G/H synthase 2", &[]),
            uniprot("P23219", "PTGS1", "Prostaglandin G/H synthase 1", &[]),
        ];
        let directory = TargetDirectory::from_records(&records);

        assert_eq!(directory.resolve(&named(Some("ptgs2"), "whatever")), Some("P35354"));
        assert_eq!(
            directory.resolve(&named(None, "Prostaglandin G/H  synthase 1")),
            Some("P23219")
        );
        assert_eq!(directory.resolve(&named(Some("TP53"), "Cellular tumor antigen")), None);
    }

    #[test]
    fn test_smallest_accession_wins_on_shared_gene() {
        let records = vec![
            uniprot("Q9XXX1", "ABC1", "Transporter", &[]),
            uniprot("A0A001", "ABC1", "Transporter", &[]),
        ];
        let directory = TargetDirectory::from_records(&records);
        assert_eq!(directory.resolve(&named(Some("ABC1"), "x")), Some("A0A001"));
    }

    #[test]
    fn test_repeated_accession_keeps_first_name() {
        let records = vec![
            uniprot("P35354", "PTGS2", "Prostaglandin G/H synthase 2", &["Asthma"]),
            uniprot("P35354", "PTGS2", "Cyclooxygenase-2", &["Colorectal cancer"]),
        ];
        let directory = TargetDirectory::from_records(&records);
        assert_eq!(directory.len(), 1);
        let entry = directory.entry("P35354").unwrap();
        assert_eq!(entry.protein_name.as_deref(), Some("Prostaglandin G/H synthase 2"));
        assert_eq!(directory.resolve(&named(None, "Cyclooxygenase-2")), Some("P35354"));
    }

    #[test]
    fn test_non_uniprot_records_ignored() {
        let mut record = uniprot("P35354", "PTGS2", "PTGS2", &[]);
        record.source = SourceTag::Swiss;
        let directory = TargetDirectory::from_records([&record]);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_own_accession_wins() {
        let directory = TargetDirectory::new();
        let mut target = named(Some("PTGS2"), "x");
        target.accession = Some("P35354".into());
        assert_eq!(directory.resolve(&target), Some("P35354"));
        assert_eq!(Accession("P35354".into()).to_string(), "uniprot:P35354");
    }
}
