//! Source records as fetched, and their normalized form.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Data source a record was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// TCMSP pharmacology database (ingredients with OB/DL, ingredient targets).
    Tcmsp,
    /// HERBac herb–ingredient database.
    Herbac,
    /// PubChem compound properties.
    Pubchem,
    /// SwissTargetPrediction / SwissADME.
    Swiss,
    /// UniProt protein reference.
    Uniprot,
    /// Aggregate rows previously emitted by AutoNP itself.
    Autonp,
}

impl SourceTag {
    /// All sources, in the order batches are merged.
    pub fn all() -> &'static [SourceTag] {
        &[
            Self::Tcmsp,
            Self::Herbac,
            Self::Pubchem,
            Self::Swiss,
            Self::Uniprot,
            Self::Autonp,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcmsp => "tcmsp",
            Self::Herbac => "herbac",
            Self::Pubchem => "pubchem",
            Self::Swiss => "swiss",
            Self::Uniprot => "uniprot",
            Self::Autonp => "autonp",
        }
    }

    /// Reference sources enrich entities introduced by other sources but
    /// never introduce network entities themselves.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Uniprot)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|tag| tag.as_str() == lowered)
            .ok_or_else(|| Error::UnknownSource(s.to_string()))
    }
}

/// A single raw field value as delivered by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Render the value as trimmed text. Blank text and null yield `None`.
    ///
    /// Integral numbers render without a fractional part so that identifiers
    /// exported as floats (`5280343.0`) read back as `5280343`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{:.0}", n))
                } else {
                    Some(n.to_string())
                }
            }
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

/// A record exactly as fetched from a source. Never mutated after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source tag as text; validated during normalization.
    pub source: String,
    /// Opaque source-native identifier (MOL_ID, HBIN id, CID, accession...).
    pub native_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new(source: impl Into<String>, native_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            native_id: native_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field, treating explicit nulls as absent.
    pub fn field(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn source_tag(&self) -> crate::Result<SourceTag> {
        self.source.parse()
    }
}

/// Canonical numeric attribute names shared by all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    OralBioavailability,
    DrugLikeness,
    MolecularWeight,
    #[serde(rename = "logp")]
    LogP,
    HbondDonorCount,
    HbondAcceptorCount,
    PredictionProbability,
    AdmeRulesPassed,
    GiAbsorptionHigh,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OralBioavailability => "oral_bioavailability",
            Self::DrugLikeness => "drug_likeness",
            Self::MolecularWeight => "molecular_weight",
            Self::LogP => "logp",
            Self::HbondDonorCount => "hbond_donor_count",
            Self::HbondAcceptorCount => "hbond_acceptor_count",
            Self::PredictionProbability => "prediction_probability",
            Self::AdmeRulesPassed => "adme_rules_passed",
            Self::GiAbsorptionHigh => "gi_absorption_high",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier derived from chemical structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "value", rename_all = "snake_case")]
pub enum StructuralKey {
    InchiKey(String),
    PubchemCid(u64),
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralKey::InchiKey(k) => write!(f, "inchikey:{}", k),
            StructuralKey::PubchemCid(cid) => write!(f, "cid:{}", cid),
        }
    }
}

/// How an identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Structural key (InChIKey, CID, UniProt accession).
    High,
    /// Normalized display name only.
    Low,
}

/// A (source, native id) pair naming one source record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alias {
    pub source: SourceTag,
    pub native_id: String,
}

/// Herb names carried by a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HerbNames {
    /// Primary name, usually the Chinese name used as the search term.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinyin: Option<String>,
}

impl HerbNames {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            en_name: None,
            pinyin: None,
        }
    }
}

/// Compound identity extracted from a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundRef {
    /// Structural keys, InChIKey first.
    pub structural_keys: Vec<StructuralKey>,
    /// Case-folded, whitespace-collapsed display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,
    pub display_name: String,
}

impl CompoundRef {
    pub fn confidence(&self) -> Confidence {
        if self.structural_keys.is_empty() {
            Confidence::Low
        } else {
            Confidence::High
        }
    }
}

/// Target identity extracted from a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,
    pub display_name: String,
}

/// A record after field mapping and type coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: SourceTag,
    pub native_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub herb: Option<HerbNames>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound: Option<CompoundRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
    /// Disease evidence texts (matched against configured disease terms).
    #[serde(default)]
    pub diseases: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<Attribute, f64>,
    /// Attributes whose raw value could not be coerced, with the raw text.
    #[serde(default)]
    pub malformed: BTreeMap<Attribute, String>,
}

impl NormalizedRecord {
    pub fn new(source: SourceTag, native_id: impl Into<String>) -> Self {
        Self {
            source,
            native_id: native_id.into(),
            herb: None,
            compound: None,
            target: None,
            diseases: Vec::new(),
            attributes: BTreeMap::new(),
            malformed: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> Option<f64> {
        self.attributes.get(&attribute).copied()
    }

    pub fn alias(&self) -> Alias {
        Alias {
            source: self.source,
            native_id: self.native_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tag_parse() {
        assert_eq!("TCMSP".parse::<SourceTag>().unwrap(), SourceTag::Tcmsp);
        assert_eq!(" swiss ".parse::<SourceTag>().unwrap(), SourceTag::Swiss);
        let err = "chembl".parse::<SourceTag>().unwrap_err();
        assert!(matches!(err, Error::UnknownSource(ref s) if s == "chembl"));
    }

    #[test]
    fn test_raw_value_text() {
        assert_eq!(RawValue::Number(5280343.0).as_text().as_deref(), Some("5280343"));
        assert_eq!(RawValue::Number(0.25).as_text().as_deref(), Some("0.25"));
        assert_eq!(RawValue::Text("  ".into()).as_text(), None);
        assert_eq!(RawValue::Null.as_text(), None);
    }

    #[test]
    fn test_raw_record_json() {
        let json = r#"{"source":"tcmsp","native_id":"MOL000098","fields":{"ob":46.43,"dl":"0.28","mw":null}}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.field("ob"), Some(&RawValue::Number(46.43)));
        assert_eq!(record.field("dl"), Some(&RawValue::Text("0.28".into())));
        assert!(record.field("mw").is_none());
        assert_eq!(record.source_tag().unwrap(), SourceTag::Tcmsp);
    }

    #[test]
    fn test_structural_key_display() {
        assert_eq!(StructuralKey::PubchemCid(5280343).to_string(), "cid:5280343");
        assert_eq!(
            StructuralKey::InchiKey("REFJWTPEDVJJIY-UHFFFAOYSA-N".into()).to_string(),
            "inchikey:REFJWTPEDVJJIY-UHFFFAOYSA-N"
        );
    }
}
