//! Per-source field-mapping tables.
//!
//! Field names follow the column headers each source exports. Where a
//! source has used several spellings over time, all are listed; the first
//! non-blank one wins.

use std::collections::HashMap;

use autonp_core::{Attribute, SourceTag};
use once_cell::sync::Lazy;

/// How a numeric field is coerced from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericParse {
    /// The whole trimmed value must parse as a number.
    Plain,
    /// Take the first number embedded in the text (`"286.24 g/mol"`).
    LeadingNumber,
}

/// A numeric source field and the canonical attribute it feeds.
#[derive(Debug, Clone, Copy)]
pub struct NumericField {
    pub fields: &'static [&'static str],
    pub attribute: Attribute,
    pub parse: NumericParse,
}

const fn plain(fields: &'static [&'static str], attribute: Attribute) -> NumericField {
    NumericField {
        fields,
        attribute,
        parse: NumericParse::Plain,
    }
}

/// SwissADME rule-violation columns counted into `adme_rules_passed`.
pub const ADME_VIOLATION_FIELDS: &[&str] = &[
    "Lipinski #violations",
    "Ghose #violations",
    "Veber #violations",
    "Egan #violations",
    "Muegge #violations",
];

/// SwissADME gastrointestinal absorption column.
pub const GI_ABSORPTION_FIELD: &str = "GI absorption";

/// Field-mapping strategy for one source.
#[derive(Debug, Clone, Default)]
pub struct SourceSchema {
    pub compound_name: &'static [&'static str],
    pub inchikey: &'static [&'static str],
    pub pubchem_cid: &'static [&'static str],
    pub herb_name: &'static [&'static str],
    pub herb_en_name: &'static [&'static str],
    pub herb_pinyin: &'static [&'static str],
    pub target_accession: &'static [&'static str],
    pub target_gene: &'static [&'static str],
    pub target_name: &'static [&'static str],
    /// UniProt-style "Protein names" text, cleaned before use.
    pub protein_names: &'static [&'static str],
    pub diseases: &'static [&'static str],
    pub numeric: &'static [NumericField],
    /// Derive ADME attributes from SwissADME columns.
    pub adme: bool,
    /// Records without a valid accession cannot be normalized.
    pub requires_accession: bool,
}

const HERB_NAME: &[&str] = &["Herb", "herb", "herb_cn_name"];
const HERB_EN_NAME: &[&str] = &["herb_en_name", "Herb_en_name"];
const HERB_PINYIN: &[&str] = &["herb_pinyin", "Herb_pinyin"];
const INCHIKEY: &[&str] = &["inchikey", "InChIKey", "InChI Key"];
const DISEASE: &[&str] = &["disease", "Disease"];

const TCMSP_NUMERIC: &[NumericField] = &[
    plain(&["ob", "OB"], Attribute::OralBioavailability),
    plain(&["dl", "DL"], Attribute::DrugLikeness),
    plain(&["mw", "MW"], Attribute::MolecularWeight),
];

const HERBAC_NUMERIC: &[NumericField] = &[
    NumericField {
        fields: &["Ingredient_weight", "Ingredient weight"],
        attribute: Attribute::MolecularWeight,
        parse: NumericParse::LeadingNumber,
    },
    plain(&["Probability*", "probability"], Attribute::PredictionProbability),
];

const PUBCHEM_NUMERIC: &[NumericField] = &[
    plain(&["xlogp"], Attribute::LogP),
    plain(&["hbonddonor"], Attribute::HbondDonorCount),
    plain(&["hbondacc"], Attribute::HbondAcceptorCount),
    plain(&["mw"], Attribute::MolecularWeight),
];

const SWISS_NUMERIC: &[NumericField] = &[plain(
    &["Probability*", "probability"],
    Attribute::PredictionProbability,
)];

const AUTONP_NUMERIC: &[NumericField] = &[
    plain(&["OB"], Attribute::OralBioavailability),
    plain(&["DL"], Attribute::DrugLikeness),
];

static SCHEMAS: Lazy<HashMap<SourceTag, SourceSchema>> = Lazy::new(|| {
    let mut schemas = HashMap::new();

    schemas.insert(
        SourceTag::Tcmsp,
        SourceSchema {
            compound_name: &["molecule_name", "Molecule_Name"],
            inchikey: INCHIKEY,
            pubchem_cid: &["pubchem_cid", "PubChem_id", "cid"],
            herb_name: HERB_NAME,
            herb_en_name: HERB_EN_NAME,
            herb_pinyin: HERB_PINYIN,
            target_name: &["target_name", "Target_Name"],
            diseases: DISEASE,
            numeric: TCMSP_NUMERIC,
            ..Default::default()
        },
    );

    schemas.insert(
        SourceTag::Herbac,
        SourceSchema {
            compound_name: &["Ingredient_name", "Ingredient name"],
            inchikey: INCHIKEY,
            pubchem_cid: &["PubChem_id", "pubchem_cid"],
            herb_name: HERB_NAME,
            herb_en_name: HERB_EN_NAME,
            herb_pinyin: HERB_PINYIN,
            target_accession: &["Uniprot ID"],
            target_gene: &["Common name"],
            target_name: &["Target"],
            diseases: DISEASE,
            numeric: HERBAC_NUMERIC,
            ..Default::default()
        },
    );

    schemas.insert(
        SourceTag::Pubchem,
        SourceSchema {
            compound_name: &["cmpdname", "name"],
            inchikey: INCHIKEY,
            pubchem_cid: &["cid"],
            herb_name: HERB_NAME,
            numeric: PUBCHEM_NUMERIC,
            ..Default::default()
        },
    );

    schemas.insert(
        SourceTag::Swiss,
        SourceSchema {
            compound_name: &["Molecule", "molecule_name"],
            inchikey: INCHIKEY,
            pubchem_cid: &["cid", "PubChem_id", "pubchem_cid"],
            herb_name: HERB_NAME,
            target_accession: &["Uniprot ID"],
            target_gene: &["Common name"],
            target_name: &["Target"],
            diseases: DISEASE,
            numeric: SWISS_NUMERIC,
            adme: true,
            ..Default::default()
        },
    );

    schemas.insert(
        SourceTag::Uniprot,
        SourceSchema {
            target_accession: &["Entry", "accession"],
            target_gene: &["Gene Names (primary)", "gene_symbol"],
            protein_names: &["Protein names"],
            diseases: &["Involvement in disease", "disease"],
            requires_accession: true,
            ..Default::default()
        },
    );

    schemas.insert(
        SourceTag::Autonp,
        SourceSchema {
            compound_name: &["Molecule_Name", "Compound_Name", "Compound_ID"],
            inchikey: INCHIKEY,
            pubchem_cid: &["PubChem_id", "pubchem_cid"],
            herb_name: HERB_NAME,
            target_accession: &["Uniprot ID", "accession"],
            target_gene: &["Gene_Symbol"],
            target_name: &["Target_Name"],
            diseases: DISEASE,
            numeric: AUTONP_NUMERIC,
            ..Default::default()
        },
    );

    schemas
});

/// Field-mapping table for a source.
pub fn schema_for(source: SourceTag) -> Option<&'static SourceSchema> {
    SCHEMAS.get(&source)
}
