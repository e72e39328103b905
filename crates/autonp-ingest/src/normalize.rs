//! Record normalization: field mapping, numeric coercion, identity keys.

use autonp_core::{
    Attribute, CompoundRef, Error, HerbNames, NormalizedRecord, RawRecord, RawValue, Result,
    SourceTag, StructuralKey, TargetRef,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::schema::{
    schema_for, NumericParse, SourceSchema, ADME_VIOLATION_FIELDS, GI_ABSORPTION_FIELD,
};

static INCHIKEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$").unwrap());
static ACCESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9](?:[A-Z][A-Z0-9]{2}[0-9]){1,2})$")
        .unwrap()
});
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*)").unwrap());

/// Normalize one raw record.
///
/// Fails with `UnknownSource` for an unrecognized tag and with
/// `Normalization` when the record carries no usable identity. Bad numeric
/// values are not errors: they are recorded in `malformed` and turn into a
/// `malformed_value` verdict during filtering.
pub fn normalize(record: &RawRecord) -> Result<NormalizedRecord> {
    let source = record.source_tag()?;
    let schema = schema_for(source)
        .ok_or_else(|| Error::Internal(format!("no field mapping for source {}", source)))?;

    let native_id = record.native_id.trim();
    if native_id.is_empty() {
        return Err(normalization_error(source, native_id, "blank native id"));
    }

    let mut normalized = NormalizedRecord::new(source, native_id);
    normalized.herb = herb_names(record, schema);
    normalized.compound = compound_ref(record, schema);
    normalized.target = target_ref(record, schema);
    normalized.diseases = schema
        .diseases
        .iter()
        .filter_map(|f| record.field(f).and_then(RawValue::as_text))
        .collect();

    for numeric in schema.numeric {
        let Some((field, value)) = first_present(record, numeric.fields) else {
            continue;
        };
        match coerce(value, numeric.parse) {
            Ok(v) => {
                normalized.attributes.insert(numeric.attribute, v);
            }
            Err(raw) => {
                debug!("{}/{}: malformed {} value {:?}", source, native_id, field, raw);
                normalized.malformed.insert(numeric.attribute, raw);
            }
        }
    }

    if schema.adme {
        apply_adme(record, &mut normalized);
    }

    if schema.requires_accession
        && normalized
            .target
            .as_ref()
            .and_then(|t| t.accession.as_ref())
            .is_none()
    {
        return Err(normalization_error(source, native_id, "missing UniProt accession"));
    }

    if normalized.compound.is_none() && normalized.target.is_none() {
        return Err(normalization_error(
            source,
            native_id,
            "no compound or target identity",
        ));
    }

    Ok(normalized)
}

/// Case-fold and collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Reduce a UniProt "Protein names" entry to its recommended name:
/// text before the first `" ("`, then before the first `", "`.
pub fn clean_protein_name(raw: &str) -> String {
    let head = raw.split(" (").next().unwrap_or(raw);
    head.split(", ").next().unwrap_or(head).trim().to_string()
}

/// Validate and upper-case an InChIKey.
pub fn parse_inchikey(raw: &str) -> Option<String> {
    let key = raw.trim().to_uppercase();
    INCHIKEY_RE.is_match(&key).then_some(key)
}

/// Parse a PubChem CID. Float renderings of integers are accepted.
pub fn parse_cid(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(cid) = trimmed.parse::<u64>() {
        return (cid > 0).then_some(cid);
    }
    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value < 1e15)
        .then_some(value as u64)
}

/// Validate and upper-case a UniProt accession.
pub fn parse_accession(raw: &str) -> Option<String> {
    let accession = raw.trim().to_uppercase();
    ACCESSION_RE.is_match(&accession).then_some(accession)
}

fn normalization_error(source: SourceTag, native_id: &str, reason: &str) -> Error {
    Error::Normalization {
        source_tag: source,
        native_id: native_id.to_string(),
        reason: reason.to_string(),
    }
}

fn first_present<'a>(
    record: &'a RawRecord,
    fields: &[&'static str],
) -> Option<(&'static str, &'a RawValue)> {
    fields
        .iter()
        .find_map(|f| record.field(f).map(|v| (*f, v)))
}

fn text_field(record: &RawRecord, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|f| record.field(f).and_then(RawValue::as_text))
}

fn coerce(value: &RawValue, parse: NumericParse) -> std::result::Result<f64, String> {
    let number = match value {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(text) => match parse {
            NumericParse::Plain => text.trim().parse::<f64>().ok(),
            NumericParse::LeadingNumber => LEADING_NUMBER_RE
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok()),
        },
        RawValue::Bool(_) | RawValue::Null => None,
    };
    match number {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(value.as_text().unwrap_or_default()),
    }
}

fn herb_names(record: &RawRecord, schema: &SourceSchema) -> Option<HerbNames> {
    let name = text_field(record, schema.herb_name)?;
    Some(HerbNames {
        name,
        en_name: text_field(record, schema.herb_en_name),
        pinyin: text_field(record, schema.herb_pinyin),
    })
}

fn compound_ref(record: &RawRecord, schema: &SourceSchema) -> Option<CompoundRef> {
    let mut keys = Vec::new();

    if let Some(raw) = text_field(record, schema.inchikey) {
        match parse_inchikey(&raw) {
            Some(key) => keys.push(StructuralKey::InchiKey(key)),
            None => debug!("{}: ignoring invalid InChIKey {:?}", record.native_id, raw),
        }
    }
    if let Some(raw) = text_field(record, schema.pubchem_cid) {
        match parse_cid(&raw) {
            Some(cid) => keys.push(StructuralKey::PubchemCid(cid)),
            None => debug!("{}: ignoring invalid CID {:?}", record.native_id, raw),
        }
    }

    let name = text_field(record, schema.compound_name);
    if keys.is_empty() && name.is_none() {
        return None;
    }

    let display_name = match &name {
        Some(n) => n.clone(),
        None => keys[0].to_string(),
    };
    Some(CompoundRef {
        structural_keys: keys,
        name_key: name.as_deref().map(normalize_name),
        display_name,
    })
}

fn target_ref(record: &RawRecord, schema: &SourceSchema) -> Option<TargetRef> {
    let accession = text_field(record, schema.target_accession).and_then(|raw| {
        let parsed = parse_accession(&raw);
        if parsed.is_none() {
            debug!("{}: ignoring invalid accession {:?}", record.native_id, raw);
        }
        parsed
    });
    let gene_symbol = text_field(record, schema.target_gene).and_then(|raw| {
        raw.split(|c: char| c == ';' || c.is_whitespace())
            .find(|s| !s.is_empty())
            .map(|s| s.to_uppercase())
    });
    let name = text_field(record, schema.target_name).or_else(|| {
        text_field(record, schema.protein_names)
            .map(|raw| clean_protein_name(&raw))
            .filter(|n| !n.is_empty())
    });

    if accession.is_none() && gene_symbol.is_none() && name.is_none() {
        return None;
    }

    let display_name = name
        .clone()
        .or_else(|| gene_symbol.clone())
        .or_else(|| accession.clone())
        .unwrap_or_default();
    Some(TargetRef {
        accession,
        gene_symbol,
        name_key: name.as_deref().map(normalize_name),
        display_name,
    })
}

/// Derive `adme_rules_passed` and `gi_absorption_high` from SwissADME columns.
fn apply_adme(record: &RawRecord, normalized: &mut NormalizedRecord) {
    let mut present = 0;
    let mut passed = 0;
    for field in ADME_VIOLATION_FIELDS {
        let Some(value) = record.field(field) else {
            continue;
        };
        present += 1;
        match coerce(value, NumericParse::Plain) {
            Ok(v) if v == 0.0 => passed += 1,
            Ok(_) => {}
            Err(raw) => {
                normalized.malformed.insert(Attribute::AdmeRulesPassed, raw);
                return;
            }
        }
    }
    if present > 0 {
        normalized
            .attributes
            .insert(Attribute::AdmeRulesPassed, passed as f64);
    }

    if let Some(raw) = text_field(record, &[GI_ABSORPTION_FIELD]) {
        match raw.to_lowercase().as_str() {
            "high" => {
                normalized.attributes.insert(Attribute::GiAbsorptionHigh, 1.0);
            }
            "low" => {
                normalized.attributes.insert(Attribute::GiAbsorptionHigh, 0.0);
            }
            _ => {
                normalized.malformed.insert(Attribute::GiAbsorptionHigh, raw);
            }
        }
    }
}
