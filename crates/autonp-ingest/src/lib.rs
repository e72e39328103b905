//! AutoNP Ingest — maps raw per-source records onto canonical identities.
//!
//! Each source has a fixed field-mapping table (`schema`); normalization
//! applies it, coerces numeric fields and extracts structural or
//! name-based identity keys. Search-term matching for herbs and diseases
//! lives here too since it works on the same source name fields.

pub mod normalize;
pub mod schema;
pub mod search;

pub use normalize::{clean_protein_name, normalize, normalize_name};
pub use schema::{schema_for, SourceSchema};
pub use search::SearchMatcher;
