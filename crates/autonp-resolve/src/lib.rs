//! Merge normalized records into canonical compounds and targets.
//!
//! Records sharing a structural key collapse into one identity; name-only
//! records collapse on their normalized name and are flagged for audit.
//! A second pass folds identities that turned out to share a structural
//! key. Edges are collected with per-record provenance.

mod arena;
pub mod directory;
pub mod merger;
pub mod types;

pub use directory::{Accession, TargetDirectory, UniprotEntry};
pub use merger::Merger;
pub use types::*;
