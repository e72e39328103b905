//! Error types for AutoNP.

use thiserror::Error;

use crate::entity::EdgeKind;
use crate::record::SourceTag;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown source tag: {0:?}")]
    UnknownSource(String),

    #[error("Normalization error ({source_tag}/{native_id}): {reason}")]
    Normalization {
        source_tag: SourceTag,
        native_id: String,
        reason: String,
    },

    #[error("Dangling reference: {kind} edge {from} -> {to} points at missing {missing}")]
    DanglingReference {
        kind: EdgeKind,
        from: String,
        to: String,
        missing: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
