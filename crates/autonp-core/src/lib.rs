//! AutoNP Core — source records, canonical entities, configuration, errors.

pub mod config;
pub mod entity;
pub mod error;
pub mod record;
pub mod verdict;

pub use config::{AutonpConfig, FilterConfig, SearchConfig};
pub use entity::*;
pub use error::{Error, Result};
pub use record::*;
pub use verdict::*;
