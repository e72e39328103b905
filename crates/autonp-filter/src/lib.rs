//! Filter engine: decides which normalized records are admitted.
//!
//! Thresholds are built once from the immutable configuration, one
//! `SourceThresholds` table per source. Evaluation is a pure function of
//! the record and its source's table.

pub mod engine;
pub mod thresholds;

pub use engine::{evaluate, FilterEngine};
pub use thresholds::SourceThresholds;
