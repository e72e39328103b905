//! Runs the normalize → filter → merge → assemble pipeline and
//! summarizes each run into a report.
//!
//! Normalization and filtering run concurrently, one task per source batch.
//! Merging and assembly are single-threaded over the re-ordered results.

pub mod pipeline;
pub mod report;
pub mod types;

pub use pipeline::Pipeline;
pub use report::summarize;
pub use types::*;
