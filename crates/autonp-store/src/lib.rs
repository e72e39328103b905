//! AutoNP Store — the assembled network, its graph document and fingerprint.

pub mod graph;
pub mod types;

pub use graph::{assemble, Network};
pub use types::*;
