//! File plumbing for `autonp run`: read per-source records, write outputs.

use std::path::{Path, PathBuf};

use autonp_core::{AutonpConfig, Error, RawRecord, Result, SourceTag};
use autonp_runtime::{PipelineOutput, Report, SourceBatch};
use serde::Serialize;
use tracing::{info, warn};

/// File holding a source's raw records inside its `save_dir`.
pub const RECORDS_FILE: &str = "records.json";

/// Load `records.json` from every configured source directory, in source
/// order. Sources without a records file are skipped with a warning.
pub fn load_batches(config: &AutonpConfig) -> Result<Vec<SourceBatch>> {
    let mut batches = Vec::new();
    for &source in SourceTag::all() {
        let Some(dir) = config.save_dir_for(source) else {
            continue;
        };
        let path = dir.join(RECORDS_FILE);
        if !path.exists() {
            warn!("No {} for {}: {}", RECORDS_FILE, source, path.display());
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        let records: Vec<RawRecord> = serde_json::from_str(&text)?;
        info!("Loaded {} {} records from {}", records.len(), source, path.display());
        batches.push(SourceBatch::new(source.as_str(), records));
    }
    Ok(batches)
}

/// Paths written by `write_outputs`.
#[derive(Debug)]
pub struct OutputPaths {
    pub network: PathBuf,
    pub report: PathBuf,
    pub target_gene: PathBuf,
}

/// Write the graph document, report and target/gene table into
/// `save_dir.autonp`.
pub fn write_outputs(config: &AutonpConfig, output: &PipelineOutput) -> Result<OutputPaths> {
    let dir = config
        .save_dir_for(SourceTag::Autonp)
        .ok_or_else(|| Error::Config("save_dir.autonp is not configured".to_string()))?;
    std::fs::create_dir_all(dir)?;

    let paths = OutputPaths {
        network: dir.join("network.json"),
        report: dir.join("report.json"),
        target_gene: dir.join("target_gene.json"),
    };
    write_json(&paths.network, &output.network.to_document()?)?;
    write_json(&paths.report, &output.report)?;
    write_json(&paths.target_gene, &output.network.target_gene_rows())?;
    info!("Wrote outputs to {}", dir.display());
    Ok(paths)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

pub fn print_report(report: &Report) {
    println!("=== AutoNP Run Report ===");
    println!();
    println!(
        "{:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "source", "fetched", "failed", "accepted", "rejected", "new", "merged"
    );
    for (source, s) in &report.sources {
        println!(
            "{:<10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            source.as_str(),
            s.fetched,
            s.normalization_failures,
            s.accepted,
            s.rejected,
            s.new_canonical,
            s.merged_into_existing
        );
    }
    println!();
    println!("Nodes:              {}", report.network.node_count);
    println!("Edges:              {}", report.network.edge_count);
    println!("Fingerprint:        {}", report.network_digest);

    if !report.uncovered_herbs.is_empty() {
        println!();
        println!("Herbs without compounds (try HERBac):");
        for herb in &report.uncovered_herbs {
            println!("  - {}", herb);
        }
    }

    if !report.ambiguous_merges.is_empty() {
        println!();
        println!("Name-only merges to audit:");
        for key in &report.ambiguous_merges {
            println!("  - {}", key);
        }
    }

    if !report.unmatched_herbs.is_empty() {
        println!();
        println!("Unmatched herb names: {}", report.unmatched_herbs.join(", "));
    }
}
