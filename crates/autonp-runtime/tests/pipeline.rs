//! End-to-end pipeline tests over small hand-built source batches.

use std::collections::BTreeMap;

use autonp_core::{Attribute, AutonpConfig, Error, MergeStatus, RawRecord, SourceTag};
use autonp_filter::{FilterEngine, SourceThresholds};
use autonp_ingest::normalize;
use autonp_runtime::{Pipeline, SourceBatch};

const QUERCETIN: &str = "REFLWNWKIQQWQH-UHFFFAOYSA-N";
const KAEMPFEROL: &str = "IYRMWMYZSQPJKC-UHFFFAOYSA-N";

fn config() -> AutonpConfig {
    AutonpConfig::from_yaml_str(
        r#"
search:
  herbs: [黄芪, 人参]
  diseases: [asthma]
  exact_match: false
filter:
  tcmsp: { ob: 30, dl: 0.18 }
  herbac: { weight: 500 }
  pubchem: { xlogp: 5, hbonddonor: 5, hbondacc: 10 }
  swiss: { prob: 0 }
"#,
    )
    .unwrap()
}

fn batches() -> Vec<SourceBatch> {
    vec![
        SourceBatch::new(
            "tcmsp",
            vec![
                RawRecord::new("tcmsp", "MOL000098")
                    .with_field("molecule_name", "quercetin")
                    .with_field("inchikey", QUERCETIN)
                    .with_field("herb", "黄芪")
                    .with_field("ob", 46.43)
                    .with_field("dl", 0.28)
                    .with_field("mw", 302.0),
                RawRecord::new("tcmsp", "MOL000422")
                    .with_field("molecule_name", "kaempferol")
                    .with_field("inchikey", KAEMPFEROL)
                    .with_field("herb", "黄芪")
                    .with_field("ob", 25.0)
                    .with_field("dl", 0.24),
                RawRecord::new("tcmsp", "  ").with_field("molecule_name", "blank id"),
            ],
        ),
        SourceBatch::new(
            "herbac",
            vec![RawRecord::new("herbac", "HBIN041032")
                .with_field("Ingredient_name", "Quercetin")
                .with_field("inchikey", QUERCETIN)
                .with_field("PubChem_id", 5280343i64)
                .with_field("Herb", "黄芪")
                .with_field("Ingredient_weight", "302.24 g/mol")],
        ),
        SourceBatch::new(
            "pubchem",
            vec![RawRecord::new("pubchem", "5280343")
                .with_field("cid", 5280343i64)
                .with_field("cmpdname", "Quercetin")
                .with_field("xlogp", 1.5)
                .with_field("hbondacc", 7i64)],
        ),
        SourceBatch::new(
            "swiss",
            vec![RawRecord::new("swiss", "quercetin-PTGS2")
                .with_field("Molecule", "quercetin")
                .with_field("inchikey", QUERCETIN)
                .with_field("Target", "Prostaglandin G/H synthase 2")
                .with_field("Common name", "PTGS2")
                .with_field("Probability*", 0.92)],
        ),
        SourceBatch::new(
            "uniprot",
            vec![
                RawRecord::new("uniprot", "P35354")
                    .with_field("Entry", "P35354")
                    .with_field("Gene Names (primary)", "PTGS2")
                    .with_field(
                        "Protein names",
                        "Prostaglandin G/H synthase 2 (EC 1.14.99.1) (Cyclooxygenase-2)",
                    )
                    .with_field("Involvement in disease", "Asthma, aspirin-induced"),
                RawRecord::new("uniprot", "P04637")
                    .with_field("Entry", "P04637")
                    .with_field("Gene Names (primary)", "TP53")
                    .with_field("Protein names", "Cellular tumor antigen p53"),
            ],
        ),
    ]
}

#[tokio::test]
async fn test_full_run() {
    let pipeline = Pipeline::new(config()).unwrap();
    let output = pipeline.run(batches()).await.unwrap();
    let network = &output.network;

    // Quercetin from four sources collapses into one compound; kaempferol
    // was only ever rejected and stays out.
    assert_eq!(network.compounds().len(), 1);
    let quercetin = network.compound("cid:5280343").unwrap();
    assert_eq!(quercetin.aliases.len(), 4);
    assert_eq!(quercetin.rejections.len(), 1);
    assert_eq!(quercetin.rejections[0].source, SourceTag::Pubchem);

    let weights = quercetin.attribute_values(Attribute::MolecularWeight);
    assert_eq!(weights.len(), 2);
    assert_eq!(
        quercetin.value_from(Attribute::MolecularWeight, SourceTag::Tcmsp),
        Some(302.0)
    );
    assert_eq!(
        quercetin.value_from(Attribute::MolecularWeight, SourceTag::Herbac),
        Some(302.24)
    );

    // PTGS2 resolved through UniProt; TP53 was never named by a source.
    assert_eq!(network.targets().len(), 1);
    let ptgs2 = network.target("uniprot:P35354").unwrap();
    assert_eq!(ptgs2.gene_symbol.as_deref(), Some("PTGS2"));
    assert_eq!(ptgs2.display_name, "Prostaglandin G/H synthase 2");

    assert_eq!(network.compounds_of_herb("黄芪"), vec!["cid:5280343"]);
    assert_eq!(network.targets_of_compound("cid:5280343"), vec!["uniprot:P35354"]);
    assert_eq!(network.diseases_of_target("uniprot:P35354"), vec!["asthma"]);
    assert!(network.compounds_of_herb("人参").is_empty());

    let rows = network.target_gene_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].gene_symbol.as_deref(), Some("PTGS2"));
}

#[tokio::test]
async fn test_report_counters() {
    let output = Pipeline::new(config()).unwrap().run(batches()).await.unwrap();
    let report = &output.report;

    let tcmsp = &report.sources[&SourceTag::Tcmsp];
    assert_eq!(tcmsp.fetched, 3);
    assert_eq!(tcmsp.normalized, 2);
    assert_eq!(tcmsp.normalization_failures, 1);
    assert_eq!(tcmsp.accepted, 1);
    assert_eq!(tcmsp.rejected, 1);
    assert_eq!(tcmsp.new_canonical, 1);
    assert_eq!(
        tcmsp.rejected_by_reason["below_threshold(oral_bioavailability)"],
        1
    );

    let herbac = &report.sources[&SourceTag::Herbac];
    assert_eq!(herbac.merged_into_existing, 1);

    let pubchem = &report.sources[&SourceTag::Pubchem];
    assert_eq!(pubchem.rejected, 1);
    assert_eq!(pubchem.provenance_only, 1);
    assert_eq!(pubchem.rejected_by_reason["missing_field(hbond_donor_count)"], 1);

    let uniprot = &report.sources[&SourceTag::Uniprot];
    assert_eq!(uniprot.merged_into_existing, 1);
    assert_eq!(uniprot.reference_only, 1);

    assert_eq!(report.uncovered_herbs, vec!["人参".to_string()]);
    let coverage = &report.herb_coverage["黄芪"];
    assert_eq!(coverage.compounds, 1);
    assert!(coverage.sources.contains(&SourceTag::Tcmsp));
    assert!(coverage.sources.contains(&SourceTag::Herbac));

    assert_eq!(report.rejections.len(), 2);
    assert!(report.ambiguous_merges.is_empty());
    assert_eq!(report.network_digest.len(), 64);
}

#[tokio::test]
async fn test_idempotent() {
    let pipeline = Pipeline::new(config()).unwrap();
    let first = pipeline.run(batches()).await.unwrap();
    let second = pipeline.run(batches()).await.unwrap();
    assert_eq!(first.report, second.report);
    assert_eq!(
        first.network.fingerprint().unwrap(),
        second.network.fingerprint().unwrap()
    );
}

#[tokio::test]
async fn test_batch_order_does_not_matter() {
    let pipeline = Pipeline::new(config()).unwrap();
    let forward = pipeline.run(batches()).await.unwrap();
    let mut reversed = batches();
    reversed.reverse();
    let backward = pipeline.run(reversed).await.unwrap();
    assert_eq!(forward.report.network_digest, backward.report.network_digest);
}

/// Every judged record's verdict agrees with a direct reading of its
/// source's thresholds: accepted records satisfy all of them, rejected
/// records fail the one named as the reason.
#[tokio::test]
async fn test_no_false_accept_or_reject() {
    let config = config();
    let engine = FilterEngine::new(&config.filter);
    let mut accepted = BTreeMap::<SourceTag, usize>::new();
    let mut rejected = 0;

    for batch in batches() {
        for raw in &batch.records {
            let Ok(record) = normalize(raw) else {
                continue;
            };
            let verdict = engine.evaluate(&record);
            let table = SourceThresholds::from_config(record.source, &config.filter);
            let applicable = table.applicable(&record);
            assert_eq!(verdict.thresholds_applied, applicable);
            if record.source != SourceTag::Swiss {
                assert_eq!(applicable, table.thresholds);
            }

            let failing: Vec<Attribute> = applicable
                .iter()
                .filter(|t| {
                    record.malformed.contains_key(&t.attribute)
                        || !record.attribute(t.attribute).is_some_and(|v| t.admits(v))
                })
                .map(|t| t.attribute)
                .collect();

            if verdict.accepted {
                assert!(failing.is_empty(), "{} accepted despite {:?}", record.native_id, failing);
                assert!(verdict.reason.is_none());
                *accepted.entry(record.source).or_default() += 1;
            } else {
                let reason = verdict.reason.unwrap();
                assert_eq!(failing.first(), Some(&reason.field()), "{}", record.native_id);
                rejected += 1;
            }
        }
    }
    assert_eq!(rejected, 2);

    let output = Pipeline::new(config).unwrap().run(batches()).await.unwrap();
    for (source, summary) in &output.report.sources {
        assert_eq!(summary.accepted, accepted.get(source).copied().unwrap_or(0));
        assert_eq!(
            summary.accepted + summary.rejected + summary.normalization_failures,
            summary.fetched
        );
    }
    for edge in output.network.edges() {
        assert!(edge.evidence.iter().any(|e| e.verdict.accepted));
    }
}

#[tokio::test]
async fn test_distinct_structures_stay_separate() {
    let pipeline = Pipeline::new(config()).unwrap();
    let input = vec![SourceBatch::new(
        "tcmsp",
        vec![
            RawRecord::new("tcmsp", "MOL000098")
                .with_field("molecule_name", "quercetin")
                .with_field("inchikey", QUERCETIN)
                .with_field("herb", "黄芪")
                .with_field("ob", 46.43)
                .with_field("dl", 0.28),
            RawRecord::new("tcmsp", "MOL000422")
                .with_field("molecule_name", "kaempferol")
                .with_field("inchikey", KAEMPFEROL)
                .with_field("herb", "黄芪")
                .with_field("ob", 41.88)
                .with_field("dl", 0.24),
        ],
    )];
    let output = pipeline.run(input).await.unwrap();
    let network = &output.network;

    assert_eq!(network.compounds().len(), 2);
    let quercetin = format!("inchikey:{}", QUERCETIN);
    let kaempferol = format!("inchikey:{}", KAEMPFEROL);
    assert!(network.compound(&quercetin).is_some());
    assert!(network.compound(&kaempferol).is_some());
    assert_eq!(network.compounds_of_herb("黄芪").len(), 2);
    assert_eq!(output.report.sources[&SourceTag::Tcmsp].new_canonical, 2);
    assert!(output.report.reconciliations.is_empty());
}

#[tokio::test]
async fn test_swiss_adme_row_admitted() {
    let config = AutonpConfig::from_yaml_str(
        r#"
search:
  herbs: [黄芪]
filter:
  swiss: { adme_rules: 3, gi_absorption_high: true }
"#,
    )
    .unwrap();
    let input = vec![SourceBatch::new(
        "swiss",
        vec![RawRecord::new("swiss", "adme-quercetin")
            .with_field("Molecule", "quercetin")
            .with_field("cid", 5280343i64)
            .with_field("herb", "黄芪")
            .with_field("Lipinski #violations", 0i64)
            .with_field("Ghose #violations", 0i64)
            .with_field("Veber #violations", 0i64)
            .with_field("Egan #violations", 0i64)
            .with_field("Muegge #violations", 0i64)
            .with_field("GI absorption", "High")],
    )];
    let output = Pipeline::new(config).unwrap().run(input).await.unwrap();

    let swiss = &output.report.sources[&SourceTag::Swiss];
    assert_eq!(swiss.accepted, 1);
    assert!(swiss.rejected_by_reason.is_empty());
    assert!(output.network.compound("cid:5280343").is_some());
    assert_eq!(output.network.compounds_of_herb("黄芪"), vec!["cid:5280343"]);
}

#[tokio::test]
async fn test_every_edge_endpoint_exists() {
    let output = Pipeline::new(config()).unwrap().run(batches()).await.unwrap();
    let network = &output.network;
    network.verify().unwrap();
    for edge in network.edges() {
        let found = match edge.kind {
            autonp_core::EdgeKind::HerbCompound => {
                network.herbs().contains_key(&edge.from) && network.compound(&edge.to).is_some()
            }
            autonp_core::EdgeKind::CompoundTarget => {
                network.compound(&edge.from).is_some() && network.target(&edge.to).is_some()
            }
            autonp_core::EdgeKind::TargetDisease => {
                network.target(&edge.from).is_some() && network.diseases().contains_key(&edge.to)
            }
        };
        assert!(found, "dangling {} edge {} -> {}", edge.kind, edge.from, edge.to);
    }
}

#[tokio::test]
async fn test_unknown_source_is_fatal() {
    let pipeline = Pipeline::new(config()).unwrap();
    let mut input = batches();
    input.push(SourceBatch::new("chembl", Vec::new()));
    let err = pipeline.run(input).await.unwrap_err();
    assert!(matches!(err, Error::UnknownSource(ref s) if s == "chembl"));
}

#[tokio::test]
async fn test_name_only_compounds_flagged() {
    let pipeline = Pipeline::new(config()).unwrap();
    let input = vec![
        SourceBatch::new(
            "tcmsp",
            vec![RawRecord::new("tcmsp", "MOL000211")
                .with_field("molecule_name", "Mairin")
                .with_field("herb", "黄芪")
                .with_field("ob", 55.38)
                .with_field("dl", 0.78)],
        ),
        SourceBatch::new(
            "herbac",
            vec![RawRecord::new("herbac", "HBIN035470")
                .with_field("Ingredient_name", "mairin")
                .with_field("Herb", "黄芪")
                .with_field("Ingredient_weight", "456.7")],
        ),
    ];
    let output = pipeline.run(input).await.unwrap();
    let mairin = output.network.compound("name:mairin").unwrap();
    assert_eq!(mairin.status, MergeStatus::AmbiguousMerge);
    assert_eq!(output.report.ambiguous_merges, vec!["name:mairin".to_string()]);
}

#[tokio::test]
async fn test_blank_record_source_inherits_batch() {
    let pipeline = Pipeline::new(config()).unwrap();
    let input = vec![SourceBatch::new(
        "tcmsp",
        vec![RawRecord::new("", "MOL000098")
            .with_field("molecule_name", "quercetin")
            .with_field("inchikey", QUERCETIN)
            .with_field("herb", "黄芪")
            .with_field("ob", 46.43)
            .with_field("dl", 0.28)],
    )];
    let output = pipeline.run(input).await.unwrap();
    assert_eq!(output.report.sources[&SourceTag::Tcmsp].accepted, 1);
}

#[tokio::test]
async fn test_mistagged_record_counted_under_batch() {
    let pipeline = Pipeline::new(config()).unwrap();
    let input = vec![SourceBatch::new(
        "swiss",
        vec![RawRecord::new("tcmsp", "MOL000098")
            .with_field("molecule_name", "quercetin")
            .with_field("inchikey", QUERCETIN)
            .with_field("herb", "黄芪")
            .with_field("ob", 46.43)
            .with_field("dl", 0.28)],
    )];
    let output = pipeline.run(input).await.unwrap();
    let report = &output.report;

    assert_eq!(report.sources[&SourceTag::Swiss].normalization_failures, 1);
    assert!(!report.sources.contains_key(&SourceTag::Tcmsp));
    assert_eq!(report.normalization_failures.len(), 1);
    let failure = &report.normalization_failures[0];
    assert_eq!(failure.source, SourceTag::Swiss);
    assert_eq!(failure.native_id, "MOL000098");
    assert!(failure.reason.starts_with("tcmsp record"));
    assert!(output.network.compounds().is_empty());
}
