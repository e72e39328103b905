//! AutoNP — herb / compound / target / disease network builder.

use std::path::PathBuf;

use autonp_core::AutonpConfig;
use autonp_runtime::Pipeline;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod run;

fn resolve_config_path(arg: Option<&String>) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| std::env::var("AUTONP_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.yaml"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--validate" | "validate") => {
            let path = resolve_config_path(args.get(2));
            match AutonpConfig::load(&path) {
                Ok(config) => {
                    println!("Configuration OK: {}", path.display());
                    println!("  herbs:       {}", config.search.herbs.join(", "));
                    println!("  diseases:    {}", config.search.diseases.join(", "));
                    println!("  exact_match: {}", config.search.exact_match);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Invalid configuration {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        Some("--help" | "-h" | "help") => {
            println!("AutoNP — herb / compound / target / disease network builder");
            println!();
            println!("Usage: autonp [command] [config]");
            println!();
            println!("Commands:");
            println!("  run [config]         Build the network from save_dir.<source>/records.json");
            println!("  validate [config]    Check a configuration file");
            println!("  help                 Show this help message");
            println!();
            println!("The config path defaults to $AUTONP_CONFIG, then config.yaml.");
            Ok(())
        }
        Some("run") | None => {
            let path = resolve_config_path(args.get(2));
            let config = AutonpConfig::load(&path)?;
            info!("Configuration: {}", path.display());
            config.ensure_save_dirs()?;

            let batches = run::load_batches(&config)?;
            let pipeline = Pipeline::new(config.clone())?;
            let output = pipeline.run(batches).await?;
            let paths = run::write_outputs(&config, &output)?;

            run::print_report(&output.report);
            println!();
            println!("Network:            {}", paths.network.display());
            println!("Report:             {}", paths.report.display());
            println!("Target genes:       {}", paths.target_gene.display());
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'autonp help' for usage.", other);
            std::process::exit(1);
        }
    }
}
