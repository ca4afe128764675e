use anyhow::Result;
use appraiser::config::RunConfig;
use appraiser::pipeline;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "appraiser",
    about = "Appraiser — extracts asset valuations from provider pages and syncs them to a personal-finance ledger",
    version,
    after_help = "Requires LUNCH_MONEY_API_KEY in the environment (or a .env file).\nThe asset registry defaults to ./assets.json; override with --assets-path or ASSET_PATH."
)]
struct Cli {
    /// Resolve values but do not write them to the ledger
    #[arg(long)]
    dry_run: bool,

    /// Path to the asset registry JSON file
    #[arg(long)]
    assets_path: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "appraiser=debug"
    } else {
        "appraiser=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .init();

    info!("starting appraiser v{}", env!("CARGO_PKG_VERSION"));

    // Missing credential is the one hard non-zero exit, reported before
    // any browser or network activity.
    let config = match RunConfig::load(cli.dry_run, cli.assets_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    pipeline::run(&config).await
}
