//! Gallery Harvester main entry point
//!
//! This is the command-line interface for the Gallery Harvester image downloader.

use anyhow::Context;
use clap::Parser;
use gallery_harvester::config::{load_config, HarvestConfig};
use gallery_harvester::output::print_summary;
use gallery_harvester::progress::TracingSink;
use gallery_harvester::Harvester;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gallery Harvester: a recursive web-image downloader
///
/// Fetches an index page, follows every gallery sub-page link on it, and
/// saves each sub-page's images into its own folder as 001.jpg, 002.png, ...
#[derive(Parser, Debug)]
#[command(name = "gallery-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A recursive web-image downloader", long_about = None)]
struct Cli {
    /// URL of the index page listing the gallery sub-pages
    #[arg(value_name = "URL")]
    url: String,

    /// Directory that receives one folder per sub-page
    #[arg(value_name = "SAVE_DIR")]
    save_dir: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of sub-pages processed at once
    #[arg(long, value_name = "N")]
    pages: Option<usize>,

    /// Number of image downloads per sub-page at once
    #[arg(long, value_name = "N")]
    images: Option<usize>,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let harvester = Harvester::new(config).context("Invalid harvest settings")?;

    // First Ctrl-C cancels the run; in-flight downloads clean up after themselves
    let cancel = harvester.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling harvest");
            cancel.cancel();
        }
    });

    tracing::info!(
        "Harvesting {} into {}",
        cli.url,
        cli.save_dir.display()
    );

    let (_sink, result) = harvester
        .run_with_sink(&cli.url, &cli.save_dir, TracingSink::new())
        .await;

    let summary = result.with_context(|| format!("Harvest of {} failed", cli.url))?;

    if !cli.quiet {
        println!();
        print_summary(&summary);
    }

    Ok(())
}

/// Loads the optional config file and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<HarvestConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => HarvestConfig::default(),
    };

    if let Some(pages) = cli.pages {
        config.concurrency.max_concurrent_pages = pages;
    }
    if let Some(images) = cli.images {
        config.concurrency.max_concurrent_images = images;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.http.user_agent = user_agent.clone();
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gallery_harvester=info,warn"),
            1 => EnvFilter::new("gallery_harvester=debug,info"),
            2 => EnvFilter::new("gallery_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
