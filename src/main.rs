//! Sumi-Trawl main entry point
//!
//! This is the command-line interface for the Sumi-Trawl page and media harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_trawl::config::{load_config_with_hash, validate, Config};
use sumi_trawl::crawler::crawl;
use sumi_trawl::output::print_statistics;
use sumi_trawl::parse_seed_url;
use tracing_subscriber::EnvFilter;

/// Sumi-Trawl: a depth-bounded page and media harvester
///
/// Sumi-Trawl walks a website breadth-first from a seed URL, saves the text
/// of every page it reaches and downloads the images and videos those pages
/// embed into a flat output directory.
#[derive(Parser, Debug)]
#[command(name = "sumi-trawl")]
#[command(version = "1.0.0")]
#[command(about = "A depth-bounded page and media harvester", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Maximum link depth from the seed (overrides the config file)
    #[arg(value_name = "MAX_DEPTH")]
    max_depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seed, show the effective settings, and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config, &cli.seed)?;
        return Ok(());
    }

    handle_crawl(config, &cli.seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_trawl=info,warn"),
            1 => EnvFilter::new("sumi_trawl=debug,info"),
            2 => EnvFilter::new("sumi_trawl=trace,debug"),
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

/// Handles the --dry-run mode: validates the seed and shows effective settings
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = parse_seed_url(seed).context("Invalid seed URL")?;

    println!("=== Sumi-Trawl Dry Run ===\n");
    println!("Seed: {}", seed);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Traversal workers: {}", config.crawler.traversal_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout);

    println!("\nMedia:");
    println!(
        "  Max concurrent downloads: {}",
        config.media.max_concurrent_downloads
    );
    println!("  Drain timeout: {}s", config.media.drain_timeout);

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("\nOutput directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} to depth {} into {}",
        seed,
        config.crawler.max_depth,
        config.output.directory
    );

    let stats = crawl(config, seed).await.context("Crawl could not start")?;

    if stats.media.timed_out {
        tracing::warn!(
            "Media drain timed out; {} downloads were cancelled",
            stats.media.cancelled
        );
    }
    print_statistics(&stats);

    Ok(())
}
