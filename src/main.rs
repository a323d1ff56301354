//! GeM Harvest main entry point
//!
//! This is the command-line interface for the GeM contract document crawler.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use gem_harvest::config::{load_config_with_hash, validate, Config};
use gem_harvest::crawler::Coordinator;
use gem_harvest::output::print_statistics;
use gem_harvest::storage::{open_cache, CompletionStore};
use gem_harvest::window::WindowPlanner;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GeM Harvest: a resumable contract document crawler
///
/// Walks the contract listing of the GeM portal window by window, downloads
/// each contract's PDF and records it in an append-only completion log so
/// that interrupted runs resume without downloading anything twice.
#[derive(Parser, Debug)]
#[command(name = "gem-harvest")]
#[command(version)]
#[command(about = "A resumable GeM contract document crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override from-date (DD-MM-YYYY)
    #[arg(long, value_name = "DATE")]
    from: Option<String>,

    /// Override to-date (DD-MM-YYYY)
    #[arg(long, value_name = "DATE")]
    to: Option<String>,

    /// Keep crawling successive windows until today
    #[arg(long)]
    repeat: bool,

    /// Validate config and show the planned windows without crawling
    #[arg(long)]
    dry_run: bool,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    apply_overrides(&mut config, &cli).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, cli.json).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gem_harvest=info,warn"),
            1 => EnvFilter::new("gem_harvest=debug,info"),
            2 => EnvFilter::new("gem_harvest=trace,debug"),
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

/// Applies command-line overrides and re-validates the result
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), gem_harvest::ConfigError> {
    if let Some(from) = &cli.from {
        config.crawl.from_date = from.clone();
    }
    if let Some(to) = &cli.to {
        config.crawl.to_date = to.clone();
    }
    if cli.repeat {
        config.crawl.repeat_till_date = true;
    }
    validate(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== GeM Harvest Dry Run ===\n");

    println!("Crawl:");
    println!("  From: {}", config.crawl.from_date);
    println!("  To: {}", config.crawl.to_date);
    println!("  Repeat till today: {}", config.crawl.repeat_till_date);
    println!("  Throttle: {}ms", config.crawl.throttle_time);
    println!("  Page delay: {}ms", config.crawl.page_delay);

    println!("\nFilters:");
    println!("  Department: {:?}", config.filters.department);
    println!("  Batch number: {:?}", config.filters.bno);
    println!("  Buyer category: {:?}", config.filters.buyer_category);

    println!("\nPortal:");
    println!("  Listing: {}", config.portal.listing_url);
    println!("  Token exchange: {}", config.portal.token_url);

    let cache = open_cache(&config.output.cache_path)?;
    println!("\nOutput:");
    println!("  Documents: {}", config.output.root_dir.display());
    println!(
        "  Completion log: {} ({} records)",
        config.output.cache_path.display(),
        cache.len()
    );

    let today = Local::now().date_naive();
    let windows: Vec<_> = WindowPlanner::new(
        config.initial_window()?,
        today,
        config.crawl.repeat_till_date,
    )
    .collect();

    println!("\nPlanned windows ({}):", windows.len());
    for window in &windows {
        println!("  - {} -> {}", window, window.dir_name());
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, json: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} to {}{}",
        config.crawl.from_date,
        config.crawl.to_date,
        if config.crawl.repeat_till_date {
            ", then onwards to today"
        } else {
            ""
        }
    );

    let cache = open_cache(&config.output.cache_path)?;
    let mut coordinator = Coordinator::with_cache(config, cache)?;
    let stats = coordinator.run().await?;
    tracing::info!(
        "Completion log {} now holds {} records",
        coordinator.cache().path().display(),
        coordinator.cache().len()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_statistics(&stats);
    }

    Ok(())
}
