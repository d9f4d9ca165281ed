//! Rental-Scout main entry point
//!
//! This is the command-line interface for the Rental-Scout listing scraper.

use anyhow::{Context, Result};
use clap::Parser;
use rental_scout::config::{load_config_with_hash, Config};
use rental_scout::crawler::{build_scheduler, scrape_once, Pacer, PageFetcher, RentalIndexScraper};
use rental_scout::output::{
    format_dry_run, format_firing_report, load_statistics, print_statistics, DEFAULT_RECENT_RUNS,
};
use rental_scout::policy::PolicyGate;
use rental_scout::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rental-Scout: a polite apartment-listing scraper
///
/// Rental-Scout periodically crawls rental index pages for a set of
/// locations, respecting a path policy and a crawl delay, and stores the
/// listings it finds together with a summary of every run.
#[derive(Parser, Debug)]
#[command(name = "rental-scout")]
#[command(version)]
#[command(about = "A polite apartment-listing scraper", long_about = None)]
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

    /// Run every source once and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,

    /// Validate config and show what would be fetched without fetching
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.once {
        handle_once(&config).await
    } else {
        handle_schedule(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rental_scout=info,warn"),
            1 => EnvFilter::new("rental_scout=debug,info"),
            2 => EnvFilter::new("rental_scout=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("=== Rental-Scout Dry Run ===\n");

    println!("Schedule:");
    println!("  Every {} hours", config.scheduler.interval_hours);

    println!("\nPolicy:");
    println!("  Crawl delay: {}s", config.policy.crawl_delay);
    println!(
        "  Item jitter: {}-{}ms",
        config.policy.jitter_min_ms, config.policy.jitter_max_ms
    );
    println!("  Allowed: {}", config.policy.allowed_paths.join(", "));
    println!("  Disallowed: {}", config.policy.disallowed_paths.join(", "));

    println!("\nRequest:");
    println!("  User agent: {}", config.request.user_agent);
    println!("  Timeout: {}s", config.request.timeout_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    let gate = Arc::new(PolicyGate::from_config(&config.policy));
    let fetcher = PageFetcher::new(&config.request).context("Failed to build HTTP client")?;
    let pacer = Pacer::from_config(&config.policy);

    println!("\nSources ({}):", config.sources.len());
    let mut planned = 0;
    for entry in &config.sources {
        let scraper = RentalIndexScraper::new(entry, gate.clone(), fetcher.clone(), pacer.clone())
            .with_context(|| format!("Invalid source {}", entry.name))?;
        planned += scraper.planned_fetches().iter().filter(|(_, allowed)| *allowed).count();
        print!("{}", format_dry_run(&scraper));
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} index pages per firing", planned);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage, DEFAULT_RECENT_RUNS)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: one firing, then exit
async fn handle_once(config: &Config) -> Result<()> {
    tracing::info!("Running {} sources once", config.sources.len());

    let report = scrape_once(config).await?;
    print!("{}", format_firing_report(&report));

    if report.failed() > 0 {
        anyhow::bail!("{} of {} sources failed", report.failed(), report.outcomes.len());
    }
    Ok(())
}

/// Handles the default mode: run the scheduler until Ctrl-C
async fn handle_schedule(config: &Config) -> Result<()> {
    let scheduler = build_scheduler(config)?;
    let handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Interrupt received, stopping after the current firing");
    handle.stop();

    let firings = handle.join().await.context("Scheduler task failed")?;
    tracing::info!("Scheduler exited after {} firings", firings);

    Ok(())
}
