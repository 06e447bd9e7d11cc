//! Classfeed main entry point
//!
//! Command-line driver for the class-schedule ingestion pipeline.

use anyhow::Context;
use clap::Parser;
use classfeed::config::load_config_with_hash;
use classfeed::pipeline::{run_provider, upload_pending};
use classfeed::provider::{build_http_client, JsonEndpointProvider, ScrapeOptions};
use classfeed::storage::{open_storage, Store};
use classfeed::upload::BackendClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Classfeed: fitness-class schedule aggregation
///
/// Scrapes configured providers, validates and deduplicates their class
/// records into a local store, and forwards accepted records to the
/// backend in batches.
#[derive(Parser, Debug)]
#[command(name = "classfeed")]
#[command(version = "1.0.0")]
#[command(about = "Fitness-class schedule ingestion pipeline", long_about = None)]
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

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with_all = ["stats", "upload_pending"])]
    dry_run: bool,

    /// Show statistics from the local store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "upload_pending"])]
    stats: bool,

    /// Only retry rows still awaiting upload, without scraping
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    upload_pending: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        load_config_with_hash(&cli.config).context("failed to load configuration")?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.upload_pending {
        handle_upload_pending(&config).await?;
    } else {
        handle_scrape(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("classfeed=info,warn"),
            1 => EnvFilter::new("classfeed=debug,info"),
            2 => EnvFilter::new("classfeed=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &classfeed::Config) {
    println!("=== Classfeed Dry Run ===\n");

    println!("Storage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nBackend:");
    println!("  Upload URL: {}", config.backend.upload_url);
    println!(
        "  API key: {}",
        if config.backend.api_key.is_some() {
            "configured"
        } else {
            "none"
        }
    );
    println!("  Batch size: {}", config.backend.batch_size);
    println!("  Batch timeout: {}s", config.backend.batch_timeout_secs);
    println!("  Batch delay: {}ms", config.backend.batch_delay_ms);

    let enabled = config.providers.iter().filter(|p| p.enabled).count();
    println!("\nProviders ({} configured, {} enabled):", config.providers.len(), enabled);
    for entry in &config.providers {
        let marker = if entry.enabled { "-" } else { "- [disabled]" };
        println!("  {} {} ({})", marker, entry.name, entry.endpoint);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would scrape {} providers", enabled);
}

/// Handles the --stats mode: shows statistics from the local store
fn handle_stats(config: &classfeed::Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_storage(std::path::Path::new(&config.storage.database_path))?;

    println!("Total runs:      {}", store.count_runs()?);
    println!("Total classes:   {}", store.count_classes()?);
    println!("Pending upload:  {}", store.count_unuploaded()?);

    let stats = store.all_provider_stats()?;
    if !stats.is_empty() {
        println!("\nProviders:");
        for provider in stats {
            let last = provider
                .last_scrape_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            println!(
                "  {} — runs: {} ({} ok), classes: {}, last: {}",
                provider.name,
                provider.total_runs,
                provider.successful_runs,
                provider.total_classes_found,
                last
            );
        }
    }

    Ok(())
}

/// Handles the --upload-pending mode: retries unsent rows only
async fn handle_upload_pending(config: &classfeed::Config) -> anyhow::Result<()> {
    let mut store = open_storage(std::path::Path::new(&config.storage.database_path))?;
    let backend = BackendClient::new(&config.backend)?;

    let report = upload_pending(&mut store, &backend, None).await?;
    tracing::info!(
        "Upload pending finished: {} uploaded, {} failed",
        report.uploaded,
        report.failed
    );
    for error in &report.errors {
        tracing::warn!("Upload error: {}", error);
    }

    Ok(())
}

/// Handles the default mode: scrape every enabled provider, then upload
async fn handle_scrape(config: &classfeed::Config) -> anyhow::Result<()> {
    let mut store = open_storage(std::path::Path::new(&config.storage.database_path))?;
    let backend = BackendClient::new(&config.backend)?;
    let client = build_http_client(concat!("classfeed/", env!("CARGO_PKG_VERSION")))?;

    let options = ScrapeOptions::default();
    let mut failures = 0usize;

    // Providers run sequentially; a failed run never stops the next one
    for entry in config.providers.iter().filter(|p| p.enabled) {
        let provider = JsonEndpointProvider::new(&entry.name, &entry.endpoint, client.clone());

        let outcome = run_provider(&mut store, &provider, &backend, &options).await?;
        if outcome.status == classfeed::RunStatus::Failed {
            failures += 1;
        }
        tracing::info!(
            "{}: {:?} — accepted {}, invalid {}, duplicates {}, uploaded {}",
            outcome.provider_name,
            outcome.status,
            outcome.tally.accepted,
            outcome.tally.invalid,
            outcome.tally.duplicates,
            outcome.upload.uploaded
        );
    }

    if failures > 0 {
        tracing::warn!("{} provider runs failed; see run history for details", failures);
    }

    Ok(())
}
