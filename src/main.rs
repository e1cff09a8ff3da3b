//! Filmow-Export main entry point
//!
//! This is the command-line interface for the Filmow collection extractor.

use clap::Parser;
use filmow_export::config::{load_config, Config};
use filmow_export::model::CategoryKey;
use filmow_export::output::{export_snapshot, print_summary};
use filmow_export::pipeline::Orchestrator;
use filmow_export::ExportError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Filmow-Export: exports a Filmow profile's movie and TV lists
///
/// Fetches the watched, favorites and wishlist feeds of a public profile,
/// merges and sorts them, and writes JSON and/or CSV files.
#[derive(Parser, Debug)]
#[command(name = "filmow-export")]
#[command(version = "1.0.0")]
#[command(about = "Exports a Filmow user's collection", long_about = None)]
struct Cli {
    /// Filmow username (asked for interactively when omitted)
    #[arg(value_name = "USERNAME")]
    username: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sort order: title, rating, favorite or none
    #[arg(short, long, value_name = "KEY")]
    sort: Option<String>,

    /// Only export movies
    #[arg(long, conflicts_with = "tv_only")]
    movies_only: bool,

    /// Only export TV shows
    #[arg(long, conflicts_with = "movies_only")]
    tv_only: bool,

    /// Number of concurrent requests (1-64)
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Site language: pt or en
    #[arg(short, long, value_name = "LANG")]
    language: Option<String>,

    /// Directory receiving the export files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Export format: json, csv, xlsx or all (repeatable)
    #[arg(short, long = "format", value_name = "FORMAT")]
    formats: Vec<String>,

    /// Validate settings and show what would be fetched without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load_settings(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    let username = match cli.username.clone() {
        Some(username) => username,
        None => prompt_username()?,
    };

    match handle_export(&config, &username, cli.quiet).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Export failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("filmow_export=info,warn"),
            1 => EnvFilter::new("filmow_export=debug,info"),
            2 => EnvFilter::new("filmow_export=trace,debug"),
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

/// Reads the config file (if any) and applies command-line overrides
fn load_settings(cli: &Cli) -> Result<Config, ExportError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(sort) = &cli.sort {
        config.export.sort = sort.clone();
    }
    if cli.movies_only {
        config.export.media = "movies".to_string();
    }
    if cli.tv_only {
        config.export.media = "tv".to_string();
    }
    if let Some(workers) = cli.workers {
        config.scraper.worker_count = workers;
    }
    if let Some(timeout) = cli.timeout {
        config.scraper.request_timeout = timeout;
    }
    if let Some(language) = &cli.language {
        config.scraper.language = language.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.export.output_dir = dir.clone();
    }
    if !cli.formats.is_empty() {
        config.export.formats = cli.formats.clone();
    }

    filmow_export::config::validate(&config)?;
    Ok(config)
}

fn prompt_username() -> Result<String, ExportError> {
    print!("Filmow username: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Handles the --dry-run mode: shows the resolved settings
fn handle_dry_run(config: &Config) -> Result<(), ExportError> {
    let options = config.run_options()?;
    let export = config.export_options()?;

    println!("=== Filmow-Export Dry Run ===\n");

    println!("Scraper:");
    println!("  Base URL: {}", options.base_url);
    println!("  Language: {}", options.language);
    println!("  Workers: {}", options.worker_count);
    println!("  Request timeout: {}s", options.request_timeout_secs);
    println!(
        "  Retries: {} attempt(s), backoff {}ms to {}ms",
        options.retry.max_attempts,
        options.retry.initial_backoff.as_millis(),
        options.retry.max_backoff.as_millis()
    );

    println!("\nExport:");
    println!("  Sort: {}", options.sort_key);
    println!("  Media: {}", options.media_filter);
    println!("  Output directory: {}", export.output_dir.display());
    println!("  Formats: {:?}", export.formats);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main export operation
async fn handle_export(config: &Config, username: &str, quiet: bool) -> Result<(), ExportError> {
    let options = config.run_options()?;
    let export = config.export_options()?;
    let language = options.language;

    let orchestrator = Orchestrator::new(options)?;
    let report = orchestrator.run(username, &CategoryKey::ALL).await?;

    let written = export_snapshot(&report.snapshot, &export, language)?;

    if !quiet {
        print_summary(&report, language);
        for path in &written {
            println!("✓ Written: {}", path.display());
        }
    }

    if !report.outcome.is_complete() {
        tracing::warn!("Some categories are incomplete; see the summary above");
    }

    Ok(())
}
