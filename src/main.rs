//! Sitescout main entry point
//!
//! This is the command-line interface for the Sitescout company-profile harvester.

use anyhow::{bail, Context};
use clap::Parser;
use sitescout::browser::ChromeEngine;
use sitescout::config::{load_config_with_hash, Config};
use sitescout::output::{print_statistics, write_report, BatchReport, BatchStatistics};
use sitescout::search::SearchClient;
use sitescout::url::{classify_scan, ScanInput};
use sitescout::Coordinator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Sitescout: a resilient company-profile harvester
///
/// Sitescout loads each target in a headless browser, extracts company
/// details, and follows contact pages when details are missing. Blocked
/// or crashed loads are retried through the configured proxies.
#[derive(Parser, Debug)]
#[command(name = "sitescout")]
#[command(version = "1.0.0")]
#[command(about = "A resilient company-profile harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URLs to scan, or a single company name to search for
    #[arg(value_name = "SCAN", required = true)]
    scan: Vec<String>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scanned without launching a browser
    #[arg(long, conflicts_with = "summary")]
    dry_run: bool,

    /// Print batch statistics after the run
    #[arg(long)]
    summary: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let targets = resolve_targets(&config, &cli.scan, cli.dry_run).await?;

    if cli.dry_run {
        handle_dry_run(&config, &targets);
        return Ok(());
    }

    if targets.is_empty() {
        bail!(sitescout::ScoutError::NoTargets);
    }

    handle_scan(config, &targets, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitescout=info,warn"),
            1 => EnvFilter::new("sitescout=debug,info"),
            2 => EnvFilter::new("sitescout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so the JSON report can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Turns the scan arguments into crawl targets, searching when given a name
async fn resolve_targets(
    config: &Config,
    scan: &[String],
    dry_run: bool,
) -> anyhow::Result<Vec<String>> {
    match classify_scan(scan).context("Invalid scan input")? {
        ScanInput::Targets(targets) => Ok(targets),
        ScanInput::Query(query) if dry_run => {
            println!("Would search for: {}", query);
            Ok(Vec::new())
        }
        ScanInput::Query(query) => {
            let client = SearchClient::from_config(&config.search)?;
            let targets = client
                .search_targets(&query)
                .await
                .with_context(|| format!("Search for '{}' failed", query))?;
            tracing::info!("Search for '{}' found {} target(s)", query, targets.len());
            Ok(targets)
        }
    }
}

/// Handles the --dry-run mode: shows what would be scanned
fn handle_dry_run(config: &Config, targets: &[String]) {
    println!("=== Sitescout Dry Run ===\n");

    println!("Browser:");
    println!(
        "  Executable: {}",
        config.browser.executable.as_deref().unwrap_or("(bundled lookup)")
    );
    println!("  Navigation timeout: {}s", config.browser.navigation_timeout_secs);
    println!("  Default timeout: {}s", config.browser.default_timeout_secs);
    println!("  Blocked resources: {}", config.browser.blocked_resources.join(", "));

    println!("\nRetry:");
    println!("  Max batch retries: {}", config.retry.max_batch_retries);
    println!("  Max URL attempts: {}", config.retry.max_url_attempts);
    println!("  Max navigation retries: {}", config.retry.max_navigation_retries);
    println!("  Max page create retries: {}", config.retry.max_page_create_retries);

    println!("\nContact Crawl:");
    println!("  Enabled: {}", config.contact.enabled);
    println!("  Pool size: {}", config.contact.pool_size);

    println!("\nProxies ({}):", config.proxy.servers.len());
    for server in &config.proxy.servers {
        println!("  - {}", server);
    }

    println!("\nTargets ({}):", targets.len());
    for target in targets {
        println!("  - {}", target);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main scan operation
async fn handle_scan(config: Config, targets: &[String], cli: &Cli) -> anyhow::Result<()> {
    tracing::info!(
        "Scanning {} target(s) with {} prox(ies) configured",
        targets.len(),
        config.proxy.servers.len()
    );

    let config = Arc::new(config);
    let coordinator = Coordinator::new(ChromeEngine::new(Arc::clone(&config)), config);

    let results = coordinator.process_batch(targets).await;
    tracing::info!(
        "Batch finished: {} resolved, {} unresolved",
        results.resolved_count(),
        results.unresolved_count()
    );

    let stats = cli
        .summary
        .then(|| BatchStatistics::from_results(&results, targets));

    write_report(&BatchReport::new(results), cli.output.as_deref())
        .context("Failed to write report")?;

    if let Some(stats) = stats {
        print_statistics(&stats);
    }

    Ok(())
}
