//! Job-Harvest main entry point
//!
//! This is the command-line interface for the Job-Harvest listing crawler.

use anyhow::{bail, Context};
use clap::Parser;
use job_harvest::config::{load_config_with_hash, Config};
use job_harvest::crawler::crawl;
use job_harvest::output::print_report;
use job_harvest::progress::{LogReporter, ProgressReporter, StopHandle};
use job_harvest::storage::{dataset_name, CsvStore, RecordSink};
use job_harvest::url::SearchTarget;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Job-Harvest: a resilient job-listing harvester
///
/// Job-Harvest runs every search in the configuration file, writes one CSV
/// dataset per search, and derives a Markdown document from each dataset.
#[derive(Parser, Debug)]
#[command(name = "job-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient job-listing harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "export")]
    dry_run: bool,

    /// Regenerate Markdown documents from existing datasets and exit
    #[arg(long, conflicts_with = "dry_run")]
    export: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.export {
        handle_export(&config)
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_harvest=info,warn"),
            1 => EnvFilter::new("job_harvest=debug,info"),
            2 => EnvFilter::new("job_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Job-Harvest Dry Run ===\n");

    println!("Browser:");
    println!("  Backend: {:?}", config.browser.backend);
    println!("  Headless: {}", config.browser.headless);
    println!("  Page timeout: {}s", config.browser.page_timeout_secs);
    println!("  Detail timeout: {}s", config.browser.detail_timeout_secs);

    println!("\nCrawler:");
    println!("  Source: {}", config.crawler.base_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Duplicate threshold: {}", config.crawler.duplicate_threshold);
    println!("  Reloads per page: {}", config.crawler.max_reloads);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!(
        "  Backup directory: {}",
        config.output.fallback_directory().display()
    );

    println!("\nFilters:");
    println!("  Region: {}", config.filters.region);
    for tag in config.filters.file_tags() {
        println!("  - {}", tag);
    }

    println!("\nJobs ({}):", config.jobs.len());
    for job in &config.jobs {
        let mode = job.crawl_mode()?;
        let target = SearchTarget::new(&config.crawler, &job.query, &config.filters)
            .with_context(|| format!("Invalid search for job '{}'", job.query))?;
        println!("  - {} ({})", job.query, mode);
        println!(
            "    Dataset: {}",
            dataset_name(target.query(), &config.filters)
        );
        println!("    First page: {}", target.page_url(1));
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --export mode: rebuilds documents from existing datasets
fn handle_export(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Documents ===\n");

    for job in &config.jobs {
        let dataset = dataset_name(&job.query, &config.filters);
        let store = CsvStore::open(
            config.output.directory.clone(),
            config.output.fallback_directory(),
            &dataset,
        );

        let path = store
            .derive_document(job.query.trim())
            .with_context(|| format!("Failed to export dataset '{}'", dataset))?;
        println!("✓ {} -> {}", dataset, path.display());
    }

    Ok(())
}

/// Handles the main crawl operation: every job, one after another
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let stop = StopHandle::new();
    let interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            interrupt.stop();
        }
    });

    let reporter: Arc<dyn ProgressReporter> = Arc::new(LogReporter);
    let mut failed = 0;

    for (index, job) in config.jobs.iter().enumerate() {
        if stop.is_stopped() {
            tracing::warn!("Skipping {} remaining jobs", config.jobs.len() - index);
            break;
        }

        tracing::info!(
            "Job {}/{}: '{}'",
            index + 1,
            config.jobs.len(),
            job.query
        );

        match crawl(config, job, reporter.clone(), stop.clone()).await {
            Ok(outcome) => print_report(&outcome),
            Err(e) => {
                tracing::error!("Job '{}' failed: {}", job.query, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} jobs failed", failed, config.jobs.len());
    }
    Ok(())
}
