//! Offline Archiver main entry point
//!
//! This is the command-line interface for mirroring a website into a local,
//! self-contained directory.

use anyhow::Context;
use clap::Parser;
use offline_archiver::config::{load_or_default, validate, Config};
use offline_archiver::output::{print_report, write_markdown_report};
use offline_archiver::url::{parse_seed, PathMapper, SiteScope};
use offline_archiver::Coordinator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline Archiver: mirror a website for offline browsing
///
/// Crawls every same-site page reachable from URL, saves pages and the
/// assets they use under OUTPUT_DIR, and rewrites references so the copy
/// works without network access.
#[derive(Parser, Debug)]
#[command(name = "offline-archiver")]
#[command(version)]
#[command(about = "Mirror a website for offline browsing", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Directory the archive is written to
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-request timeout in seconds (overrides the config file)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Treat URLs differing only in their query string as one resource
    #[arg(long)]
    ignore_query: bool,

    /// Stop after this many pages (0 = no limit)
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Also write a markdown report to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
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
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &cli)
    } else {
        handle_archive(config, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("offline_archiver=info,warn"),
            1 => EnvFilter::new("offline_archiver=debug,info"),
            2 => EnvFilter::new("offline_archiver=trace,debug"),
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

/// Loads the config file (or defaults) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let mut config = load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(timeout) = cli.timeout {
        config.crawler.timeout_secs = timeout;
        config.crawler.connect_timeout_secs = config.crawler.connect_timeout_secs.min(timeout);
    }
    if cli.ignore_query {
        config.crawler.ignore_query = true;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates input and shows what would be crawled
fn handle_dry_run(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let seed = parse_seed(&cli.url).with_context(|| format!("Invalid seed URL: {}", cli.url))?;
    let scope = SiteScope::from_url(&seed)
        .with_context(|| format!("Seed URL has no host: {}", cli.url))?;
    let mapper = PathMapper::from_config(config);

    println!("=== Offline Archiver Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("  Site scope: {}", scope.authority());
    println!("  Saved as: {}", mapper.page_path(&seed));

    println!("\nCrawler Configuration:");
    println!("  Timeout: {}s (connect {}s)", config.crawler.timeout_secs, config.crawler.connect_timeout_secs);
    println!("  Ignore query strings: {}", mapper.ignores_query());
    if config.crawler.max_pages > 0 {
        println!("  Page budget: {}", config.crawler.max_pages);
    } else {
        println!("  Page budget: unlimited");
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Root: {}", cli.output_dir.display());
    println!("  Index document: {}", config.archive.index_document);
    println!("  Bookmarks page: {}", config.archive.bookmarks_page);
    println!("  Bookmark button: {}", config.archive.inject_bookmark_button);

    println!("\n✓ Configuration is valid");
    println!("✓ Would archive {} into {}", scope.authority(), cli.output_dir.display());

    Ok(())
}

/// Handles the main archive operation
async fn handle_archive(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config, &cli.url, &cli.output_dir)
        .context("Cannot start the archive")?;

    let report = coordinator.run().await.context("Archive failed")?;

    if !cli.quiet {
        print_report(&report);
    }

    if let Some(path) = &cli.report {
        write_markdown_report(&report, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    if report.pages_saved == 0 {
        anyhow::bail!("No pages were saved from {}", report.seed);
    }

    Ok(())
}
