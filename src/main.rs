//! Payer-Scout main entry point
//!
//! This is the command-line interface for the Payer-Scout document crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use payer_scout::config::{
    load_config_with_hash, load_payer_csv, validate, Config, FetcherKind, PayerEntry, Priority,
};
use payer_scout::crawler::{crawl_registry, ConfiguredFetchers, HttpProbe, RunSettings};
use payer_scout::output::{
    generate_markdown_summary, print_summary, summarize, write_results_jsonl,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Payer-Scout: regional discovery of payer provider documents
///
/// Payer-Scout crawls healthcare-payer websites breadth-first from a few
/// seed URLs per organization and reports the provider documents it finds,
/// tagged with the US states they appear to cover.
#[derive(Parser, Debug)]
#[command(name = "payer-scout")]
#[command(version)]
#[command(about = "Regional discovery of payer provider documents", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (the payer registry)
    #[arg(value_name = "CONFIG", required_unless_present_any = ["org", "payers_csv"])]
    config: Option<PathBuf>,

    /// Read the payer list from a CSV registry instead of the config's [[payer]] tables
    #[arg(long, value_name = "FILE", conflicts_with = "org")]
    payers_csv: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Only crawl the named registry entries (repeatable)
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,

    /// Only crawl payers of this priority tier
    #[arg(long, value_enum, conflicts_with = "org")]
    priority: Option<PriorityArg>,

    /// Crawl a single organization instead of the registry
    #[arg(long, requires = "domain", conflicts_with = "only")]
    org: Option<String>,

    /// Base domain of the --org organization
    #[arg(long, requires = "org")]
    domain: Option<String>,

    /// Known provider portal of the --org organization
    #[arg(long, requires = "org", value_name = "URL")]
    portal: Option<String>,

    /// Override the maximum link depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override the per-organization URL budget
    #[arg(long)]
    max_urls: Option<usize>,

    /// Override the per-organization time budget (seconds)
    #[arg(long, value_name = "SECS")]
    max_duration: Option<u64>,

    /// Page renderer
    #[arg(long, value_enum)]
    fetcher: Option<FetcherArg>,

    /// Where to write the JSON Lines results
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FetcherArg {
    Browser,
    Http,
}

impl From<FetcherArg> for FetcherKind {
    fn from(arg: FetcherArg) -> Self {
        match arg {
            FetcherArg::Browser => FetcherKind::Browser,
            FetcherArg::Http => FetcherKind::Http,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(path) = &cli.payers_csv {
        tracing::info!("Loading payer registry from: {}", path.display());
        config.payers = load_payer_csv(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if config.payers.is_empty() {
        bail!("nothing to crawl: the registry is empty or the --only/--priority filters matched no payer");
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("payer_scout=info,warn"),
            1 => EnvFilter::new("payer_scout=debug,info"),
            2 => EnvFilter::new("payer_scout=trace,debug"),
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

/// Folds command-line flags into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let (Some(org), Some(domain)) = (&cli.org, &cli.domain) {
        config.payers = vec![PayerEntry {
            name: org.clone(),
            base_domain: domain.clone(),
            known_portal: cli.portal.clone(),
            seeds: Vec::new(),
            priority: Priority::default(),
        }];
    }

    if let Some(priority) = cli.priority {
        let priority = Priority::from(priority);
        config.payers.retain(|p| p.priority == priority);
    }

    if !cli.only.is_empty() {
        config
            .payers
            .retain(|p| cli.only.iter().any(|name| name.eq_ignore_ascii_case(&p.name)));
    }

    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(urls) = cli.max_urls {
        config.crawler.max_urls = urls;
    }
    if let Some(secs) = cli.max_duration {
        config.crawler.max_duration_secs = secs;
    }
    if let Some(fetcher) = cli.fetcher {
        config.crawler.fetcher = fetcher.into();
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.display().to_string();
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Payer-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max URLs per organization: {}", config.crawler.max_urls);
    println!("  Max duration: {}s", config.crawler.max_duration_secs);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Page timeout: {}s", config.crawler.page_timeout_secs);
    println!("  Fetcher: {:?}", config.crawler.fetcher);
    println!(
        "  Concurrent sessions: {}",
        config.crawler.max_concurrent_sessions
    );

    println!("\nDiscovery:");
    println!("  Template probing: {}", config.discovery.enabled);
    println!("  Homepage scan: {}", config.discovery.scan_homepage);
    println!("  Max seeds: {}", config.discovery.max_seeds);
    println!("  State candidates: {}", config.discovery.state_candidates);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nPayers ({}):", config.payers.len());
    for payer in &config.payers {
        println!(
            "  - {} ({}, priority {})",
            payer.name, payer.base_domain, payer.priority
        );
        if let Some(portal) = &payer.known_portal {
            println!("    * portal: {}", portal);
        }
        for seed in &payer.seeds {
            println!("    * seed: {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, aborting crawl sessions");
            interrupt.cancel();
        }
    });

    let probe = if config.discovery.enabled {
        let timeout = Duration::from_secs(config.discovery.probe_timeout_secs);
        Some(Arc::new(
            HttpProbe::new(&config.user_agent, timeout).context("failed to build probe client")?,
        ))
    } else {
        None
    };

    tracing::info!(
        "Crawling {} payer(s) with the {:?} fetcher",
        config.payers.len(),
        config.crawler.fetcher
    );

    let outcomes = crawl_registry(
        config.payers.clone(),
        RunSettings::from(&config),
        Arc::new(ConfiguredFetchers::from(&config)),
        probe,
        cancel,
    )
    .await;

    let mut results = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!("{}: crawl failed: {}", outcome.organization, e),
        }
    }

    if results.is_empty() {
        bail!("no organization could be crawled");
    }

    let results_path = Path::new(&config.output.results_path);
    write_results_jsonl(&results, results_path)
        .with_context(|| format!("failed to write {}", results_path.display()))?;
    tracing::info!("Results written to {}", results_path.display());

    let reports: Vec<_> = results.iter().map(|r| r.coverage.clone()).collect();
    let summary = summarize(&reports);
    print_summary(&summary);

    let summary_path = Path::new(&config.output.summary_path);
    generate_markdown_summary(&summary, summary_path)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    tracing::info!("Summary written to {}", summary_path.display());

    Ok(())
}
