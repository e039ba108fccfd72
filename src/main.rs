//! Source-Watch main entry point
//!
//! This is the command-line interface for the Source-Watch ingestion runner.

use anyhow::Context;
use clap::Parser;
use source_watch::config::{load_config_with_hash, Config};
use source_watch::index::{IndexSnapshot, IndexStore};
use source_watch::runner::run_once;
use source_watch::sources::{SourceKind, SourceRegistry};
use source_watch::storage::{open_seen_store, SeenStore, SqliteSeenStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Source-Watch: content ingestion with per-source health tracking
///
/// Pulls items from every configured source once, records which items are
/// new, and raises alerts for sources that keep failing or stop producing.
#[derive(Parser, Debug)]
#[command(name = "source-watch")]
#[command(version)]
#[command(about = "Resilient content ingestion and source health tracking", long_about = None)]
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

    /// Validate config and list the sources without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Only run the sources with these ids
    #[arg(long, value_name = "ID", num_args = 1..)]
    only: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let mut registry = SourceRegistry::from_config(&config);
    if !cli.only.is_empty() {
        for id in &cli.only {
            if registry.get(id).is_none() {
                tracing::warn!(source = %id, "--only names a source that is not in the catalog");
            }
        }
        registry = registry.select(&cli.only);
    }

    if cli.dry_run {
        handle_dry_run(&config, &registry);
        return Ok(());
    }

    handle_run(&config, &registry).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags when it is set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("source_watch=info,warn"),
                1 => EnvFilter::new("source_watch=debug,info"),
                2 => EnvFilter::new("source_watch=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved catalog and its last known state
///
/// Nothing is fetched or written. The seen store is only opened if it
/// already exists.
fn handle_dry_run(config: &Config, registry: &SourceRegistry) {
    println!("=== Source-Watch Dry Run ===\n");

    println!("Fetch Configuration:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms x{})",
        config.fetch.max_retries, config.fetch.retry_backoff_ms, config.fetch.backoff_factor
    );
    println!("  Concurrent sources: {}", config.fetch.max_concurrent_sources);

    println!("\nHealth Thresholds:");
    println!("  Failure streak: {}", config.health.failure_threshold);
    println!("  Zero-new streak: {}", config.health.zero_new_threshold);

    println!("\nOutput:");
    println!("  Index: {}", config.output.index_path);
    println!("  Seen store: {}", config.output.seen_db_path);
    if let Some(items) = &config.output.items_path {
        println!("  Items: {}", items);
    }

    let snapshot = match IndexStore::new(&config.output.index_path).load() {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!("Index is unreadable, a run would abort: {}", e);
            None
        }
    };

    let seen_path = Path::new(&config.output.seen_db_path);
    let seen = if seen_path.exists() {
        match SqliteSeenStore::new(seen_path) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!("Could not open seen store: {}", e);
                None
            }
        }
    } else {
        None
    };

    if let Some(store) = &seen {
        match store.count_total() {
            Ok(total) => println!("  Seen identities: {}", total),
            Err(e) => tracing::warn!("Could not count seen identities: {}", e),
        }
    }

    println!("\nSources ({}):", registry.len());
    for source in registry.iter() {
        match &source.kind {
            SourceKind::Api(api) => println!(
                "  - {} [api] {}",
                source.id,
                api.endpoint.as_deref().unwrap_or("(no endpoint)")
            ),
            SourceKind::Rss(rss) => println!(
                "  - {} [rss] {}",
                source.id,
                rss.feed_url.as_deref().unwrap_or("(no feed url)")
            ),
            SourceKind::Unknown(kind) => {
                println!("  - {} [{}] unknown type, will fail", source.id, kind)
            }
            SourceKind::Misconfigured { kind, reason } => {
                println!("  - {} [{}] misconfigured: {}", source.id, kind, reason)
            }
        }
        print_source_state(&source.id, snapshot.as_ref(), seen.as_ref());
    }

    let runnable = registry.iter().filter(|s| s.kind.is_runnable()).count();
    println!("\n✓ Configuration is valid");
    println!("✓ Would run {} of {} sources", runnable, registry.len());
}

fn print_source_state(id: &str, snapshot: Option<&IndexSnapshot>, seen: Option<&SqliteSeenStore>) {
    if let Some(health) = snapshot.and_then(|s| s.source(id)) {
        let last_run = health
            .last_run
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "      last: {} at {} (failure streak {}, zero-new streak {})",
            health.status, last_run, health.failure_streak, health.zero_new_streak
        );
    }

    if let Some(store) = seen {
        if let Ok(count) = store.count_for_source(id) {
            println!("      seen items: {}", count);
        }
    }
}

/// Handles the main run
async fn handle_run(config: &Config, registry: &SourceRegistry) -> anyhow::Result<()> {
    let seen_path = Path::new(&config.output.seen_db_path);
    let mut seen = open_seen_store(seen_path)
        .with_context(|| format!("failed to open seen store {}", seen_path.display()))?;

    let report = run_once(config, registry, &mut seen)
        .await
        .with_context(|| format!("run failed (index {})", config.output.index_path))?;

    for alert in &report.alerts {
        println!("ALERT {} {}: {}", alert.source_id, alert.kind, alert.message);
    }

    tracing::info!(
        "Run completed: {} sources, {} failed, {} new items",
        report.results.len(),
        report.failed_sources(),
        report.new_items
    );

    Ok(())
}
