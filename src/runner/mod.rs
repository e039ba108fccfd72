//! Runner module for executing one ingestion pass
//!
//! This module ties the pieces of a run together:
//! - Dispatching every source to its adapter with bounded concurrency
//! - Deduplicating fetched items against the seen store
//! - Folding run results into the persisted health records
//! - Writing the index and the new-item sink

mod orchestrator;
mod result;

pub use orchestrator::{dispatch, NewItem, Orchestrator, RunOutcome};
pub use result::{truncate_detail, SourceRunResult, SourceStatus, MAX_ERROR_DETAIL_CHARS};

use crate::config::Config;
use crate::health::{Alert, HealthTracker};
use crate::index::{ItemSink, IndexStore};
use crate::sources::SourceRegistry;
use crate::storage::SeenStore;
use crate::WatchError;
use chrono::{DateTime, Utc};

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// One result per source of the registry, in catalog order
    pub results: Vec<SourceRunResult>,

    /// Alerts emitted by this run only
    pub alerts: Vec<Alert>,

    /// Number of items judged new across all sources
    pub new_items: usize,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_error()).count()
    }
}

/// Runs every source in `registry` once and persists the outcome
///
/// The index is read before any fetching so an unreadable index aborts the
/// run early. It is read again after fetching and written exactly once,
/// so health state is always derived from the last persisted snapshot.
///
/// New identities are recorded in `seen` only after the index and the items
/// file are written. If either write fails the store is left alone and the
/// same items are reported as new by the next run.
///
/// # Arguments
///
/// * `config` - Loaded configuration (fetch policy, thresholds, output paths)
/// * `registry` - Sources to run; sources absent from it keep their records
/// * `seen` - Deduplication store consulted once per fetched item and
///   updated at the end of a successful run
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed, whatever the individual source outcomes
/// * `Err(WatchError)` - The index, items file or seen store could not be
///   written, the index could not be read, or the HTTP client could not be built
pub async fn run_once(
    config: &Config,
    registry: &SourceRegistry,
    seen: &mut dyn SeenStore,
) -> Result<RunReport, WatchError> {
    let store = IndexStore::new(&config.output.index_path);
    store.load()?;

    let orchestrator = Orchestrator::new(&config.fetch)?;
    let started_at = Utc::now();

    tracing::info!(sources = registry.len(), "run started");
    let outcome = orchestrator.run(registry, seen).await;
    let finished_at = Utc::now();

    let mut snapshot = store.load()?;
    let tracker = HealthTracker::new(config.health.thresholds());
    let alerts = tracker.fold(&mut snapshot.last_run.sources, &outcome.results, finished_at);

    snapshot.last_run.started_at = Some(started_at);
    snapshot.last_run.finished_at = Some(finished_at);
    snapshot.alerts.extend(alerts.iter().cloned());
    store.save(&snapshot)?;

    if let Some(items_path) = config.output.items_path.as_deref() {
        let written = ItemSink::new(items_path).append(&outcome.new_items, finished_at)?;
        tracing::debug!(path = items_path, written, "new items appended");
    }

    let entries: Vec<(&str, &str)> = outcome.new_items.iter().map(NewItem::seen_entry).collect();
    seen.mark_seen(&entries)?;

    let report = RunReport {
        started_at,
        finished_at,
        new_items: outcome.new_items.len(),
        results: outcome.results,
        alerts,
    };

    tracing::info!(
        sources = report.results.len(),
        failed = report.failed_sources(),
        new = report.new_items,
        alerts = report.alerts.len(),
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "run finished"
    );

    Ok(report)
}
