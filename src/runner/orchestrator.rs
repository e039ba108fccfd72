//! Run orchestration
//!
//! Dispatches every source to its adapter, isolates failures per source and
//! turns fetched batches into run results using the seen store. The store is
//! only read here; identities are recorded by the caller once the run's
//! outputs are persisted.

use crate::adapters::{api, rss, AdapterContext, AdapterError, FetchedBatch, RawItem};
use crate::config::FetchConfig;
use crate::fetch::{build_http_client, RetryPolicy};
use crate::runner::result::SourceRunResult;
use crate::sources::{SourceDefinition, SourceKind, SourceRegistry};
use crate::storage::{SeenStore, StorageError};
use crate::WatchError;
use reqwest::Client;
use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// An item judged new during a run, with the source it came from
#[derive(Debug, Clone)]
pub struct NewItem {
    pub source: Arc<SourceDefinition>,
    pub item: RawItem,
    /// Dedup key, recorded in the seen store after the run is persisted
    pub identity: String,
}

impl NewItem {
    pub fn seen_entry(&self) -> (&str, &str) {
        (self.source.id.as_str(), self.identity.as_str())
    }
}

/// Everything a run produced before it is folded into the index
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// One result per source, in catalog order
    pub results: Vec<SourceRunResult>,
    pub new_items: Vec<NewItem>,
}

/// Executes one pass over a registry
pub struct Orchestrator {
    client: Client,
    user_agent: String,
    policy: RetryPolicy,
    concurrency: usize,
}

impl Orchestrator {
    /// Creates an orchestrator with a fresh HTTP client
    pub fn new(config: &FetchConfig) -> Result<Self, WatchError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(
            client,
            config.user_agent.clone(),
            config.retry_policy(),
            config.max_concurrent_sources,
        ))
    }

    pub fn with_client(
        client: Client,
        user_agent: String,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            user_agent,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetches every source and classifies the items it returned
    ///
    /// Never fails: each source's problems end up in its own result.
    pub async fn run(&self, registry: &SourceRegistry, seen: &mut dyn SeenStore) -> RunOutcome {
        let client = self.client.clone();
        let user_agent: Arc<str> = Arc::from(self.user_agent.as_str());
        let policy = Arc::new(self.policy.clone());

        let fetched = collect_batches(registry.as_slice(), self.concurrency, move |source| {
            let client = client.clone();
            let user_agent = user_agent.clone();
            let policy = policy.clone();
            async move {
                let ctx = AdapterContext {
                    client: &client,
                    user_agent: &user_agent,
                    policy: &policy,
                };
                dispatch(&ctx, &source).await
            }
        })
        .await;

        classify(registry.as_slice(), fetched, &*seen)
    }
}

/// Runs the adapter matching a source's kind
pub async fn dispatch(
    ctx: &AdapterContext<'_>,
    source: &SourceDefinition,
) -> Result<FetchedBatch, AdapterError> {
    match &source.kind {
        SourceKind::Api(config) => api::fetch_items(ctx, &source.id, config).await,
        SourceKind::Rss(config) => rss::fetch_items(ctx, &source.id, config).await,
        SourceKind::Unknown(kind) => Err(AdapterError::UnknownType(kind.clone())),
        SourceKind::Misconfigured { reason, .. } => {
            Err(AdapterError::Misconfigured(reason.clone()))
        }
    }
}

/// Runs `fetch` for every source on its own task, at most `concurrency` at a time
///
/// Results come back in the order of `sources`. An adapter error or a
/// panicking task becomes an error description for that source only.
pub(crate) async fn collect_batches<F, Fut>(
    sources: &[Arc<SourceDefinition>],
    concurrency: usize,
    fetch: F,
) -> Vec<Result<FetchedBatch, String>>
where
    F: Fn(Arc<SourceDefinition>) -> Fut,
    Fut: Future<Output = Result<FetchedBatch, AdapterError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let semaphore = semaphore.clone();
            let task = fetch(source.clone());
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                task.await
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source, handle) in sources.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(Ok(batch)) => Ok(batch),
            Ok(Err(AdapterError::UnknownType(kind))) => {
                tracing::error!(source = %source.id, kind = %kind, "no adapter for source type");
                Err(AdapterError::UnknownType(kind).to_string())
            }
            Ok(Err(AdapterError::Fetch(fetch))) => {
                tracing::warn!(
                    source = %source.id,
                    url = %fetch.url(),
                    attempts = fetch.attempts(),
                    kind = ?fetch.kind(),
                    "fetch gave up"
                );
                Err(AdapterError::Fetch(fetch).to_string())
            }
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_err) => {
                let detail = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                tracing::error!(source = %source.id, error = %detail, "adapter task aborted");
                Err(format!("internal error: {}", detail))
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "adapter panicked".to_string()
    }
}

/// Consults the seen store for each item, in adapter order, and builds results
///
/// An identity counts as new at most once per run, whichever source offers
/// it first.
fn classify(
    sources: &[Arc<SourceDefinition>],
    fetched: Vec<Result<FetchedBatch, String>>,
    seen: &dyn SeenStore,
) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    let mut claimed = HashSet::new();

    for (source, batch) in sources.iter().zip(fetched) {
        let result = match batch {
            Err(detail) => {
                tracing::error!(source = %source.id, error = %detail, "source failed");
                SourceRunResult::error(&source.id, detail)
            }
            Ok(batch) => match count_new(source, batch, seen, &claimed) {
                Ok((result, mut new_items)) => {
                    tracing::info!(
                        source = %source.id,
                        fetched = result.fetched,
                        new = result.new,
                        skipped = result.skipped,
                        "source done"
                    );
                    claimed.extend(new_items.iter().map(|n| n.identity.clone()));
                    outcome.new_items.append(&mut new_items);
                    result
                }
                Err(err) => {
                    tracing::error!(source = %source.id, error = %err, "seen store failed");
                    SourceRunResult::error(&source.id, format!("seen store failure: {}", err))
                }
            },
        };
        outcome.results.push(result);
    }

    outcome
}

fn count_new(
    source: &Arc<SourceDefinition>,
    batch: FetchedBatch,
    seen: &dyn SeenStore,
    claimed: &HashSet<String>,
) -> Result<(SourceRunResult, Vec<NewItem>), StorageError> {
    let fetched = to_count(batch.items.len());
    let dropped = to_count(batch.dropped);

    let mut batch_ids = HashSet::new();
    let mut new_items = Vec::new();
    for item in batch.items {
        let identity = item.identity(&source.id);
        if claimed.contains(&identity) || batch_ids.contains(&identity) {
            continue;
        }
        if seen.is_new(&identity)? {
            batch_ids.insert(identity.clone());
            new_items.push(NewItem {
                source: source.clone(),
                item,
                identity,
            });
        }
    }

    let result = SourceRunResult::ok(&source.id, fetched, to_count(new_items.len()), dropped);
    Ok((result, new_items))
}

fn to_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
