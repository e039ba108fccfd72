//! Adapter for generic HTTP/JSON API sources

use crate::adapters::extract::{extract_path, map_record};
use crate::adapters::{AdapterContext, AdapterError, FetchedBatch};
use crate::fetch::{fetch_json, FetchRequest};
use crate::sources::ApiConfig;
use serde_json::Value;

/// Fetches and normalizes the items of an `api` source
///
/// A missing endpoint or an unexpected payload shape logs a warning and
/// yields an empty batch. Only a failed fetch is an error.
pub async fn fetch_items(
    ctx: &AdapterContext<'_>,
    source_id: &str,
    config: &ApiConfig,
) -> Result<FetchedBatch, AdapterError> {
    let Some(endpoint) = config.endpoint.as_deref() else {
        tracing::warn!(source = source_id, "api source missing endpoint");
        return Ok(FetchedBatch::default());
    };

    let params = resolve_params(config, |name| std::env::var(name).ok());
    let request = FetchRequest::get(endpoint)
        .user_agent(ctx.user_agent)
        .params(params);

    let payload = fetch_json(ctx.client, &request, ctx.policy).await?;
    Ok(items_from_payload(source_id, config, &payload))
}

/// Merges static params with credentials from the environment
///
/// Each `auth_env` entry overwrites its param only when the variable is set
/// and non-empty; otherwise the param is left as configured (or absent).
pub fn resolve_params<F>(config: &ApiConfig, lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = config.params.clone();
    for (param, var) in &config.auth_env {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            resolved.insert(param.clone(), value);
        }
    }
    resolved.into_iter().collect()
}

/// Turns a decoded payload into items
///
/// Total over any JSON input: a missing path or a non-list value gives an
/// empty batch, and non-object list elements are counted as dropped.
pub fn items_from_payload(source_id: &str, config: &ApiConfig, payload: &Value) -> FetchedBatch {
    let extracted = match config.items_path.as_deref() {
        Some(path) => extract_path(payload, path),
        None => Some(payload),
    };

    let Some(Value::Array(elements)) = extracted else {
        tracing::warn!(
            source = source_id,
            items_path = config.items_path.as_deref().unwrap_or(""),
            "api source returned unexpected payload"
        );
        return FetchedBatch::default();
    };

    let mut batch = FetchedBatch::default();
    for element in elements {
        match element {
            Value::Object(record) => {
                batch
                    .items
                    .push(map_record(record, &config.field_map, &config.provenance));
            }
            _ => batch.dropped += 1,
        }
    }

    if batch.dropped > 0 {
        tracing::debug!(source = source_id, dropped = batch.dropped, "dropped non-object elements");
    }
    batch
}
