use crate::health::{Alert, SourceHealth};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The persisted cross-run state
///
/// Shape of the document on disk:
///
/// ```json
/// {
///   "last_run": {
///     "started_at": "...",
///     "finished_at": "...",
///     "sources": { "<id>": { "fetched": 0, "new": 0, ... } }
///   },
///   "alerts": [ { "source_id": "...", "type": "failure_streak", ... } ]
/// }
/// ```
///
/// Keys outside this shape are carried through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    #[serde(default)]
    pub last_run: LastRun,

    /// Append-only across runs
    #[serde(default)]
    pub alerts: Vec<Alert>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-source records of the most recent run each source took part in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastRun {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sources: BTreeMap<String, SourceHealth>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexSnapshot {
    pub fn source(&self, source_id: &str) -> Option<&SourceHealth> {
        self.last_run.sources.get(source_id)
    }
}
