use crate::health::alert::Alert;
use crate::runner::{SourceRunResult, SourceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Streak values at which alerts fire
///
/// A threshold of 0 disables that alert type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub failure: u32,
    pub zero_new: u32,
}

/// Persisted health record of one source
///
/// Every field defaults when absent so records written by older versions or
/// other tools still load. Keys this type does not know are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceHealth {
    #[serde(default)]
    pub fetched: u32,
    #[serde(default)]
    pub new: u32,
    #[serde(default)]
    pub skipped: u32,
    #[serde(default)]
    pub status: SourceStatus,
    /// Consecutive runs ending in error
    #[serde(default)]
    pub failure_streak: u32,
    /// Consecutive runs without new items, whatever their status
    #[serde(default)]
    pub zero_new_streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Folds one run result into a source's prior record
///
/// | Event | failure_streak | zero_new_streak |
/// |-------|----------------|-----------------|
/// | ok, new > 0 | 0 | 0 |
/// | ok, new == 0 | 0 | prior + 1 |
/// | error | prior + 1 | prior + 1 |
///
/// An alert fires when a streak moves from below its threshold to at or
/// above it, so each upward crossing alerts exactly once. One error run can
/// cross both thresholds and return two alerts.
pub fn apply_run(
    prior: Option<&SourceHealth>,
    result: &SourceRunResult,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> (SourceHealth, Vec<Alert>) {
    let prior_failure = prior.map_or(0, |p| p.failure_streak);
    let prior_zero_new = prior.map_or(0, |p| p.zero_new_streak);

    let failure_streak = match result.status {
        SourceStatus::Error => prior_failure.saturating_add(1),
        SourceStatus::Ok => 0,
    };
    let zero_new_streak = if result.status == SourceStatus::Ok && result.new > 0 {
        0
    } else {
        prior_zero_new.saturating_add(1)
    };

    let last_error = match result.status {
        SourceStatus::Error => result.error_detail.clone(),
        SourceStatus::Ok => None,
    };

    let next = SourceHealth {
        fetched: result.fetched,
        new: result.new,
        skipped: result.skipped,
        status: result.status,
        failure_streak,
        zero_new_streak,
        last_run: Some(now),
        last_error: last_error.clone(),
        extra: prior.map(|p| p.extra.clone()).unwrap_or_default(),
    };

    let mut alerts = Vec::new();
    if crossed(prior_failure, failure_streak, thresholds.failure) {
        alerts.push(Alert::failure(&result.source_id, failure_streak, now, last_error));
    }
    if crossed(prior_zero_new, zero_new_streak, thresholds.zero_new) {
        alerts.push(Alert::zero_new(&result.source_id, zero_new_streak, now));
    }

    (next, alerts)
}

fn crossed(prior: u32, next: u32, threshold: u32) -> bool {
    threshold > 0 && prior < threshold && next >= threshold
}

/// Applies a whole run's results to the persisted per-source records
#[derive(Debug, Clone)]
pub struct HealthTracker {
    thresholds: Thresholds,
}

impl HealthTracker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Updates `records` in place and returns the alerts emitted, in result order
    ///
    /// Records of sources absent from `results` are left untouched.
    pub fn fold(
        &self,
        records: &mut BTreeMap<String, SourceHealth>,
        results: &[SourceRunResult],
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for result in results {
            let (next, mut emitted) =
                apply_run(records.get(&result.source_id), result, &self.thresholds, now);

            for alert in &emitted {
                tracing::warn!(
                    source = %alert.source_id,
                    alert = %alert.kind,
                    streak = alert.streak,
                    "{}",
                    alert.message
                );
            }

            records.insert(result.source_id.clone(), next);
            alerts.append(&mut emitted);
        }

        alerts
    }
}
