//! Health tracking for sources across runs
//!
//! This module turns per-run counts into streak state and alerts.
//!
//! # Components
//!
//! - `SourceHealth`: persisted record of one source (last counts and streaks)
//! - `apply_run`: pure transition from a prior record and a run result
//! - `HealthTracker`: applies a whole run to the persisted records
//! - `Alert`: emitted when a streak crosses its threshold

mod alert;
mod tracker;

pub use alert::{Alert, AlertKind};
pub use tracker::{apply_run, HealthTracker, SourceHealth, Thresholds};
