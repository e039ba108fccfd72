use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which streak crossed its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    FailureStreak,
    ZeroNewStreak,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailureStreak => "failure_streak",
            Self::ZeroNewStreak => "zero_new_streak",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time notice that a source's streak crossed a threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub source_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub streak: u32,
    #[serde(default)]
    pub message: String,
    pub last_run: DateTime<Utc>,
    /// Error of the triggering run; failure alerts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Alert {
    pub fn failure(
        source_id: &str,
        streak: u32,
        last_run: DateTime<Utc>,
        last_error: Option<String>,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            kind: AlertKind::FailureStreak,
            streak,
            message: format!("source failed {} consecutive runs", streak),
            last_run,
            last_error,
        }
    }

    pub fn zero_new(source_id: &str, streak: u32, last_run: DateTime<Utc>) -> Self {
        Self {
            source_id: source_id.to_string(),
            kind: AlertKind::ZeroNewStreak,
            streak,
            message: format!("no new items in {} consecutive runs", streak),
            last_run,
            last_error: None,
        }
    }
}
