use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a recorded error description, in characters
pub const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// Outcome status of one source in one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    #[default]
    Ok,
    Error,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts and status for one source in one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRunResult {
    pub source_id: String,

    /// Items returned by the adapter
    pub fetched: u32,

    /// Items the seen store judged new
    pub new: u32,

    /// `fetched - new` plus payload elements the adapter dropped
    pub skipped: u32,

    pub status: SourceStatus,

    /// Present iff `status` is `Error`
    pub error_detail: Option<String>,
}

impl SourceRunResult {
    pub fn ok(source_id: impl Into<String>, fetched: u32, new: u32, dropped: u32) -> Self {
        Self {
            source_id: source_id.into(),
            fetched,
            new,
            skipped: fetched.saturating_sub(new).saturating_add(dropped),
            status: SourceStatus::Ok,
            error_detail: None,
        }
    }

    /// An error result with zero counts and a truncated description
    pub fn error(source_id: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self {
            source_id: source_id.into(),
            fetched: 0,
            new: 0,
            skipped: 0,
            status: SourceStatus::Error,
            error_detail: Some(truncate_detail(&detail.to_string())),
        }
    }
}

/// Cuts a description to `MAX_ERROR_DETAIL_CHARS` on a char boundary
pub fn truncate_detail(detail: &str) -> String {
    if detail.chars().count() <= MAX_ERROR_DETAIL_CHARS {
        return detail.to_string();
    }
    let mut out: String = detail.chars().take(MAX_ERROR_DETAIL_CHARS - 1).collect();
    out.push('…');
    out
}
