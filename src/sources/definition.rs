use crate::config::SourceEntry;
use crate::sources::options::{ApiConfig, RssConfig};

/// One external provider of content, resolved from a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDefinition {
    /// Stable identity across runs
    pub id: String,
    pub name: String,
    pub homepage: Option<String>,
    pub notes: Option<String>,
    pub kind: SourceKind,
}

/// Adapter selection, carrying the typed options of each kind
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Generic HTTP/JSON API
    Api(ApiConfig),

    /// RSS 2.0 feed
    Rss(RssConfig),

    /// Catalog `type` with no adapter
    Unknown(String),

    /// Known `type` whose options could not be converted
    Misconfigured { kind: String, reason: String },
}

impl SourceKind {
    /// Returns the catalog `type` string for this kind
    pub fn type_name(&self) -> &str {
        match self {
            Self::Api(_) => "api",
            Self::Rss(_) => "rss",
            Self::Unknown(kind) => kind,
            Self::Misconfigured { kind, .. } => kind,
        }
    }

    /// Returns true if an adapter can run for this kind
    pub fn is_runnable(&self) -> bool {
        matches!(self, Self::Api(_) | Self::Rss(_))
    }
}

impl SourceDefinition {
    /// Resolves a catalog entry into a definition
    ///
    /// This never fails: an unknown type or bad options are kept on the
    /// definition so the run can report them as that source's error.
    pub fn from_entry(entry: &SourceEntry) -> Self {
        let kind = match entry.kind.as_str() {
            "api" => match ApiConfig::from_table(&entry.config) {
                Ok(config) => SourceKind::Api(config),
                Err(reason) => misconfigured(entry, reason),
            },
            "rss" => match RssConfig::from_table(&entry.config) {
                Ok(config) => SourceKind::Rss(config),
                Err(reason) => misconfigured(entry, reason),
            },
            other => {
                tracing::warn!(source = %entry.id, kind = other, "unknown source type");
                SourceKind::Unknown(other.to_string())
            }
        };

        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            homepage: entry.homepage.clone(),
            notes: entry.notes.clone(),
            kind,
        }
    }
}

fn misconfigured(entry: &SourceEntry, reason: String) -> SourceKind {
    tracing::warn!(source = %entry.id, kind = %entry.kind, %reason, "invalid source options");
    SourceKind::Misconfigured {
        kind: entry.kind.clone(),
        reason,
    }
}
