//! Source-Watch: a resilient content ingestion and source health tracker
//!
//! This crate pulls content items from a catalog of heterogeneous sources
//! (RSS feeds, HTTP/JSON APIs), normalizes them into a common item shape and
//! tracks per-source health across runs so that failing or silent sources
//! raise alerts.

pub mod adapters;
pub mod config;
pub mod fetch;
pub mod health;
pub mod index;
pub mod runner;
pub mod sources;
pub mod storage;

use thiserror::Error;

/// Main error type for Source-Watch operations
///
/// Only run-level failures surface through this type. Individual source
/// failures are recorded in their run results and never abort a run.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Seen store error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Source-Watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapters::{FetchedBatch, RawItem};
pub use config::Config;
pub use health::{Alert, AlertKind, SourceHealth, Thresholds};
pub use index::{IndexSnapshot, IndexStore};
pub use runner::{run_once, RunReport, SourceRunResult, SourceStatus};
pub use sources::{SourceDefinition, SourceKind, SourceRegistry};
