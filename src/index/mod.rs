//! Persisted index of per-source health and alerts
//!
//! The index is a single JSON document read at the start of a run and
//! written once at the end. New items can additionally be appended to a
//! JSON Lines file.

mod items;
mod snapshot;
mod store;

pub use items::ItemSink;
pub use snapshot::{IndexSnapshot, LastRun};
pub use store::IndexStore;

use thiserror::Error;

/// Errors that can occur while reading or writing the index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index file {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize index: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
