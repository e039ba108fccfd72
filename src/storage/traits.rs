//! Seen store trait and error types

use thiserror::Error;

/// Errors that can occur during seen store operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Records which item identities have already been delivered
///
/// The orchestrator only reads from the store while classifying a run.
/// Identities are written with `mark_seen` once the run's outputs are
/// persisted, so a run that fails before that point leaves the store as it
/// was and its items are offered again next time.
pub trait SeenStore: Send {
    /// Returns true if the identity has never been marked seen
    ///
    /// Has no side effects.
    fn is_new(&self, identity: &str) -> StorageResult<bool>;

    /// Records `(source_id, identity)` pairs as seen, all or nothing
    ///
    /// Identities already present keep their original owner.
    fn mark_seen(&mut self, entries: &[(&str, &str)]) -> StorageResult<()>;

    /// Number of identities recorded for a source
    fn count_for_source(&self, source_id: &str) -> StorageResult<u64>;
}
