//! Storage module for the seen-item store
//!
//! The orchestrator asks this store whether each fetched item is new. The
//! store only records identities; item content lives in the item sink.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemorySeenStore;
pub use sqlite::SqliteSeenStore;
pub use traits::{SeenStore, StorageError, StorageResult};

use std::path::Path;

/// Opens the on-disk seen store
pub fn open_seen_store(path: &Path) -> StorageResult<SqliteSeenStore> {
    SqliteSeenStore::new(path)
}
