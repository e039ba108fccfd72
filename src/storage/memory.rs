use crate::storage::traits::{SeenStore, StorageResult};
use std::collections::HashMap;

/// In-process seen store, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    seen: HashMap<String, String>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl SeenStore for MemorySeenStore {
    fn is_new(&self, identity: &str) -> StorageResult<bool> {
        Ok(!self.seen.contains_key(identity))
    }

    fn mark_seen(&mut self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (source_id, identity) in entries {
            self.seen
                .entry(identity.to_string())
                .or_insert_with(|| source_id.to_string());
        }
        Ok(())
    }

    fn count_for_source(&self, source_id: &str) -> StorageResult<u64> {
        Ok(self.seen.values().filter(|s| *s == source_id).count() as u64)
    }
}
