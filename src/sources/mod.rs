//! Source registry
//!
//! The immutable catalog of sources for a run. Definitions are resolved once
//! from the configuration and shared read-only with every other component.

mod definition;
mod options;

pub use definition::{SourceDefinition, SourceKind};
pub use options::{ApiConfig, FieldMap, Provenance, RssConfig, DEFAULT_CONTENT_TYPE};

use crate::config::Config;
use std::sync::Arc;

/// Ordered, read-only collection of source definitions
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<SourceDefinition>>,
}

impl SourceRegistry {
    /// Builds the registry from the `[[source]]` entries of a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sources.iter().map(SourceDefinition::from_entry).collect())
    }

    pub fn new(sources: Vec<SourceDefinition>) -> Self {
        Self {
            sources: sources.into_iter().map(Arc::new).collect(),
        }
    }

    /// Looks up a source by id
    pub fn get(&self, id: &str) -> Option<&Arc<SourceDefinition>> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SourceDefinition>> {
        self.sources.iter()
    }

    pub fn as_slice(&self) -> &[Arc<SourceDefinition>] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns a registry restricted to the given ids, in catalog order
    ///
    /// Ids that are not in the catalog are ignored.
    pub fn select(&self, ids: &[String]) -> Self {
        Self {
            sources: self
                .sources
                .iter()
                .filter(|s| ids.iter().any(|id| id == &s.id))
                .cloned()
                .collect(),
        }
    }
}
