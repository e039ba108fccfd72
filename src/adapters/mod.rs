//! Source adapters
//!
//! Each source kind has an adapter that turns a definition plus a live fetch
//! into normalized [`RawItem`]s. All adapters share the resilient fetcher and
//! follow the same shape:
//! 1. Fetch the payload
//! 2. Extract the item list (payload shape problems yield no items)
//! 3. Map fields onto the canonical item
//! 4. Stamp static provenance tags

pub mod api;
mod extract;
pub mod rss;

pub use extract::{extract_path, map_record, value_to_text};

use crate::fetch::{FetchError, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors an adapter can report for a source
///
/// Payload shape problems are not errors; they produce an empty batch.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unknown source type")]
    UnknownType(String),

    #[error("invalid source config: {0}")]
    Misconfigured(String),
}

/// Shared inputs for adapter calls during one run
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext<'a> {
    pub client: &'a Client,
    pub user_agent: &'a str,
    pub policy: &'a RetryPolicy,
}

/// A normalized content item
///
/// Every descriptive field is optional; sources omit them freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub summary: Option<String>,
    pub content_type: String,
    pub language: Option<String>,
    pub region: Option<String>,
}

impl RawItem {
    /// Stable identity used for deduplication
    ///
    /// The trimmed URL when present, otherwise a SHA-256 digest of the
    /// source id and the item's descriptive fields.
    pub fn identity(&self, source_id: &str) -> String {
        if let Some(url) = self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return url.to_string();
        }

        let mut hasher = Sha256::new();
        for part in [
            Some(source_id),
            self.title.as_deref(),
            self.published_at.as_deref(),
            self.summary.as_deref(),
        ] {
            hasher.update(part.unwrap_or_default().as_bytes());
            hasher.update(b"\n");
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

/// Items produced by one adapter call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedBatch {
    pub items: Vec<RawItem>,

    /// Payload elements that could not be turned into items
    pub dropped: usize,
}

impl FetchedBatch {
    pub fn new(items: Vec<RawItem>) -> Self {
        Self { items, dropped: 0 }
    }
}
