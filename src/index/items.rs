//! JSON Lines sink for newly seen items

use crate::index::{IndexError, IndexResult};
use crate::runner::NewItem;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One line of the items file
#[derive(Debug, Serialize)]
struct ItemRecord<'a> {
    source_id: &'a str,
    source_name: &'a str,
    title: Option<&'a str>,
    url: Option<&'a str>,
    published_at: Option<&'a str>,
    summary: Option<&'a str>,
    content_type: &'a str,
    language: Option<&'a str>,
    region: Option<&'a str>,
    fetched_at: DateTime<Utc>,
}

/// Appends new items to a JSONL file, one object per line
#[derive(Debug, Clone)]
pub struct ItemSink {
    path: PathBuf,
}

impl ItemSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of lines written
    pub fn append(&self, items: &[NewItem], fetched_at: DateTime<Utc>) -> IndexResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        for new_item in items {
            let item = &new_item.item;
            let record = ItemRecord {
                source_id: &new_item.source.id,
                source_name: &new_item.source.name,
                title: item.title.as_deref(),
                url: item.url.as_deref(),
                published_at: item.published_at.as_deref(),
                summary: item.summary.as_deref(),
                content_type: &item.content_type,
                language: item.language.as_deref(),
                region: item.region.as_deref(),
                fetched_at,
            };
            serde_json::to_writer(&mut writer, &record).map_err(IndexError::Serialize)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        Ok(items.len())
    }
}
