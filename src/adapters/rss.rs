//! Adapter for RSS 2.0 feeds

use crate::adapters::{AdapterContext, AdapterError, FetchedBatch, RawItem};
use crate::fetch::{fetch_text, FetchError, FetchRequest};
use crate::sources::{Provenance, RssConfig};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use scraper::Html;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Fetches and normalizes the items of an `rss` source
///
/// A missing feed URL logs a warning and yields an empty batch. A body that
/// is not a parseable RSS document is a decode failure.
pub async fn fetch_items(
    ctx: &AdapterContext<'_>,
    source_id: &str,
    config: &RssConfig,
) -> Result<FetchedBatch, AdapterError> {
    let Some(feed_url) = config.feed_url.as_deref() else {
        tracing::warn!(source = source_id, "rss source missing feed_url");
        return Ok(FetchedBatch::default());
    };

    let request = FetchRequest::get(feed_url).user_agent(ctx.user_agent);
    let body = fetch_text(ctx.client, &request, ctx.policy).await?;

    let items = parse_feed(&body, &config.provenance).map_err(|e| FetchError::Decode {
        url: feed_url.to_string(),
        message: e.to_string(),
    })?;

    if items.is_empty() {
        tracing::debug!(source = source_id, "feed contains no items");
    }
    Ok(FetchedBatch::new(items))
}

/// Parses an RSS 2.0 document into items
pub fn parse_feed(xml: &str, provenance: &Provenance) -> Result<Vec<RawItem>, quick_xml::DeError> {
    let rss: Rss = from_str(xml)?;

    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| RawItem {
            title: non_empty(it.title),
            url: non_empty(it.link),
            published_at: non_empty(it.pub_date).map(|d| normalize_date(&d)),
            summary: it.description.as_deref().and_then(html_to_text),
            content_type: provenance.content_type.clone(),
            language: provenance.language.clone(),
            region: provenance.region.clone(),
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// RFC 2822 dates become RFC 3339 in UTC; anything else is kept verbatim
fn normalize_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

/// Strips markup and collapses whitespace
fn html_to_text(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let raw: String = fragment.root_element().text().collect();
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
