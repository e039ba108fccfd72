//! Typed per-kind source options
//!
//! The catalog stores source options as an open table. Each adapter kind
//! reads only the keys it recognizes, with the defaults listed on the
//! struct fields; unrecognized keys are ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Default `content_type` stamped on items when the source does not set one
pub const DEFAULT_CONTENT_TYPE: &str = "news";

/// Options for `type = "api"` sources
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Request URL. Missing means the source yields nothing.
    pub endpoint: Option<String>,

    /// Static query parameters (default: none)
    pub params: BTreeMap<String, String>,

    /// Query parameter name -> environment variable holding its value
    pub auth_env: BTreeMap<String, String>,

    /// Dotted path to the item list inside the payload (default: the payload itself)
    pub items_path: Option<String>,

    /// Renames payload fields onto canonical item fields (default: identity)
    pub field_map: FieldMap,

    pub provenance: Provenance,
}

/// Options for `type = "rss"` sources
#[derive(Debug, Clone, PartialEq)]
pub struct RssConfig {
    /// Feed URL. Missing means the source yields nothing.
    pub feed_url: Option<String>,

    pub provenance: Provenance,
}

/// Static tags copied onto every item of a source
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub content_type: String,
    pub language: Option<String>,
    pub region: Option<String>,
}

impl Default for Provenance {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            language: None,
            region: None,
        }
    }
}

/// Payload key overrides for canonical item fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldMap {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl FieldMap {
    /// Payload key holding the given canonical field
    pub fn key_for<'a>(&'a self, field: &'a str) -> &'a str {
        let mapped = match field {
            "title" => self.title.as_deref(),
            "url" => self.url.as_deref(),
            "published_at" => self.published_at.as_deref(),
            "summary" => self.summary.as_deref(),
            _ => None,
        };
        mapped.unwrap_or(field)
    }
}

#[derive(Debug, Deserialize)]
struct RawApiOptions {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    params: BTreeMap<String, toml::Value>,
    #[serde(default)]
    auth_env: BTreeMap<String, String>,
    #[serde(default)]
    items_path: Option<String>,
    #[serde(default)]
    field_map: FieldMap,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRssOptions {
    #[serde(default, alias = "url")]
    feed_url: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl ApiConfig {
    /// Converts an open option table into typed `api` options
    pub fn from_table(table: &toml::Table) -> Result<Self, String> {
        let raw: RawApiOptions = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string().trim().to_string())?;

        let mut params = BTreeMap::new();
        for (key, value) in raw.params {
            params.insert(key.clone(), scalar_to_string(&key, value)?);
        }

        Ok(Self {
            endpoint: checked_url(raw.endpoint, "endpoint")?,
            params,
            auth_env: raw.auth_env,
            items_path: raw.items_path.filter(|p| !p.is_empty()),
            field_map: raw.field_map,
            provenance: provenance(raw.content_type, raw.language, raw.region),
        })
    }
}

impl RssConfig {
    /// Converts an open option table into typed `rss` options
    pub fn from_table(table: &toml::Table) -> Result<Self, String> {
        let raw: RawRssOptions = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string().trim().to_string())?;

        Ok(Self {
            feed_url: checked_url(raw.feed_url, "feed_url")?,
            provenance: provenance(raw.content_type, raw.language, raw.region),
        })
    }
}

fn provenance(
    content_type: Option<String>,
    language: Option<String>,
    region: Option<String>,
) -> Provenance {
    Provenance {
        content_type: content_type
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        language,
        region,
    }
}

/// Empty strings count as unset; anything else must parse as an http(s) URL
fn checked_url(value: Option<String>, key: &str) -> Result<Option<String>, String> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };

    let parsed = Url::parse(&value).map_err(|e| format!("invalid {} '{}': {}", key, value, e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("{} '{}' must use http or https", key, value));
    }
    Ok(Some(value))
}

fn scalar_to_string(key: &str, value: toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            Err(format!("param '{}' must be a scalar value", key))
        }
    }
}
