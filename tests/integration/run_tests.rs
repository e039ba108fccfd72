//! Integration tests for complete runs
//!
//! These tests drive `run_once` against wiremock sources and check what
//! ends up in the index, the item sink and the seen store across runs.

use serde_json::{json, Value};
use source_watch::config::{parse_config, Config};
use source_watch::health::AlertKind;
use source_watch::index::IndexStore;
use source_watch::runner::{run_once, SourceStatus};
use source_watch::sources::SourceRegistry;
use source_watch::storage::{MemorySeenStore, SqliteSeenStore};
use source_watch::WatchError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a config writing into `dir` with the given catalog
fn create_test_config(dir: &Path, failure: u32, zero_new: u32, catalog: &str) -> Config {
    let toml_src = format!(
        r#"
[fetch]
user-agent = "TestWatch/1.0"
timeout-secs = 2
max-retries = 0
retry-backoff-ms = 10
max-concurrent-sources = 2

[health]
failure-threshold = {failure}
zero-new-threshold = {zero_new}

[output]
index-path = "{index}"
seen-db-path = "{seen}"
items-path = "{items}"

{catalog}
"#,
        index = dir.join("state").join("index.json").display(),
        seen = dir.join("seen.db").display(),
        items = dir.join("items.jsonl").display(),
    );
    parse_config(&toml_src).unwrap()
}

fn read_index(config: &Config) -> Value {
    let content = fs::read_to_string(&config.output.index_path).unwrap();
    serde_json::from_str(&content).unwrap()
}

async fn mount_api(server: &MockServer, items: Value) {
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(server)
        .await;
}

async fn mount_feed(server: &MockServer) {
    let feed = r#"<rss version="2.0"><channel>
        <item><title>Press release</title><link>https://bank.example.com/p/1</link></item>
    </channel></rss>"#;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(server)
        .await;
}

fn mixed_catalog(base: &str) -> String {
    format!(
        r#"
[[source]]
id = "stats"
name = "Stats Office"
type = "api"
[source.config]
endpoint = "{base}/api"
items_path = "items"
content_type = "statistics"

[[source]]
id = "bank"
name = "Central Bank"
type = "rss"
[source.config]
feed_url = "{base}/feed.xml"

[[source]]
id = "mystery"
name = "Mystery Source"
type = "ftp"
"#
    )
}

#[tokio::test]
async fn test_full_run_persists_index_and_items() {
    let mock_server = MockServer::start().await;
    mount_api(
        &mock_server,
        json!([
            {"title": "CPI", "url": "https://stats.example.com/cpi"},
            {"title": "GDP", "url": "https://stats.example.com/gdp"}
        ]),
    )
    .await;
    mount_feed(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3, 5, &mixed_catalog(&mock_server.uri()));
    let registry = SourceRegistry::from_config(&config);
    let mut seen = SqliteSeenStore::new(Path::new(&config.output.seen_db_path)).unwrap();

    let report = run_once(&config, &registry, &mut seen).await.unwrap();

    let ids: Vec<_> = report.results.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["stats", "bank", "mystery"]);
    assert_eq!(report.results[0].new, 2);
    assert_eq!(report.results[1].new, 1);
    assert_eq!(report.results[2].status, SourceStatus::Error);
    assert_eq!(
        report.results[2].error_detail.as_deref(),
        Some("unknown source type")
    );
    assert_eq!(report.new_items, 3);
    assert!(report.alerts.is_empty());
    assert_eq!(seen.count_total().unwrap(), 3);

    let index = read_index(&config);
    assert!(index["last_run"]["started_at"].is_string());
    assert!(index["last_run"]["finished_at"].is_string());
    assert_eq!(index["last_run"]["sources"]["stats"]["fetched"], json!(2));
    assert_eq!(index["last_run"]["sources"]["stats"]["status"], json!("ok"));
    assert_eq!(index["last_run"]["sources"]["mystery"]["status"], json!("error"));
    assert_eq!(index["last_run"]["sources"]["mystery"]["failure_streak"], json!(1));
    assert_eq!(
        index["last_run"]["sources"]["mystery"]["last_error"],
        json!("unknown source type")
    );

    let items = fs::read_to_string(config.output.items_path.as_deref().unwrap()).unwrap();
    let lines: Vec<Value> = items.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["source_id"], json!("stats"));
    assert_eq!(lines[0]["content_type"], json!("statistics"));
    assert_eq!(lines[2]["source_name"], json!("Central Bank"));

    // Same payloads again: nothing new, zero-new streaks start
    let report = run_once(&config, &registry, &mut seen).await.unwrap();
    assert_eq!(report.new_items, 0);
    assert_eq!(report.results[0].fetched, 2);
    assert_eq!(report.results[0].skipped, 2);

    let index = read_index(&config);
    assert_eq!(index["last_run"]["sources"]["stats"]["zero_new_streak"], json!(1));
    assert_eq!(index["last_run"]["sources"]["bank"]["zero_new_streak"], json!(1));
    assert_eq!(index["last_run"]["sources"]["mystery"]["failure_streak"], json!(2));

    let items = fs::read_to_string(config.output.items_path.as_deref().unwrap()).unwrap();
    assert_eq!(items.lines().count(), 3);
}

#[tokio::test]
async fn test_streak_alerts_fire_once_per_crossing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let catalog = format!(
        r#"
[[source]]
id = "flaky"
name = "Flaky API"
type = "api"
[source.config]
endpoint = "{}/api"
items_path = "items"
"#,
        mock_server.uri()
    );

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 2, 3, &catalog);
    let registry = SourceRegistry::from_config(&config);
    let mut seen = MemorySeenStore::new();

    let first = run_once(&config, &registry, &mut seen).await.unwrap();
    assert!(first.alerts.is_empty());

    let second = run_once(&config, &registry, &mut seen).await.unwrap();
    assert_eq!(second.alerts.len(), 1);
    assert_eq!(second.alerts[0].kind, AlertKind::FailureStreak);
    assert_eq!(second.alerts[0].streak, 2);
    assert!(second.alerts[0]
        .last_error
        .as_deref()
        .unwrap()
        .contains("HTTP 503"));

    let third = run_once(&config, &registry, &mut seen).await.unwrap();
    assert_eq!(third.alerts.len(), 1);
    assert_eq!(third.alerts[0].kind, AlertKind::ZeroNewStreak);
    assert_eq!(third.alerts[0].streak, 3);

    let fourth = run_once(&config, &registry, &mut seen).await.unwrap();
    assert!(fourth.alerts.is_empty());

    // Source recovers: streaks reset, no new alerts, history kept
    mock_server.reset().await;
    mount_api(&mock_server, json!([{"title": "Back", "url": "https://x.example.com/1"}])).await;

    let fifth = run_once(&config, &registry, &mut seen).await.unwrap();
    assert!(fifth.alerts.is_empty());
    assert_eq!(fifth.results[0].status, SourceStatus::Ok);

    let index = read_index(&config);
    let record = &index["last_run"]["sources"]["flaky"];
    assert_eq!(record["failure_streak"], json!(0));
    assert_eq!(record["zero_new_streak"], json!(0));
    assert!(record.get("last_error").is_none());

    let alerts = index["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["type"], json!("failure_streak"));
    assert_eq!(alerts[1]["type"], json!("zero_new_streak"));
}

#[tokio::test]
async fn test_selected_run_leaves_other_records_alone() {
    let mock_server = MockServer::start().await;
    mount_api(&mock_server, json!([{"url": "https://stats.example.com/a"}])).await;
    mount_feed(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3, 5, &mixed_catalog(&mock_server.uri()));
    let registry = SourceRegistry::from_config(&config);
    let mut seen = MemorySeenStore::new();

    run_once(&config, &registry, &mut seen).await.unwrap();
    let before = read_index(&config);

    let only_bank = registry.select(&["bank".to_string()]);
    let report = run_once(&config, &only_bank, &mut seen).await.unwrap();
    assert_eq!(report.results.len(), 1);

    let after = read_index(&config);
    assert_eq!(
        after["last_run"]["sources"]["stats"],
        before["last_run"]["sources"]["stats"]
    );
    assert_eq!(
        after["last_run"]["sources"]["mystery"],
        before["last_run"]["sources"]["mystery"]
    );
    assert_eq!(after["last_run"]["sources"]["bank"]["zero_new_streak"], json!(1));
}

#[tokio::test]
async fn test_corrupt_index_aborts_before_fetching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3, 5, &mixed_catalog(&mock_server.uri()));
    let index_path = Path::new(&config.output.index_path);
    fs::create_dir_all(index_path.parent().unwrap()).unwrap();
    fs::write(index_path, "{\"last_run\": ").unwrap();

    let registry = SourceRegistry::from_config(&config);
    let err = run_once(&config, &registry, &mut MemorySeenStore::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::Index(_)));
    assert_eq!(fs::read_to_string(index_path).unwrap(), "{\"last_run\": ");
}

#[tokio::test]
async fn test_foreign_index_fields_survive_a_run() {
    let mock_server = MockServer::start().await;
    mount_api(&mock_server, json!([])).await;
    mount_feed(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), 3, 5, &mixed_catalog(&mock_server.uri()));

    let prior = json!({
        "report_title": "Weekly source health",
        "last_run": {
            "sources": {
                "stats": { "zero_new_streak": 4, "owner": "stats-team" },
                "retired": { "fetched": 9 }
            }
        },
        "alerts": []
    });
    let store = IndexStore::new(&config.output.index_path);
    fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    fs::write(store.path(), serde_json::to_string(&prior).unwrap()).unwrap();

    let registry = SourceRegistry::from_config(&config);
    let report = run_once(&config, &registry, &mut MemorySeenStore::new())
        .await
        .unwrap();

    // The externally seeded streak crosses the threshold on this run
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(report.alerts[0].source_id, "stats");
    assert_eq!(report.alerts[0].streak, 5);

    let index = read_index(&config);
    assert_eq!(index["report_title"], json!("Weekly source health"));
    assert_eq!(index["last_run"]["sources"]["stats"]["owner"], json!("stats-team"));
    assert_eq!(index["last_run"]["sources"]["retired"]["fetched"], json!(9));
}

#[tokio::test]
async fn test_failed_item_write_keeps_items_new() {
    let mock_server = MockServer::start().await;
    mount_api(&mock_server, json!([{"title": "CPI", "url": "https://stats.example.com/cpi"}])).await;

    let catalog = format!(
        r#"
[[source]]
id = "stats"
name = "Stats Office"
type = "api"
[source.config]
endpoint = "{}/api"
items_path = "items"
"#,
        mock_server.uri()
    );

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), 3, 5, &catalog);
    let registry = SourceRegistry::from_config(&config);
    let mut seen = SqliteSeenStore::new(Path::new(&config.output.seen_db_path)).unwrap();

    // A directory where the items file should be makes the append fail
    let blocked = dir.path().join("blocked");
    fs::create_dir_all(&blocked).unwrap();
    config.output.items_path = Some(blocked.display().to_string());

    let err = run_once(&config, &registry, &mut seen).await.unwrap_err();
    assert!(matches!(err, WatchError::Index(_)));
    assert_eq!(seen.count_total().unwrap(), 0);

    let items_path = dir.path().join("items.jsonl");
    config.output.items_path = Some(items_path.display().to_string());

    let report = run_once(&config, &registry, &mut seen).await.unwrap();
    assert_eq!(report.new_items, 1);
    assert_eq!(seen.count_total().unwrap(), 1);

    let items = fs::read_to_string(&items_path).unwrap();
    assert_eq!(items.lines().count(), 1);
    assert!(items.contains("https://stats.example.com/cpi"));
}
