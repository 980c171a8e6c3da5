//! Persistence of job results and file-based configuration

use crate::{html_page, test_config};
use page_inspector::analyzer::HtmlVersion;
use page_inspector::config::load_config;
use page_inspector::output::{format_markdown_report, format_report};
use page_inspector::storage::{open_store, JobStore, SqliteStore};
use page_inspector::{Engine, JobStatus};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_site(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">
            <html><head><title>Stored</title></head><body>
            <h1>A</h1><h2>B</h2><h2>C</h2>
            <a href="/live">live</a>
            <a href="/dead">dead</a>
            <a href="/dead#again">dead again</a>
            </body></html>"#,
        ))
        .mount(mock_server)
        .await;

    Mock::given(path("/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("jobs").join("inspector.db");

    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    {
        let store = Arc::new(SqliteStore::new(&db_path).expect("Failed to open store"));
        let engine = Engine::from_config(&test_config(), store.clone()).unwrap();

        let status = engine
            .start_analysis("persisted", &format!("{}/", mock_server.uri()))
            .unwrap()
            .wait()
            .await;
        assert_eq!(status, JobStatus::Done);
    }

    let reopened = open_store(&db_path).expect("Failed to reopen store");
    let record = reopened.get_job("persisted").unwrap();
    assert_eq!(record.status, JobStatus::Done);

    let report = record.report.as_ref().unwrap();
    assert_eq!(report.title, "Stored");
    assert_eq!(report.html_version, HtmlVersion::Html401);
    assert_eq!(report.heading_counts.as_array(), [1, 2, 0, 0, 0, 0]);
    assert_eq!(report.internal_link_count, 2);
    assert_eq!(report.external_link_count, 0);
    assert_eq!(report.broken_links.len(), 1);
    assert_eq!(
        report.broken_links[0].url,
        format!("{}/dead", mock_server.uri())
    );

    let text = format_report(&record);
    assert!(text.contains("HTML version: HTML 4.01"));
    let markdown = format_markdown_report(&record);
    assert!(markdown.contains("| h2 | 2 |"));
}

#[tokio::test]
async fn test_rerun_replaces_previous_result() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(SqliteStore::new(&temp_dir.path().join("rerun.db")).unwrap());
    let engine = Engine::from_config(&test_config(), store.clone()).unwrap();

    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let first = engine
        .start_analysis("rerun", &format!("{}/", mock_server.uri()))
        .unwrap()
        .wait()
        .await;
    assert_eq!(first, JobStatus::Done);

    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let second = engine
        .start_analysis("rerun", &format!("{}/", mock_server.uri()))
        .unwrap()
        .wait()
        .await;
    assert_eq!(second, JobStatus::Error);

    let record = store.get_job("rerun").unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.report.is_none());
}

#[tokio::test]
async fn test_engine_from_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("inspector.toml");
    std::fs::write(
        &config_path,
        r#"
[fetcher]
timeout-secs = 3

[validator]
max-concurrent-probes = 2
probe-timeout-secs = 1
deadline-secs = 5

[user-agent]
name = "ConfigTest"
version = "2.0"
"#,
    )
    .unwrap();

    let config = load_config(&config_path).expect("Failed to load config");
    assert_eq!(config.validator.max_concurrent_probes, 2);

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::header("user-agent", "ConfigTest/2.0"))
        .respond_with(html_page("<title>Agent</title>"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let engine = Engine::from_config(&config, store.clone()).unwrap();
    let status = engine
        .start_analysis("agent", &mock_server.uri())
        .unwrap()
        .wait()
        .await;

    assert_eq!(status, JobStatus::Done);
    assert_eq!(store.get_job("agent").unwrap().report.unwrap().title, "Agent");
}
