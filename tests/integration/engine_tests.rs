//! End-to-end runs through the engine

use crate::{closed_port, html_page, memory_engine, recording_engine, RecordingSink};
use page_inspector::analyzer::{HtmlVersion, ProbeFailure};
use page_inspector::storage::JobStore;
use page_inspector::{AnalysisError, JobStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn port_of(server: &MockServer) -> u16 {
    server.address().port()
}

#[tokio::test]
async fn test_demo_page_end_to_end() {
    let mock_server = MockServer::start().await;
    let port = port_of(&mock_server);

    // "localhost" differs from the page's 127.0.0.1 host, so this link is external
    let external = format!("http://localhost:{}/x", port);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(format!(
            r#"<!DOCTYPE html>
            <html><head><title>Demo</title></head>
            <body>
                <h1>Welcome</h1>
                <h2>Section</h2>
                <a href="/about">About</a>
                <a href="{}">Elsewhere</a>
            </body></html>"#,
            external
        )))
        .mount(&mock_server)
        .await;

    Mock::given(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(path("/x"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let run = engine
        .start_analysis("demo", &format!("{}/", mock_server.uri()))
        .unwrap();
    assert_eq!(run.job_id(), "demo");

    let status = run.wait().await;
    assert_eq!(status, JobStatus::Done);

    let record = store.get_job("demo").unwrap();
    assert_eq!(record.status, JobStatus::Done);
    assert!(record.error_message.is_none());

    let report = record.report.expect("done job should carry a report");
    assert_eq!(report.title, "Demo");
    assert_eq!(report.html_version, HtmlVersion::Html5);
    assert_eq!(report.heading_counts.as_array(), [1, 1, 0, 0, 0, 0]);
    assert_eq!(report.internal_link_count, 1);
    assert_eq!(report.external_link_count, 1);
    assert!(!report.has_login_form);
    assert_eq!(report.status_code, 200);

    assert_eq!(report.broken_links.len(), 1);
    assert_eq!(report.broken_links[0].url, external);
    assert_eq!(report.broken_links[0].status_code, Some(404));
    assert_eq!(report.broken_links[0].reason, ProbeFailure::HttpStatus(404));

    assert!(!engine.is_active("demo"));
}

#[tokio::test]
async fn test_login_page_and_legacy_doctype() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html_page(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN"
                "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">
            <html><head><title> Sign in </title></head><body>
            <h3>Account</h3><h3>Help</h3>
            <form method="post"><input name="user"><input type="password" name="pw"></form>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let status = engine
        .start_analysis("login", &format!("{}/login", mock_server.uri()))
        .unwrap()
        .wait()
        .await;
    assert_eq!(status, JobStatus::Done);

    let report = store.get_job("login").unwrap().report.unwrap();
    assert_eq!(report.html_version, HtmlVersion::Xhtml10);
    assert_eq!(report.heading_counts.get(3), 2);
    assert_eq!(report.heading_counts.total(), 2);
    assert!(report.has_login_form);
    assert_eq!(report.internal_link_count + report.external_link_count, 0);
    assert!(report.broken_links.is_empty());
}

#[tokio::test]
async fn test_redirect_reports_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/new"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("<html><head><title>Moved</title></head></html>"))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let status = engine
        .start_analysis("redirect", &format!("{}/old", mock_server.uri()))
        .unwrap()
        .wait()
        .await;
    assert_eq!(status, JobStatus::Done);

    let report = store.get_job("redirect").unwrap().report.unwrap();
    assert_eq!(report.final_url, format!("{}/new", mock_server.uri()));
    assert_eq!(report.title, "Moved");
    assert_eq!(report.html_version, HtmlVersion::Unknown);
}

#[tokio::test]
async fn test_unreachable_target() {
    let (engine, store) = memory_engine();
    let target = format!("http://127.0.0.1:{}/", closed_port());

    let status = engine.start_analysis("down", &target).unwrap().wait().await;
    assert_eq!(status, JobStatus::Error);

    let record = store.get_job("down").unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.report.is_none());

    let message = record.error_message.unwrap();
    assert!(message.starts_with("fetch: "), "got {:?}", message);
    assert!(message.contains("unreachable"), "got {:?}", message);
}

#[tokio::test]
async fn test_error_status_target() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let status = engine
        .start_analysis("busy", &mock_server.uri())
        .unwrap()
        .wait()
        .await;
    assert_eq!(status, JobStatus::Error);

    let record = store.get_job("busy").unwrap();
    assert_eq!(
        record.error_message.as_deref(),
        Some("fetch: target returned HTTP 503")
    );
    assert!(record.report.is_none());
}

#[tokio::test]
async fn test_non_html_target_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"a\":1}", "application/json"))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let status = engine
        .start_analysis("json", &mock_server.uri())
        .unwrap()
        .wait()
        .await;
    assert_eq!(status, JobStatus::Error);

    let message = store.get_job("json").unwrap().error_message.unwrap();
    assert!(message.starts_with("parse: "), "got {:?}", message);
}

#[tokio::test]
async fn test_stop_before_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("<title>Never analyzed</title>"))
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::new());
    let engine = recording_engine(&sink);
    let run = engine
        .start_analysis("stopped", &mock_server.uri())
        .unwrap();

    // The run task has not been polled yet on the current-thread test runtime
    assert!(engine.stop_analysis("stopped"));

    assert_eq!(run.wait().await, JobStatus::Error);
    assert_eq!(
        sink.statuses(),
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Error]
    );

    let record = sink.store().get_job("stopped").unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.error_message.as_deref(), Some("cancelled by request"));
    assert!(record.report.is_none());

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_stop_during_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("<title>Slow</title>").set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let (engine, store) = memory_engine();
    let run = engine.start_analysis("slow", &mock_server.uri()).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.is_active("slow"));
    assert!(engine.stop_analysis("slow"));

    assert_eq!(run.wait().await, JobStatus::Error);

    let record = store.get_job("slow").unwrap();
    assert_eq!(record.error_message.as_deref(), Some("cancelled by request"));
    assert!(record.report.is_none());
    assert!(!engine.is_active("slow"));
}

#[tokio::test]
async fn test_stop_during_link_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<html><head><title>Links</title></head>
            <body><a href="/slow-link">slow</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/slow-link"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1000)))
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::new());
    let engine = recording_engine(&sink);
    let run = engine
        .start_analysis("checking", &format!("{}/", mock_server.uri()))
        .unwrap();

    // Page fetch is immediate; the link check holds the run for a second
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(engine.stop_analysis("checking"));

    assert_eq!(run.wait().await, JobStatus::Error);
    assert_eq!(
        sink.statuses(),
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Error]
    );

    let record = sink.store().get_job("checking").unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert_eq!(record.error_message.as_deref(), Some("cancelled by request"));
    assert!(record.report.is_none());

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().any(|r| r.url.path() == "/slow-link"));
}

#[tokio::test]
async fn test_lost_report_fails_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("<title>Unsaved</title>"))
        .mount(&mock_server)
        .await;

    let sink = Arc::new(RecordingSink::rejecting_reports());
    let engine = recording_engine(&sink);
    let status = engine
        .start_analysis("unsaved", &mock_server.uri())
        .unwrap()
        .wait()
        .await;

    assert_eq!(status, JobStatus::Error);
    assert_eq!(
        sink.statuses(),
        vec![JobStatus::Queued, JobStatus::Running, JobStatus::Error]
    );

    let record = sink.store().get_job("unsaved").unwrap();
    assert!(record.report.is_none());
    let message = record.error_message.unwrap();
    assert!(message.starts_with("report: "), "got {:?}", message);
}

#[tokio::test]
async fn test_second_start_while_running_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page("<title>Slow</title>").set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let (engine, _store) = memory_engine();
    let run = engine.start_analysis("once", &mock_server.uri()).unwrap();

    let second = engine.start_analysis("once", &mock_server.uri());
    assert!(matches!(second, Err(AnalysisError::AlreadyRunning { .. })));

    assert_eq!(run.wait().await, JobStatus::Done);

    // Finished jobs can be run again
    let again = engine.start_analysis("once", &mock_server.uri()).unwrap();
    assert_eq!(again.wait().await, JobStatus::Done);
}

#[tokio::test]
async fn test_invalid_target_records_nothing() {
    let (engine, store) = memory_engine();

    for target in ["not a url", "/relative/path", "ftp://example.com/file"] {
        let result = engine.start_analysis("bad", target);
        assert!(matches!(result, Err(AnalysisError::InvalidTarget { .. })));
    }

    assert!(store.load_job("bad").unwrap().is_none());
    assert!(!engine.is_active("bad"));
}

#[tokio::test]
async fn test_stop_unknown_job() {
    let (engine, _store) = memory_engine();
    assert!(!engine.stop_analysis("nobody"));
}
