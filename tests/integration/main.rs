//! Integration tests for the analysis engine
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, analyze and validate cycle end-to-end.

mod engine_tests;
mod store_tests;

use page_inspector::analyzer::PageReport;
use page_inspector::config::Config;
use page_inspector::storage::{MemoryStore, ResultSink, StorageError, StorageResult};
use page_inspector::{AnalysisJob, Engine, JobStatus};
use std::sync::{Arc, Mutex};
use wiremock::ResponseTemplate;

/// Creates a configuration with short timeouts for testing
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.fetcher.timeout_secs = 5;
    config.validator.probe_timeout_secs = 2;
    config.validator.deadline_secs = 10;
    config.validator.max_concurrent_probes = 4;
    config.user_agent.name = "TestInspector".to_string();
    config.user_agent.version = "1.0.0".to_string();
    config
}

/// Creates an engine reporting to a fresh in-memory store
pub fn memory_engine() -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::from_config(&test_config(), store.clone()).expect("Failed to build engine");
    (engine, store)
}

/// A sink that remembers every status it is given, backed by a memory store
pub struct RecordingSink {
    store: MemoryStore,
    statuses: Mutex<Vec<JobStatus>>,
    reject_reports: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            statuses: Mutex::new(Vec::new()),
            reject_reports: false,
        }
    }

    /// A sink whose report writes always fail
    pub fn rejecting_reports() -> Self {
        Self {
            reject_reports: true,
            ..Self::new()
        }
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl ResultSink for RecordingSink {
    fn record_status(&self, job: &AnalysisJob) -> StorageResult<()> {
        self.statuses.lock().unwrap().push(job.status());
        self.store.record_status(job)
    }

    fn record_report(&self, job_id: &str, report: &PageReport) -> StorageResult<()> {
        if self.reject_reports {
            return Err(StorageError::Corrupt("report table is read-only".to_string()));
        }
        self.store.record_report(job_id, report)
    }
}

/// Creates an engine reporting to `sink`
pub fn recording_engine(sink: &Arc<RecordingSink>) -> Engine {
    Engine::from_config(&test_config(), sink.clone()).expect("Failed to build engine")
}

/// A 200 response carrying an HTML body
pub fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

/// Returns a local port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    port
}
