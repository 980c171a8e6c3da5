//! Analysis orchestrator - job lifecycle and pipeline driver
//!
//! This module accepts analysis jobs, runs each one on its own task and
//! reports every status transition to the result sink:
//! - queued when the job is accepted
//! - running when the pipeline starts
//! - done with a report, or error with a message naming the failing stage
//!
//! Stop requests are cooperative. The cancel flag is read between stages;
//! requests already in flight finish or time out on their own.

use crate::analyzer::document::{analyze_document, DocumentSummary};
use crate::analyzer::fetcher::{FetchedPage, Fetcher};
use crate::analyzer::forms::has_login_form;
use crate::analyzer::links::{classify_links, ClassifiedLinks};
use crate::analyzer::report::PageReport;
use crate::analyzer::validator::LinkValidator;
use crate::config::Config;
use crate::state::{AnalysisJob, CancelFlag, JobStatus};
use crate::storage::ResultSink;
use crate::AnalysisError;
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use url::Url;

/// Pipeline stage, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Analyze,
    Validate,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Analyze => "analyze",
            Self::Validate => "validate",
            Self::Report => "report",
        };
        write!(f, "{}", name)
    }
}

/// A fatal pipeline failure and the stage it happened in
#[derive(Debug)]
struct StageFailure {
    stage: Stage,
    error: AnalysisError,
}

impl StageFailure {
    fn cancelled(stage: Stage) -> Self {
        Self {
            stage,
            error: AnalysisError::Cancelled,
        }
    }

    /// The message stored with the `error` status
    fn message(&self) -> String {
        match self.error {
            AnalysisError::Cancelled => self.error.to_string(),
            _ => format!("{}: {}", self.stage, self.error),
        }
    }
}

/// Everything extracted from the parsed document
///
/// Owned data only; the parsed `Html` never outlives `inspect_page`.
struct PageInspection {
    summary: DocumentSummary,
    links: ClassifiedLinks,
    has_login_form: bool,
}

fn inspect_page(page: &FetchedPage) -> PageInspection {
    let document = page.parse();
    PageInspection {
        summary: analyze_document(&document),
        links: classify_links(&document, &page.final_url),
        has_login_form: has_login_form(&document),
    }
}

/// Handle to a started run
#[derive(Debug)]
pub struct RunHandle {
    job_id: String,
    handle: JoinHandle<JobStatus>,
}

impl RunHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Waits for the run to reach a terminal status
    pub async fn wait(self) -> JobStatus {
        match self.handle.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Run task for job {} failed: {}", self.job_id, e);
                JobStatus::Error
            }
        }
    }
}

type ActiveRuns = Mutex<HashMap<String, CancelFlag>>;

fn lock_active(active: &ActiveRuns) -> MutexGuard<'_, HashMap<String, CancelFlag>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a job from the active registry when its run ends
struct ActiveRun<'a> {
    active: &'a ActiveRuns,
    job_id: String,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        lock_active(self.active).remove(&self.job_id);
    }
}

struct EngineInner {
    fetcher: Fetcher,
    validator: LinkValidator,
    sink: Arc<dyn ResultSink>,
    active: ActiveRuns,
}

/// The analysis engine
///
/// Cloning is cheap and yields a handle to the same engine.
///
/// # Example
///
/// ```no_run
/// use page_inspector::config::Config;
/// use page_inspector::storage::MemoryStore;
/// use page_inspector::Engine;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let engine = Engine::from_config(&Config::default(), store.clone())?;
/// let run = engine.start_analysis("job-1", "https://example.com/")?;
/// let status = run.wait().await;
/// println!("job-1 finished with status {}", status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Creates an engine from explicitly built components
    pub fn new(fetcher: Fetcher, validator: LinkValidator, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                fetcher,
                validator,
                sink,
                active: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates an engine with page and probe clients built from `config`
    pub fn from_config(config: &Config, sink: Arc<dyn ResultSink>) -> Result<Self, AnalysisError> {
        let fetcher = Fetcher::from_config(&config.user_agent, &config.fetcher)?;
        let validator = LinkValidator::from_config(&config.user_agent, &config.validator)?;
        Ok(Self::new(fetcher, validator, sink))
    }

    /// Starts an analysis run and returns immediately
    ///
    /// The job is recorded as `queued` before this returns; the rest of the
    /// lifecycle is delivered to the sink from a spawned task. Must be called
    /// from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// * `InvalidTarget` - `target_url` is not an absolute http(s) URL; nothing is recorded
    /// * `AlreadyRunning` - the job id has an active run
    pub fn start_analysis(&self, job_id: &str, target_url: &str) -> Result<RunHandle, AnalysisError> {
        let url = parse_target(target_url)?;
        let job = AnalysisJob::new(job_id, url);

        {
            let mut active = lock_active(&self.inner.active);
            if active.contains_key(job_id) {
                return Err(AnalysisError::AlreadyRunning {
                    job_id: job_id.to_string(),
                });
            }
            active.insert(job_id.to_string(), job.cancel_flag());
        }

        tracing::info!("Job {} queued for {}", job.id, job.target_url);
        self.inner.record_status(&job);

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run(job).await });

        Ok(RunHandle {
            job_id: job_id.to_string(),
            handle,
        })
    }

    /// Requests a stop of an active run
    ///
    /// Best effort: returns false if no run is active for `job_id`. A run
    /// already past its last checkpoint still completes normally.
    pub fn stop_analysis(&self, job_id: &str) -> bool {
        match lock_active(&self.inner.active).get(job_id) {
            Some(flag) => {
                tracing::info!("Stop requested for job {}", job_id);
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Returns true if a run for `job_id` has not finished yet
    pub fn is_active(&self, job_id: &str) -> bool {
        lock_active(&self.inner.active).contains_key(job_id)
    }
}

impl EngineInner {
    /// Drives one job to a terminal status
    async fn run(&self, mut job: AnalysisJob) -> JobStatus {
        let _active = ActiveRun {
            active: &self.active,
            job_id: job.id.clone(),
        };

        let outcome = self
            .execute(&mut job)
            .await
            .and_then(|report| self.store_report(&job, report));

        match outcome {
            Ok(report) => {
                if let Err(e) = job.finish() {
                    tracing::error!("Job {}: {}", job.id, e);
                }
                tracing::info!(
                    "Job {} done: {} internal, {} external, {} broken links",
                    job.id,
                    report.internal_link_count,
                    report.external_link_count,
                    report.broken_links.len()
                );
            }
            Err(failure) => {
                let message = failure.message();
                match failure.error {
                    AnalysisError::Cancelled => {
                        tracing::info!("Job {} cancelled before {}", job.id, failure.stage)
                    }
                    _ => tracing::warn!("Job {} failed: {}", job.id, message),
                }
                if let Err(e) = job.fail(message) {
                    tracing::error!("Job {}: {}", job.id, e);
                }
            }
        }

        self.record_status(&job);
        job.status()
    }

    /// Runs the pipeline, checking for a stop request between stages
    ///
    /// The job is `running` before the first check, so a stopped job always
    /// reaches `error` through `running`.
    async fn execute(&self, job: &mut AnalysisJob) -> Result<PageReport, StageFailure> {
        job.start().map_err(|error| StageFailure {
            stage: Stage::Fetch,
            error,
        })?;
        self.record_status(job);
        tracing::debug!("Job {} running", job.id);

        checkpoint(job, Stage::Fetch)?;

        let page = self.fetcher.fetch(&job.target_url).await.map_err(|error| {
            let stage = match error {
                AnalysisError::Parse { .. } => Stage::Parse,
                _ => Stage::Fetch,
            };
            StageFailure { stage, error }
        })?;
        tracing::debug!(
            "Job {} fetched {} ({} bytes)",
            job.id,
            page.final_url,
            page.body.len()
        );

        checkpoint(job, Stage::Analyze)?;
        let inspection = inspect_page(&page);

        checkpoint(job, Stage::Validate)?;
        let broken_links = self.validator.validate(inspection.links.links()).await;

        checkpoint(job, Stage::Report)?;

        Ok(PageReport {
            final_url: page.final_url.to_string(),
            status_code: page.status_code,
            title: inspection.summary.title,
            html_version: inspection.summary.html_version,
            heading_counts: inspection.summary.headings,
            internal_link_count: inspection.links.internal_count(),
            external_link_count: inspection.links.external_count(),
            has_login_form: inspection.has_login_form,
            broken_links,
            analyzed_at: Utc::now(),
        })
    }

    /// Hands the report to the sink; a job whose report is lost is not `done`
    fn store_report(&self, job: &AnalysisJob, report: PageReport) -> Result<PageReport, StageFailure> {
        match self.sink.record_report(&job.id, &report) {
            Ok(()) => Ok(report),
            Err(e) => Err(StageFailure {
                stage: Stage::Report,
                error: AnalysisError::Storage(e),
            }),
        }
    }

    fn record_status(&self, job: &AnalysisJob) {
        if let Err(e) = self.sink.record_status(job) {
            tracing::error!(
                "Failed to record status {} for job {}: {}",
                job.status(),
                job.id,
                e
            );
        }
    }
}

fn checkpoint(job: &AnalysisJob, next: Stage) -> Result<(), StageFailure> {
    if job.cancel_requested() {
        return Err(StageFailure::cancelled(next));
    }
    Ok(())
}

/// Parses and checks a target URL (absolute, http or https, with a host)
fn parse_target(target_url: &str) -> Result<Url, AnalysisError> {
    let invalid = |reason: &str| AnalysisError::InvalidTarget {
        url: target_url.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(target_url.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    Ok(url)
}
