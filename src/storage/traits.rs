//! Storage traits and error types
//!
//! This module defines the trait interface for result sinks and job stores,
//! and the associated error types.

use crate::analyzer::PageReport;
use crate::state::AnalysisJob;
use crate::storage::JobRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Receives job lifecycle updates and finished reports
///
/// The engine calls these from run tasks, possibly for several jobs at once,
/// so implementations must be thread-safe. A failing sink never stops a run;
/// the engine logs the error and carries on.
pub trait ResultSink: Send + Sync {
    /// Records the job's current status (and error message, if any)
    ///
    /// Recording `queued` for a job that already exists resets it: the
    /// previous report is discarded.
    fn record_status(&self, job: &AnalysisJob) -> StorageResult<()>;

    /// Records the report of a finished run
    ///
    /// Called once per successful run, before the `done` status.
    fn record_report(&self, job_id: &str, report: &PageReport) -> StorageResult<()>;
}

/// Read side of a store, for polling job state
pub trait JobStore: Send + Sync {
    /// Loads a job and its report, if the job is known
    fn load_job(&self, job_id: &str) -> StorageResult<Option<JobRecord>>;

    /// Loads a job, failing with `JobNotFound` if it is unknown
    fn get_job(&self, job_id: &str) -> StorageResult<JobRecord> {
        self.load_job(job_id)?
            .ok_or_else(|| StorageError::JobNotFound(job_id.to_string()))
    }
}
