//! In-memory store
//!
//! Keeps job records in a mutex-guarded map. Nothing survives the process.

use crate::analyzer::PageReport;
use crate::state::{AnalysisJob, JobStatus};
use crate::storage::traits::{JobStore, ResultSink, StorageError, StorageResult};
use crate::storage::JobRecord;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory `ResultSink` and `JobStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of known jobs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for MemoryStore {
    fn record_status(&self, job: &AnalysisJob) -> StorageResult<()> {
        let mut jobs = self.lock();
        let now = Utc::now();

        let record = jobs.entry(job.id.clone()).or_insert_with(|| JobRecord {
            job_id: job.id.clone(),
            target_url: job.target_url.to_string(),
            status: job.status(),
            error_message: None,
            report: None,
            updated_at: now,
        });

        if job.status() == JobStatus::Queued {
            record.target_url = job.target_url.to_string();
            record.report = None;
        }
        record.status = job.status();
        record.error_message = job.error_message().map(str::to_string);
        record.updated_at = now;

        Ok(())
    }

    fn record_report(&self, job_id: &str, report: &PageReport) -> StorageResult<()> {
        let mut jobs = self.lock();
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| StorageError::JobNotFound(job_id.to_string()))?;
        record.report = Some(report.clone());
        Ok(())
    }
}

impl JobStore for MemoryStore {
    fn load_job(&self, job_id: &str) -> StorageResult<Option<JobRecord>> {
        Ok(self.lock().get(job_id).map(|record| {
            let mut record = record.clone();
            if record.status != JobStatus::Done {
                record.report = None;
            }
            record
        }))
    }
}
