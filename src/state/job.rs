use crate::state::JobStatus;
use crate::AnalysisError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Shared stop-request flag for one run
///
/// Cloning yields a handle to the same flag. The orchestrator only reads it at
/// stage boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One requested analysis run against a target URL
///
/// Owned by the orchestrator for the duration of a run. The status only moves
/// along [`JobStatus::can_transition_to`].
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub id: String,
    pub target_url: Url,
    status: JobStatus,
    error_message: Option<String>,
    cancel: CancelFlag,
}

impl AnalysisJob {
    /// Creates a job in the `Queued` state
    pub fn new(id: impl Into<String>, target_url: Url) -> Self {
        Self {
            id: id.into(),
            target_url,
            status: JobStatus::Queued,
            error_message: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns a handle that can request a stop of this job
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Moves the job to `Running`
    pub fn start(&mut self) -> Result<(), AnalysisError> {
        self.transition(JobStatus::Running)
    }

    /// Moves the job to `Done`
    pub fn finish(&mut self) -> Result<(), AnalysisError> {
        self.transition(JobStatus::Done)
    }

    /// Moves the job to `Error` and records the message
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), AnalysisError> {
        self.transition(JobStatus::Error)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), AnalysisError> {
        if !self.status.can_transition_to(next) {
            return Err(AnalysisError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
