//! State module for tracking analysis jobs
//!
//! # Components
//!
//! - `JobStatus`: lifecycle states (queued, running, done, error) and their transition table
//! - `AnalysisJob`: one run's identity, status, error message and stop flag
//! - `CancelFlag`: cooperative stop signal shared between the engine and a run

mod job;
mod job_status;

// Re-export main types
pub use job::{AnalysisJob, CancelFlag};
pub use job_status::JobStatus;
