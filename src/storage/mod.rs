//! Storage module for persisting analysis jobs
//!
//! This module handles everything that outlives a run:
//! - The `ResultSink` the engine reports to, and the `JobStore` pollers read
//! - An in-memory store for embedding and tests
//! - A SQLite store with schema management

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{JobStore, ResultSink, StorageError, StorageResult};

use crate::analyzer::PageReport;
use crate::state::JobStatus;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens (or creates) a SQLite store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StorageError)` - Failed to open the database or create the schema
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// The stored view of a job, as seen by pollers
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub job_id: String,
    pub target_url: String,
    pub status: JobStatus,
    pub error_message: Option<String>,

    /// Present only once the job is `done`
    pub report: Option<PageReport>,

    /// Time of the last recorded status change
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}
