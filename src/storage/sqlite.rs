//! SQLite storage implementation
//!
//! This module provides a SQLite-backed `ResultSink` and `JobStore`. The
//! connection sits behind a mutex, so concurrent runs serialize their writes.

use crate::analyzer::{BrokenLink, HeadingCounts, HtmlVersion, PageReport, ProbeFailure};
use crate::state::{AnalysisJob, JobStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, ResultSink, StorageError, StorageResult};
use crate::storage::JobRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened job database at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for SqliteStore {
    fn record_status(&self, job: &AnalysisJob) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        if job.status() == JobStatus::Queued {
            tx.execute("DELETE FROM broken_links WHERE job_id = ?1", params![job.id])?;
            tx.execute("DELETE FROM reports WHERE job_id = ?1", params![job.id])?;
        }

        tx.execute(
            "INSERT INTO jobs (job_id, target_url, status, error_message, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(job_id) DO UPDATE SET
                target_url = excluded.target_url,
                status = excluded.status,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at",
            params![
                job.id,
                job.target_url.as_str(),
                job.status().to_db_string(),
                job.error_message(),
                now
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_report(&self, job_id: &str, report: &PageReport) -> StorageResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let h = report.heading_counts.as_array();

        tx.execute("DELETE FROM broken_links WHERE job_id = ?1", params![job_id])?;
        tx.execute(
            "INSERT OR REPLACE INTO reports (
                job_id, final_url, status_code, title, html_version,
                h1, h2, h3, h4, h5, h6,
                internal_links, external_links, has_login_form, analyzed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                job_id,
                report.final_url,
                report.status_code,
                report.title,
                report.html_version.label(),
                h[0],
                h[1],
                h[2],
                h[3],
                h[4],
                h[5],
                report.internal_link_count as i64,
                report.external_link_count as i64,
                report.has_login_form,
                report.analyzed_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO broken_links (job_id, url, status_code, reason)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in &report.broken_links {
                stmt.execute(params![
                    job_id,
                    link.url,
                    link.status_code,
                    link.reason.to_db_string()
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

/// Raw `reports` row before conversion
struct ReportRow {
    final_url: String,
    status_code: u16,
    title: String,
    html_version: String,
    headings: [u32; 6],
    internal_links: i64,
    external_links: i64,
    has_login_form: bool,
    analyzed_at: String,
}

impl JobStore for SqliteStore {
    fn load_job(&self, job_id: &str) -> StorageResult<Option<JobRecord>> {
        let conn = self.lock();

        let job = conn
            .query_row(
                "SELECT target_url, status, error_message, updated_at FROM jobs WHERE job_id = ?1",
                params![job_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((target_url, status, error_message, updated_at)) = job else {
            return Ok(None);
        };

        let status = JobStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown job status '{}'", status)))?;

        let report = if status == JobStatus::Done {
            load_report(&conn, job_id)?
        } else {
            None
        };

        Ok(Some(JobRecord {
            job_id: job_id.to_string(),
            target_url,
            status,
            error_message,
            report,
            updated_at: parse_timestamp(&updated_at)?,
        }))
    }
}

fn load_report(conn: &Connection, job_id: &str) -> StorageResult<Option<PageReport>> {
    let row = conn
        .query_row(
            "SELECT final_url, status_code, title, html_version,
                    h1, h2, h3, h4, h5, h6,
                    internal_links, external_links, has_login_form, analyzed_at
             FROM reports WHERE job_id = ?1",
            params![job_id],
            |row| {
                Ok(ReportRow {
                    final_url: row.get(0)?,
                    status_code: row.get(1)?,
                    title: row.get(2)?,
                    html_version: row.get(3)?,
                    headings: [
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                        row.get(9)?,
                    ],
                    internal_links: row.get(10)?,
                    external_links: row.get(11)?,
                    has_login_form: row.get(12)?,
                    analyzed_at: row.get(13)?,
                })
            },
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT url, reason FROM broken_links WHERE job_id = ?1 ORDER BY url",
    )?;
    let broken_links = stmt
        .query_map(params![job_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .map(|entry| {
            let (url, reason) = entry?;
            let reason = ProbeFailure::from_db_string(&reason).ok_or_else(|| {
                StorageError::Corrupt(format!("unknown broken link reason '{}'", reason))
            })?;
            Ok(BrokenLink::new(url, reason))
        })
        .collect::<StorageResult<Vec<_>>>()?;

    Ok(Some(PageReport {
        final_url: row.final_url,
        status_code: row.status_code,
        title: row.title,
        html_version: HtmlVersion::from_label(&row.html_version),
        heading_counts: HeadingCounts::from_levels(row.headings),
        internal_link_count: count_from_db(row.internal_links)?,
        external_link_count: count_from_db(row.external_links)?,
        has_login_form: row.has_login_form,
        broken_links,
        analyzed_at: parse_timestamp(&row.analyzed_at)?,
    }))
}

fn count_from_db(value: i64) -> StorageResult<usize> {
    usize::try_from(value).map_err(|_| StorageError::Corrupt(format!("negative count {}", value)))
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", value, e)))
}
