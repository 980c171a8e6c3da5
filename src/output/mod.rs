//! Output module for rendering job results
//!
//! This module handles:
//! - Plain-text reports for the terminal
//! - Markdown reports written to a file

mod markdown;

pub use markdown::{format_markdown_report, write_markdown_report};

use crate::state::JobStatus;
use crate::storage::JobRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Formats a job record as plain text
///
/// Done jobs list the report fields and every broken link; failed jobs show
/// the error message; unfinished jobs show only their status.
pub fn format_report(record: &JobRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Page Inspector: {} ===\n\n", record.job_id));
    out.push_str(&format!("Target:  {}\n", record.target_url));
    out.push_str(&format!("Status:  {}\n", record.status));

    if record.status == JobStatus::Error {
        out.push_str(&format!(
            "Error:   {}\n",
            record.error_message.as_deref().unwrap_or("unknown error")
        ));
        return out;
    }

    let Some(report) = &record.report else {
        return out;
    };

    if report.final_url != record.target_url {
        out.push_str(&format!("Final:   {}\n", report.final_url));
    }
    out.push_str(&format!("HTTP:    {}\n", report.status_code));
    out.push('\n');

    let title = if report.title.is_empty() {
        "(none)"
    } else {
        report.title.as_str()
    };
    out.push_str(&format!("Title:        {}\n", title));
    out.push_str(&format!("HTML version: {}\n", report.html_version));
    out.push_str(&format!("Login form:   {}\n", yes_no(report.has_login_form)));
    out.push('\n');

    out.push_str("Headings:\n");
    for (level, count) in report.heading_counts.iter() {
        out.push_str(&format!("  h{}: {}\n", level, count));
    }
    out.push('\n');

    out.push_str("Links:\n");
    out.push_str(&format!("  Internal: {}\n", report.internal_link_count));
    out.push_str(&format!("  External: {}\n", report.external_link_count));
    out.push_str(&format!("  Broken:   {}\n", report.broken_links.len()));

    for link in &report.broken_links {
        out.push_str(&format!("    {} ({})\n", link.url, link.reason));
    }

    out
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
