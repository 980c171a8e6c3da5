//! Markdown report generation
//!
//! This module renders a job record as a markdown document: job metadata,
//! page metadata, heading distribution and the broken link table.

use crate::output::{yes_no, OutputResult};
use crate::state::JobStatus;
use crate::storage::JobRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report for a job
///
/// # Arguments
///
/// * `record` - The job record to render
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(record: &JobRecord, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(record);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote markdown report to {}", output_path.display());

    Ok(())
}

/// Formats a job record as markdown
pub fn format_markdown_report(record: &JobRecord) -> String {
    let mut md = String::new();

    md.push_str("# Page Inspector Report\n\n");

    md.push_str("## Job\n\n");
    md.push_str(&format!("- **Job ID**: {}\n", record.job_id));
    md.push_str(&format!("- **Target**: {}\n", record.target_url));
    md.push_str(&format!("- **Status**: {}\n", record.status));
    md.push_str(&format!(
        "- **Updated**: {}\n",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if record.status == JobStatus::Error {
        if let Some(message) = &record.error_message {
            md.push_str(&format!("- **Error**: {}\n", message));
        }
    }
    md.push('\n');

    let Some(report) = &record.report else {
        return md;
    };

    md.push_str("## Page\n\n");
    md.push_str(&format!("- **Final URL**: {}\n", report.final_url));
    md.push_str(&format!("- **HTTP Status**: {}\n", report.status_code));
    md.push_str(&format!("- **Title**: {}\n", escape_inline(&report.title)));
    md.push_str(&format!("- **HTML Version**: {}\n", report.html_version));
    md.push_str(&format!(
        "- **Login Form**: {}\n",
        yes_no(report.has_login_form)
    ));
    md.push_str(&format!(
        "- **Analyzed**: {}\n\n",
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    md.push_str("## Headings\n\n");
    md.push_str("| Level | Count |\n");
    md.push_str("|-------|-------|\n");
    for (level, count) in report.heading_counts.iter() {
        md.push_str(&format!("| h{} | {} |\n", level, count));
    }
    md.push_str(&format!(
        "| **Total** | {} |\n\n",
        report.heading_counts.total()
    ));

    md.push_str("## Links\n\n");
    md.push_str(&format!("- **Internal**: {}\n", report.internal_link_count));
    md.push_str(&format!("- **External**: {}\n", report.external_link_count));
    md.push_str(&format!("- **Broken**: {}\n\n", report.broken_links.len()));

    if !report.broken_links.is_empty() {
        md.push_str("### Broken Links\n\n");
        md.push_str("| URL | Status | Reason |\n");
        md.push_str("|-----|--------|--------|\n");
        for link in &report.broken_links {
            let status = link
                .status_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&link.url),
                status,
                escape_cell(&link.reason.to_string())
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_inline(text: &str) -> String {
    text.replace('\n', " ")
}

fn escape_cell(text: &str) -> String {
    escape_inline(text).replace('|', "\\|")
}
