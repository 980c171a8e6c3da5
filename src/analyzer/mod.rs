//! Analyzer module for single-page analysis
//!
//! This module contains the analysis pipeline, including:
//! - Fetching the target page and following redirects
//! - Document metadata (title, HTML version, heading counts)
//! - Link classification and reachability validation
//! - Login form detection
//! - Job orchestration with cooperative cancellation

mod document;
mod fetcher;
mod forms;
mod links;
mod orchestrator;
mod report;
mod validator;

pub use document::{
    analyze_document, doctype_text, html_version_from_doctype, DocumentSummary, HtmlVersion,
};
pub use fetcher::{build_page_client, is_html_content_type, FetchedPage, Fetcher};
pub use forms::has_login_form;
pub use links::{classify_links, ClassifiedLink, ClassifiedLinks};
pub use orchestrator::{Engine, RunHandle, Stage};
pub use report::{BrokenLink, HeadingCounts, PageReport, ProbeFailure};
pub use validator::{build_probe_client, probe_link, LinkValidator, ProbeOutcome};
