//! Result types produced by a successful analysis run

use crate::analyzer::document::HtmlVersion;
use chrono::{DateTime, Utc};
use std::fmt;

/// Number of heading elements per level (h1..h6)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts([u32; 6]);

impl HeadingCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds counts from an `[h1, h2, h3, h4, h5, h6]` array
    pub fn from_levels(levels: [u32; 6]) -> Self {
        Self(levels)
    }

    /// Returns the count for `level` (1..=6); other levels count zero
    pub fn get(&self, level: usize) -> u32 {
        match level {
            1..=6 => self.0[level - 1],
            _ => 0,
        }
    }

    /// Counts one more heading at `level`; levels outside 1..=6 are ignored
    pub fn increment(&mut self, level: usize) {
        if let 1..=6 = level {
            self.0[level - 1] += 1;
        }
    }

    /// Total number of headings across all levels
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Iterates `(level, count)` pairs from h1 to h6
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.0.iter().enumerate().map(|(i, count)| (i + 1, *count))
    }

    pub fn as_array(&self) -> [u32; 6] {
        self.0
    }
}

/// Why a link probe counts as broken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The final response had status >= 400
    HttpStatus(u16),

    /// The probe did not complete within its timeout
    Timeout,

    /// The connection could not be established or was dropped
    ConnectionFailure(String),

    /// The redirect chain was longer than the probe limit
    RedirectLimit,
}

impl ProbeFailure {
    /// Converts the failure to a database string representation
    pub fn to_db_string(&self) -> String {
        match self {
            Self::HttpStatus(code) => format!("http_{}", code),
            Self::Timeout => "timeout".to_string(),
            Self::ConnectionFailure(reason) => format!("connection:{}", reason),
            Self::RedirectLimit => "redirect_limit".to_string(),
        }
    }

    /// Parses a failure from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        if let Some(code) = s.strip_prefix("http_") {
            return code.parse().ok().map(Self::HttpStatus);
        }
        if let Some(reason) = s.strip_prefix("connection:") {
            return Some(Self::ConnectionFailure(reason.to_string()));
        }
        match s {
            "timeout" => Some(Self::Timeout),
            "redirect_limit" => Some(Self::RedirectLimit),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "probe timed out"),
            Self::ConnectionFailure(reason) => write!(f, "{}", reason),
            Self::RedirectLimit => write!(f, "too many redirects"),
        }
    }
}

/// A link whose probe failed or returned an error status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLink {
    /// Absolute URL of the link
    pub url: String,

    /// Final HTTP status, if a response was received
    pub status_code: Option<u16>,

    /// What made the link broken
    pub reason: ProbeFailure,
}

impl BrokenLink {
    pub fn new(url: impl Into<String>, reason: ProbeFailure) -> Self {
        let status_code = match reason {
            ProbeFailure::HttpStatus(code) => Some(code),
            _ => None,
        };
        Self {
            url: url.into(),
            status_code,
            reason,
        }
    }
}

/// Aggregated result of one successful analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    /// Effective page location after redirects
    pub final_url: String,

    /// HTTP status of the page fetch
    pub status_code: u16,

    pub title: String,
    pub html_version: HtmlVersion,
    pub heading_counts: HeadingCounts,

    /// Unique internal links
    pub internal_link_count: usize,

    /// Unique external links
    pub external_link_count: usize,

    pub has_login_form: bool,

    /// Broken links, sorted by URL
    pub broken_links: Vec<BrokenLink>,

    pub analyzed_at: DateTime<Utc>,
}
