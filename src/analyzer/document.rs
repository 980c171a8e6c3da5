//! Structural metadata extraction
//!
//! This module extracts from a parsed document:
//! - The page title
//! - The HTML version, derived from the doctype declaration
//! - Heading counts per level (h1..h6)

use crate::analyzer::report::HeadingCounts;
use scraper::{Html, Node, Selector};
use std::fmt;

/// HTML version label derived from the doctype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HtmlVersion {
    Html5,
    Xhtml11,
    Xhtml10,
    XhtmlBasic,
    Html401,
    Html40,
    Html32,
    Html20,
    Unknown,
}

impl HtmlVersion {
    /// Returns the human-readable label (e.g. "HTML5", "XHTML 1.0")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Html5 => "HTML5",
            Self::Xhtml11 => "XHTML 1.1",
            Self::Xhtml10 => "XHTML 1.0",
            Self::XhtmlBasic => "XHTML Basic",
            Self::Html401 => "HTML 4.01",
            Self::Html40 => "HTML 4.0",
            Self::Html32 => "HTML 3.2",
            Self::Html20 => "HTML 2.0",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses a version from its label; unrecognized labels map to `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label {
            "HTML5" => Self::Html5,
            "XHTML 1.1" => Self::Xhtml11,
            "XHTML 1.0" => Self::Xhtml10,
            "XHTML Basic" => Self::XhtmlBasic,
            "HTML 4.01" => Self::Html401,
            "HTML 4.0" => Self::Html40,
            "HTML 3.2" => Self::Html32,
            "HTML 2.0" => Self::Html20,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Metadata extracted from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Trimmed text of the first `<title>`, empty if absent
    pub title: String,
    pub html_version: HtmlVersion,
    pub headings: HeadingCounts,
}

/// Extracts title, HTML version and heading counts from a document
///
/// # Example
///
/// ```
/// use page_inspector::analyzer::{analyze_document, HtmlVersion};
/// use scraper::Html;
///
/// let html = Html::parse_document("<!DOCTYPE html><title>Demo</title><h1>A</h1>");
/// let summary = analyze_document(&html);
/// assert_eq!(summary.title, "Demo");
/// assert_eq!(summary.html_version, HtmlVersion::Html5);
/// assert_eq!(summary.headings.get(1), 1);
/// ```
pub fn analyze_document(document: &Html) -> DocumentSummary {
    DocumentSummary {
        title: extract_title(document),
        html_version: html_version_from_doctype(doctype_text(document).as_deref()),
        headings: count_headings(document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Counts h1..h6 elements anywhere in the document
fn count_headings(document: &Html) -> HeadingCounts {
    let mut counts = HeadingCounts::new();

    if let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") {
        for element in document.select(&selector) {
            let level = match element.value().name() {
                "h1" => 1,
                "h2" => 2,
                "h3" => 3,
                "h4" => 4,
                "h5" => 5,
                "h6" => 6,
                _ => continue,
            };
            counts.increment(level);
        }
    }

    counts
}

/// Renders the document's doctype as `name PUBLIC "public-id" "system-id"`
///
/// Returns None if the document has no doctype.
pub fn doctype_text(document: &Html) -> Option<String> {
    let doctype = document
        .tree
        .root()
        .children()
        .find_map(|child| match child.value() {
            Node::Doctype(doctype) => Some(doctype),
            _ => None,
        })?;

    let mut text = doctype.name().to_string();
    let public_id = doctype.public_id();
    let system_id = doctype.system_id();

    if !public_id.is_empty() {
        text.push_str(&format!(" PUBLIC \"{}\"", public_id));
        if !system_id.is_empty() {
            text.push_str(&format!(" \"{}\"", system_id));
        }
    } else if !system_id.is_empty() {
        text.push_str(&format!(" SYSTEM \"{}\"", system_id));
    }

    Some(text)
}

/// Maps doctype text to an HTML version
///
/// Accepts either the bare doctype content (`html PUBLIC "..."`) or the full
/// declaration (`<!DOCTYPE html PUBLIC "...">`). Matching is case-insensitive
/// and whitespace-insensitive.
///
/// | Doctype | Version |
/// |---------|---------|
/// | absent | Unknown |
/// | `html`, `html SYSTEM "about:legacy-compat"` | HTML5 |
/// | public id with XHTML 1.0 / 1.1 / Basic | XHTML 1.0 / 1.1 / Basic |
/// | public id with HTML 4.01 / 4.0 / 3.2 / 2.0 | same |
/// | any other `//DTD HTML` or `//DTD XHTML` public id | HTML 4.01 |
/// | anything else | Unknown |
pub fn html_version_from_doctype(doctype: Option<&str>) -> HtmlVersion {
    let Some(raw) = doctype else {
        return HtmlVersion::Unknown;
    };

    let lowered = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let text = lowered
        .strip_prefix("<!doctype")
        .unwrap_or(&lowered)
        .trim_end_matches('>')
        .trim();

    if text == "html" || text == r#"html system "about:legacy-compat""# {
        return HtmlVersion::Html5;
    }

    if !text.starts_with("html ") {
        return HtmlVersion::Unknown;
    }

    // Anchored on "dtd " so "dtd xhtml 2.0" never reads as "html 2.0".
    // Longer identifiers first: "dtd html 4.01" also contains "dtd html 4.0".
    const KNOWN: [(&str, HtmlVersion); 7] = [
        ("dtd xhtml 1.0", HtmlVersion::Xhtml10),
        ("dtd xhtml 1.1", HtmlVersion::Xhtml11),
        ("dtd xhtml basic", HtmlVersion::XhtmlBasic),
        ("dtd html 4.01", HtmlVersion::Html401),
        ("dtd html 4.0", HtmlVersion::Html40),
        ("dtd html 3.2", HtmlVersion::Html32),
        ("dtd html 2.0", HtmlVersion::Html20),
    ];

    for (needle, version) in KNOWN {
        if text.contains(needle) {
            return version;
        }
    }

    if text.contains("//dtd html") || text.contains("//dtd xhtml") {
        return HtmlVersion::Html401;
    }

    HtmlVersion::Unknown
}
