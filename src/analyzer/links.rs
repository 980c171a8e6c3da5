//! Link extraction and internal/external classification
//!
//! This module enumerates `<a href>` elements, resolves them to absolute URLs,
//! and classifies each unique URL as internal (same host as the page) or
//! external.
//!
//! **Excluded:**
//! - Empty hrefs and fragment-only links (`#section`)
//! - `javascript:`, `mailto:`, `tel:` and `data:` links
//! - Hrefs that fail to resolve, or resolve to a non-HTTP(S) scheme

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// A unique link found on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassifiedLink {
    /// Resolved absolute URL, without fragment
    pub absolute_url: String,

    /// Whether the link points at the page's own host
    pub is_internal: bool,
}

/// The deduplicated link set of one page, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLinks {
    links: Vec<ClassifiedLink>,
}

impl ClassifiedLinks {
    pub fn links(&self) -> &[ClassifiedLink] {
        &self.links
    }

    pub fn internal_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_internal).count()
    }

    pub fn external_count(&self) -> usize {
        self.links.iter().filter(|l| !l.is_internal).count()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Extracts and classifies the anchors of a document
///
/// Relative hrefs resolve against the document's `<base href>` when present,
/// otherwise against `page_url`. Internal means the resolved host equals the
/// host of `page_url` (ASCII case-insensitive, subdomains are external).
///
/// # Example
///
/// ```
/// use page_inspector::analyzer::classify_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/about">A</a><a href="/about">again</a>"#);
/// let page = Url::parse("https://example.com/").unwrap();
/// let links = classify_links(&html, &page);
/// assert_eq!(links.internal_count(), 1);
/// assert_eq!(links.external_count(), 0);
/// ```
pub fn classify_links(document: &Html, page_url: &Url) -> ClassifiedLinks {
    let base_url = document_base(document, page_url);
    let page_host = page_url.host_str().map(|h| h.to_ascii_lowercase());

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute_url) = resolve_link(href, &base_url) else {
                continue;
            };

            let key = absolute_url.to_string();
            if !seen.insert(key.clone()) {
                continue;
            }

            let is_internal = match (&page_host, absolute_url.host_str()) {
                (Some(page), Some(host)) => page.eq_ignore_ascii_case(host),
                _ => false,
            };

            links.push(ClassifiedLink {
                absolute_url: key,
                is_internal,
            });
        }
    }

    tracing::debug!(
        "Classified {} unique links on {} ({} internal)",
        links.len(),
        page_url,
        links.iter().filter(|l| l.is_internal).count()
    );

    ClassifiedLinks { links }
}

/// Returns the URL relative links resolve against
///
/// The first `<base href>` wins if it resolves; otherwise the page URL.
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .filter(|base| matches!(base.scheme(), "http" | "https"))
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded. The fragment of the result is
/// removed so `/about#team` and `/about` are the same link.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if !matches!(absolute_url.scheme(), "http" | "https") {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url)
}
