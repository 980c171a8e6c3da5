//! HTTP fetcher for the target page
//!
//! This module handles the single page fetch of a run:
//! - Building the page HTTP client with the configured user agent, timeout
//!   and redirect bound
//! - Following redirects and recording the final URL
//! - Classifying failures into unreachable, HTTP status and parse errors
//!
//! There are no retries at this layer.

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::AnalysisError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use url::Url;

/// A successfully fetched page body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code of the final response
    pub status_code: u16,

    /// Decoded page body
    pub body: String,
}

impl FetchedPage {
    /// Parses the body into an HTML document
    ///
    /// The returned document is not `Send`; keep it out of `.await` points.
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Builds the HTTP client used for page fetches
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `config` - Timeout and redirect settings for the page fetch
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_page_client(
    user_agent: &UserAgentConfig,
    config: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(config.timeout())
        .connect_timeout(config.timeout())
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches target pages with a pre-built client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with its own page client
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &FetcherConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_page_client(user_agent, config)?))
    }

    /// Fetches a page
    ///
    /// # Error Mapping
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | DNS/connect failure, timeout, redirect chain too long | `Unreachable` |
    /// | Final status >= 400 | `HttpStatus` |
    /// | Declared non-HTML Content-Type, undecodable body | `Parse` |
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, AnalysisError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AnalysisError::Unreachable {
                url: url.to_string(),
                reason: describe_request_error(&e),
            })?;

        let status = response.status();
        let final_url = response.url().clone();

        if final_url != *url {
            tracing::debug!("{} redirected to {}", url, final_url);
        }

        if status.as_u16() >= 400 {
            return Err(AnalysisError::HttpStatus {
                url: final_url.to_string(),
                code: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !is_html_content_type(content_type.as_deref()) {
            return Err(AnalysisError::Parse {
                url: final_url.to_string(),
                message: format!(
                    "expected HTML, got {}",
                    content_type.unwrap_or_default()
                ),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Unreachable {
                    url: final_url.to_string(),
                    reason: describe_request_error(&e),
                }
            } else {
                AnalysisError::Parse {
                    url: final_url.to_string(),
                    message: "body could not be decoded".to_string(),
                }
            }
        })?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}

/// Returns true if the Content-Type allows HTML parsing
///
/// A missing header is accepted; servers often omit it for HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return true;
    };

    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Reduces a reqwest error to a fixed, user-presentable phrase
pub(crate) fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        "request failed".to_string()
    }
}
