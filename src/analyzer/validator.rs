//! Link reachability validation
//!
//! This module probes every classified link and reports the broken ones:
//! - HEAD first, GET when HEAD is answered with 405 or 501
//! - A semaphore caps the number of probes in flight; a permit is acquired
//!   before a probe task is spawned
//! - Each probe has its own timeout and redirect bound (set on the client)
//! - A global deadline stops the pool; links still pending are left out
//!
//! One probe failing never affects the others.

use crate::analyzer::fetcher::describe_request_error;
use crate::analyzer::links::ClassifiedLink;
use crate::analyzer::report::{BrokenLink, ProbeFailure};
use crate::config::{UserAgentConfig, ValidatorConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Outcome of probing a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A response with status < 400 was received
    Reachable(u16),

    /// The link is broken
    Broken(ProbeFailure),
}

/// Builds the HTTP client used for link probes
///
/// The client carries the per-probe timeout and the probe redirect bound, so
/// both apply to every request it sends.
pub fn build_probe_client(
    user_agent: &UserAgentConfig,
    config: &ValidatorConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(config.probe_timeout())
        .connect_timeout(config.probe_timeout())
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Probes links with bounded concurrency
#[derive(Debug, Clone)]
pub struct LinkValidator {
    client: Client,
    concurrency: usize,
    deadline: Duration,
}

impl LinkValidator {
    /// Creates a validator
    ///
    /// # Arguments
    ///
    /// * `client` - Probe client (timeouts and redirect policy already set)
    /// * `concurrency` - Maximum probes in flight; values below 1 are raised to 1
    /// * `deadline` - Global time budget for one `validate` call
    pub fn new(client: Client, concurrency: usize, deadline: Duration) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
            deadline,
        }
    }

    /// Builds a validator with its own probe client
    pub fn from_config(
        user_agent: &UserAgentConfig,
        config: &ValidatorConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_probe_client(user_agent, config)?,
            config.max_concurrent_probes,
            config.deadline(),
        ))
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    /// Probes every link and returns the broken ones, sorted by URL
    ///
    /// Links whose probe has not settled when the deadline passes are treated
    /// as undetermined and are not reported.
    pub async fn validate(&self, links: &[ClassifiedLink]) -> Vec<BrokenLink> {
        let mut queue: VecDeque<String> =
            links.iter().map(|l| l.absolute_url.clone()).collect();
        let total = queue.len();
        let mut broken = Vec::new();

        if total == 0 {
            return broken;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut in_flight = JoinSet::new();
        let mut settled = 0usize;

        let deadline = tokio::time::sleep_until(Instant::now() + self.deadline);
        tokio::pin!(deadline);

        tracing::debug!(
            "Validating {} links with up to {} concurrent probes",
            total,
            self.concurrency
        );

        loop {
            if queue.is_empty() && in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = &mut deadline => {
                    tracing::warn!(
                        "Validation deadline of {:?} reached; {} of {} links undetermined",
                        self.deadline,
                        total - settled,
                        total
                    );
                    in_flight.abort_all();
                    break;
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    settled += 1;
                    match joined {
                        Ok((url, ProbeOutcome::Broken(reason))) => {
                            tracing::debug!("Broken link {}: {}", url, reason);
                            broken.push(BrokenLink::new(url, reason));
                        }
                        Ok((url, ProbeOutcome::Reachable(status))) => {
                            tracing::trace!("Link {} reachable ({})", url, status);
                        }
                        Err(e) => {
                            tracing::warn!("Probe task failed: {}", e);
                        }
                    }
                }

                permit = semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    let Ok(permit) = permit else {
                        break;
                    };
                    if let Some(url) = queue.pop_front() {
                        let client = self.client.clone();
                        in_flight.spawn(async move {
                            let _permit = permit;
                            let outcome = probe_link(&client, &url).await;
                            (url, outcome)
                        });
                    }
                }
            }
        }

        broken.sort_by(|a, b| a.url.cmp(&b.url));

        tracing::debug!(
            "Validation finished: {} settled, {} broken",
            settled,
            broken.len()
        );

        broken
    }
}

/// Probes one link
///
/// Sends HEAD and falls back to GET when the server rejects HEAD with 405
/// (Method Not Allowed) or 501 (Not Implemented).
pub async fn probe_link(client: &Client, url: &str) -> ProbeOutcome {
    match client.head(url).send().await {
        Ok(response)
            if matches!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) =>
        {
            tracing::trace!("HEAD rejected by {} ({}), retrying with GET", url, response.status());
            match client.get(url).send().await {
                Ok(response) => outcome_for_status(response.status().as_u16()),
                Err(e) => outcome_for_error(&e),
            }
        }
        Ok(response) => outcome_for_status(response.status().as_u16()),
        Err(e) => outcome_for_error(&e),
    }
}

fn outcome_for_status(status: u16) -> ProbeOutcome {
    if status >= 400 {
        ProbeOutcome::Broken(ProbeFailure::HttpStatus(status))
    } else {
        ProbeOutcome::Reachable(status)
    }
}

fn outcome_for_error(error: &reqwest::Error) -> ProbeOutcome {
    let failure = if error.is_timeout() {
        ProbeFailure::Timeout
    } else if error.is_redirect() {
        ProbeFailure::RedirectLimit
    } else {
        ProbeFailure::ConnectionFailure(describe_request_error(error))
    };
    ProbeOutcome::Broken(failure)
}
