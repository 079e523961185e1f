//! HTTP fetching with retry, backoff and rotating client identities.
//!
//! [`Fetcher`] wraps one shared `reqwest::Client` (connection pooling,
//! redirect following, per-request timeout) and layers two retry rules on
//! top of it:
//!
//! - **Transient failures** (connect errors, timeouts, 429/500/502/503/504)
//!   are retried up to `max_transient_retries` times with exponential backoff
//!   and jitter.
//! - **403 Forbidden** gets exactly one more try with a different user agent
//!   after a short pause.
//!
//! Anything that still fails, any terminal non-2xx status, and any response
//! that is not HTML is reported as "no page". Callers never see an error.
//!
//! # Backoff
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=min(base, 250ms))
//! ```

use std::time::Duration;

use rand::{Rng, rng};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Settings;
use crate::error::CrawlError;

/// A successfully fetched HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("terminal HTTP status {0}")]
    Status(u16),

    #[error("not HTML: {0:?}")]
    NotHtml(String),
}

/// Rotating pool of browser user-agent strings.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// An empty list falls back to a single generic identity.
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            vec![concat!("byline_miner/", env!("CARGO_PKG_VERSION")).to_string()]
        } else {
            agents
        };
        Self { agents }
    }

    /// A random identity.
    pub fn pick(&self) -> &str {
        let idx = rng().random_range(0..self.agents.len());
        &self.agents[idx]
    }

    /// A random identity different from `current` when the pool allows it.
    pub fn rotate(&self, current: &str) -> &str {
        let others: Vec<&String> = self.agents.iter().filter(|a| *a != current).collect();
        if others.is_empty() {
            return self.pick();
        }
        others[rng().random_range(0..others.len())]
    }
}

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles with each attempt.
    pub base_delay: Duration,
    /// Cap on a single delay, before jitter.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_cap = self.base_delay.min(Duration::from_millis(250)).as_millis() as u64;
        let jitter_ms: u64 = rng().random_range(0..=jitter_cap);
        delay + Duration::from_millis(jitter_ms)
    }
}

/// Statuses worth retrying with backoff.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// `true` for `text/html` and `application/xhtml+xml`.
pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

/// Shared HTTP fetcher; cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    agents: UserAgentPool,
    retry: RetryPolicy,
    forbidden_delay: Duration,
}

impl Fetcher {
    /// Build a fetcher from crawl settings.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Client`] if the TLS backend cannot be initialized.
    pub fn new(settings: &Settings) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            agents: UserAgentPool::new(settings.user_agents.clone()),
            retry: RetryPolicy::new(
                settings.max_transient_retries,
                Duration::from_millis(settings.backoff_base_ms),
                Duration::from_millis(settings.backoff_max_ms),
            ),
            forbidden_delay: Duration::from_millis(settings.forbidden_retry_delay_ms),
        })
    }

    /// Fetch an HTML page, or `None` on any failure.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        match self.try_fetch(url).await {
            Ok(page) => {
                debug!(status = page.status, bytes = page.body.len(), "Fetched page");
                Some(page)
            }
            Err(e) => {
                debug!(error = %e, "Fetch failed");
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let agent = self.agents.pick();
        let mut response = self.send_with_retry(url, agent).await?;

        if response.status() == StatusCode::FORBIDDEN {
            let rotated = self.agents.rotate(agent);
            debug!("403 received; retrying once with a rotated user agent");
            sleep(self.forbidden_delay).await;
            response = self.send_with_retry(url, rotated).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html_content_type(&content_type) {
            return Err(FetchError::NotHtml(content_type));
        }

        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    async fn send_with_retry(&self, url: &str, agent: &str) -> Result<Response, FetchError> {
        let mut attempt = 0u32;
        loop {
            let result = self.client.get(url).header(USER_AGENT, agent).send().await;
            let retriable = match &result {
                Ok(resp) => is_transient_status(resp.status()),
                Err(e) => is_transient_error(e),
            };
            if !retriable || attempt >= self.retry.max_retries {
                return result.map_err(FetchError::from);
            }

            attempt += 1;
            let delay = self.retry.delay_for(attempt);
            match &result {
                Ok(resp) => debug!(attempt, status = resp.status().as_u16(), ?delay, "Transient status; backing off"),
                Err(e) => debug!(attempt, error = %e, ?delay, "Transient error; backing off"),
            }
            sleep(delay).await;
        }
    }
}
