//! Data models for a crawl job and the facts it produces.
//!
//! - [`CrawlJob`]: the immutable description of one crawl
//! - [`FrontierEntry`]: a URL waiting in the frontier
//! - [`ArticleRecord`]: one (author, headline) fact ready to persist
//! - [`CrawlSummary`]: what a finished crawl reports back

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CrawlError;
use crate::utils::outlet_domain;

/// One crawl invocation. Built once, then shared read-only by the scheduler
/// and its workers.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// The seed URL the frontier starts from.
    pub homepage: Url,
    /// Human-readable outlet name written into every row.
    pub outlet_name: String,
    /// Normalized host (no `www.`) every crawled URL must belong to.
    pub outlet_domain: String,
    /// Stop once this many facts have been recorded for the domain.
    pub max_articles: usize,
    /// Size of the worker pool.
    pub max_workers: usize,
    /// Deepest link distance from the homepage that may be dispatched.
    pub max_depth: usize,
    /// Optional wall-clock ceiling for the whole crawl.
    pub timeout: Option<Duration>,
}

impl CrawlJob {
    /// Validate the homepage and derive the outlet domain.
    ///
    /// An empty `outlet_name` falls back to the outlet domain, and a zero
    /// worker count is raised to one.
    ///
    /// # Errors
    ///
    /// [`CrawlError::InvalidHomepage`] when the URL does not parse, is not
    /// http(s), or has no host.
    pub fn new(
        homepage_url: &str,
        outlet_name: &str,
        max_articles: usize,
        max_workers: usize,
        max_depth: usize,
    ) -> Result<Self, CrawlError> {
        let invalid = |reason: &str| CrawlError::InvalidHomepage {
            url: homepage_url.to_string(),
            reason: reason.to_string(),
        };

        let homepage = Url::parse(homepage_url.trim()).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(homepage.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let domain = outlet_domain(&homepage).ok_or_else(|| invalid("missing host"))?;
        let outlet_name = match outlet_name.trim() {
            "" => domain.clone(),
            name => name.to_string(),
        };

        Ok(Self {
            homepage,
            outlet_name,
            outlet_domain: domain,
            max_articles,
            max_workers: max_workers.max(1),
            max_depth,
            timeout: None,
        })
    }

    /// Attach a job-level timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Priority given to URLs the link classifier thinks are articles.
pub const ARTICLE_PRIORITY: u8 = 2;
/// Priority given to everything else (section fronts, indexes, ...).
pub const NAVIGATION_PRIORITY: u8 = 1;

/// A URL waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
    pub priority: u8,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: usize, priority: u8) -> Self {
        Self {
            url: url.into(),
            depth,
            priority,
        }
    }

    pub fn is_likely_article(&self) -> bool {
        self.priority >= ARTICLE_PRIORITY
    }
}

/// A validated (author, headline) fact with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub author: String,
    pub headline: String,
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub url: String,
    pub outlet: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl ArticleRecord {
    /// The case-insensitive key the dedup store uses.
    pub fn pair_key(&self) -> (String, String) {
        pair_key(&self.author, &self.headline)
    }
}

pub(crate) fn pair_key(author: &str, headline: &str) -> (String, String) {
    (author.to_lowercase(), headline.to_lowercase())
}

/// Why the scheduler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    QuotaReached,
    FrontierExhausted,
    TimedOut,
    Cancelled,
}

/// Counters reported when a crawl finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub outlet: String,
    pub domain: String,
    pub output_file: PathBuf,
    /// Facts recorded for the domain, including rows loaded from a previous run.
    pub articles: usize,
    /// Facts written by this crawl.
    pub written: usize,
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub urls_rejected: usize,
    pub elapsed_secs: f64,
    pub stop_reason: StopReason,
}
