//! # Byline Miner
//!
//! Crawls a news site from its homepage and builds an
//! author → headline → topic dataset. Each article page yields a headline
//! and one or more validated bylines; every new (author, headline) pair is
//! classified by keyword and topic and appended to a per-domain CSV file.
//!
//! ## Pipeline
//!
//! 1. **Frontier**: same-domain URLs, likely articles first, bounded by depth
//! 2. **Fetch**: shared client with backoff and user-agent rotation
//! 3. **Extract**: headline cascade and byline candidates
//! 4. **Validate**: reject timestamps, desks, outlet names and credits
//! 5. **Classify**: keywords and a fixed topic taxonomy
//! 6. **Store**: case-insensitive dedup, stop at the article quota
//!
//! ```no_run
//! # async fn demo() -> Result<(), byline_miner::CrawlError> {
//! let summary = byline_miner::crawl("https://www.example-news.com/", "Example News", 100, 12, 4).await?;
//! println!("{} facts in {}", summary.articles, summary.output_file.display());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod links;
pub mod models;
pub mod outputs;
pub mod store;
pub mod utils;
pub mod validate;

pub use classify::LanguagePipeline;
pub use config::Settings;
pub use crawler::{Crawler, ShutdownHandle};
pub use error::{ConfigError, CrawlError, StoreError};
pub use models::{ArticleRecord, CrawlJob, CrawlSummary, StopReason};

/// Crawl `homepage_url` with default [`Settings`].
///
/// # Errors
///
/// [`CrawlError::InvalidHomepage`] for a non-http(s) or hostless URL and
/// [`CrawlError::OutputDir`] when the output directory is not writable.
pub async fn crawl(
    homepage_url: &str,
    outlet_name: &str,
    max_articles: usize,
    max_workers: usize,
    max_depth: usize,
) -> Result<CrawlSummary, CrawlError> {
    crawl_with(
        Settings::default(),
        homepage_url,
        outlet_name,
        max_articles,
        max_workers,
        max_depth,
    )
    .await
}

/// [`crawl`] with explicit settings.
pub async fn crawl_with(
    settings: Settings,
    homepage_url: &str,
    outlet_name: &str,
    max_articles: usize,
    max_workers: usize,
    max_depth: usize,
) -> Result<CrawlSummary, CrawlError> {
    let job = CrawlJob::new(homepage_url, outlet_name, max_articles, max_workers, max_depth)?
        .with_timeout(settings.job_timeout());
    Crawler::new(settings)?.run(job).await
}
