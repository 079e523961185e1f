use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a crawl before it starts.
///
/// Everything that goes wrong once the crawl is running (fetch failures,
/// extraction misses, write errors) is logged and skipped instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid homepage URL \"{url}\": {reason}")]
    InvalidHomepage { url: String, reason: String },

    #[error("output directory {path} is not writable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A language pipeline could not annotate a headline.
#[derive(Debug, Error)]
#[error("language pipeline failed: {0}")]
pub struct PipelineError(pub String);
