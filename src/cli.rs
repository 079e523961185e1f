//! Command-line interface definitions for Byline Miner.
//!
//! Every option can also be set through an environment variable. Flags
//! override the YAML config file, which overrides the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use byline_miner::Settings;

/// Command-line arguments for one crawl.
///
/// # Examples
///
/// ```sh
/// # Crawl up to 100 facts with the defaults
/// byline_miner https://www.ndtv.com/ --outlet NDTV
///
/// # Smaller, shallower crawl into ./data with a five minute ceiling
/// byline_miner https://www.thehindu.com/ -n 20 -w 4 -d 2 -o ./data --job-timeout-secs 300
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Homepage URL the crawl starts from
    #[arg(env = "BYLINE_HOMEPAGE")]
    pub homepage: String,

    /// Outlet name written into every row (defaults to the domain)
    #[arg(long, env = "BYLINE_OUTLET", default_value = "")]
    pub outlet: String,

    /// Stop after this many facts for the domain
    #[arg(short = 'n', long, env = "BYLINE_MAX_ARTICLES", default_value_t = 100)]
    pub max_articles: usize,

    /// Concurrent fetch workers
    #[arg(short = 'w', long, env = "BYLINE_MAX_WORKERS", default_value_t = 12)]
    pub max_workers: usize,

    /// Deepest link distance from the homepage
    #[arg(short = 'd', long, env = "BYLINE_MAX_DEPTH", default_value_t = 4)]
    pub max_depth: usize,

    /// Directory for the per-domain CSV files
    #[arg(short, long, env = "BYLINE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Optional path to a YAML settings file
    #[arg(short, long, env = "BYLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Wall-clock ceiling for the crawl in seconds
    #[arg(long, env = "BYLINE_JOB_TIMEOUT_SECS")]
    pub job_timeout_secs: Option<u64>,

    /// Also write the crawl summary as JSON to this file
    #[arg(long, env = "BYLINE_SUMMARY_FILE")]
    pub summary_file: Option<PathBuf>,
}

impl Cli {
    /// Apply flag overrides on top of file or default settings.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.job_timeout_secs.is_some() {
            settings.job_timeout_secs = self.job_timeout_secs;
        }
        settings
    }
}
