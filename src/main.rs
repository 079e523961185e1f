//! # Byline Miner
//!
//! Command-line entry point: crawl one news outlet and print the crawl
//! summary as JSON.
//!
//! ## Usage
//!
//! ```sh
//! byline_miner https://www.ndtv.com/ --outlet NDTV -o ./data
//! ```
//!
//! Ctrl-C stops the crawl cleanly; facts already written stay on disk.

use std::error::Error;

use clap::Parser;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use byline_miner::outputs::{dataset, summary};
use byline_miner::utils::ensure_writable_dir;
use byline_miner::{CrawlJob, Crawler, Settings};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("byline_miner starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // --- Settings: defaults < config file < flags ---
    let base = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let settings = args.apply(base);
    settings.validate()?;

    // Early check: an unwritable output dir would silently drop every fact
    if let Err(e) = ensure_writable_dir(&settings.output_dir) {
        error!(
            path = %settings.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let job = CrawlJob::new(
        &args.homepage,
        &args.outlet,
        args.max_articles,
        args.max_workers,
        args.max_depth,
    )?
    .with_timeout(settings.job_timeout());

    let crawler = Crawler::new(settings)?;
    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping crawl");
            shutdown.trigger();
        }
    });

    let result = crawler.run(job).await?;

    if !dataset::has_results(&result.output_file) {
        warn!(path = %result.output_file.display(), "Crawl finished without any facts");
    }

    if let Some(path) = &args.summary_file {
        summary::write_summary(&result, path).await?;
    }
    println!("{}", summary::render(&result)?);

    info!(
        articles = result.articles,
        elapsed_secs = result.elapsed_secs,
        "byline_miner finished"
    );
    Ok(())
}
