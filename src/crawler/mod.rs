//! Frontier scheduler and worker pool.
//!
//! A crawl runs `max_workers` long-lived tasks over one shared
//! [`Frontier`]. Each worker loops: pop the best entry of the dispatch
//! window, wait a random politeness delay, fetch, then parse and mine the
//! page on the blocking pool and queue what it links to. The crawl stops
//! when the domain quota is met, the frontier is exhausted, the job timeout
//! fires, or [`ShutdownHandle::trigger`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use rand::{Rng, rng};
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::classify::LanguagePipeline;
use crate::config::Settings;
use crate::error::CrawlError;
use crate::fetch::Fetcher;
use crate::links::clean_url;
use crate::models::{CrawlJob, CrawlSummary, FrontierEntry, NAVIGATION_PRIORITY, StopReason};
use crate::store::{DomainRegistry, DomainState};
use crate::utils::ensure_writable_dir;

pub mod frontier;
mod worker;

pub use frontier::{Frontier, FrontierStats};

use worker::{PageContext, process_page};

/// Idle workers re-check the frontier at least this often.
const IDLE_POLL: Duration = Duration::from_millis(120);

/// Cooperative stop signal shared by every task of a crawl.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    flag: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn triggered(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

struct AbortTaskOnDrop(tokio::task::AbortHandle);

impl Drop for AbortTaskOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// State shared by the workers of one run.
struct Run {
    job: Arc<CrawlJob>,
    state: Arc<DomainState>,
    frontier: Arc<Frontier>,
    fetcher: Arc<Fetcher>,
    page: PageContext,
    politeness_ms: [u64; 2],
    stop: ShutdownHandle,
    reason: Mutex<Option<StopReason>>,
    work: Notify,
    written: AtomicUsize,
}

impl Run {
    /// First reason wins.
    fn finish(&self, reason: StopReason) {
        self.reason.lock().get_or_insert(reason);
        self.stop.trigger();
    }

    fn politeness_delay(&self) -> Duration {
        let [lo, hi] = self.politeness_ms;
        Duration::from_millis(if hi > lo { rng().random_range(lo..=hi) } else { lo })
    }

    async fn worker_loop(self: Arc<Self>, id: usize) {
        debug!(worker = id, "Worker started");
        loop {
            if self.stop.is_triggered() {
                break;
            }
            if self.state.count() >= self.job.max_articles {
                self.finish(StopReason::QuotaReached);
                break;
            }

            let Some(entry) = self.frontier.pop() else {
                if self.frontier.is_exhausted() {
                    self.finish(StopReason::FrontierExhausted);
                    break;
                }
                tokio::select! {
                    _ = self.work.notified() => {}
                    _ = self.stop.triggered() => {}
                    _ = sleep(IDLE_POLL) => {}
                }
                continue;
            };

            self.visit(entry).await;
            self.work.notify_waiters();
        }
        debug!(worker = id, "Worker stopped");
    }

    async fn visit(&self, entry: FrontierEntry) {
        let page = tokio::select! {
            page = async {
                sleep(self.politeness_delay()).await;
                self.fetcher.fetch(&entry.url).await
            } => page,
            _ = self.stop.triggered() => {
                self.frontier.abandon(&entry.url);
                return;
            }
        };

        let Some(page) = page else {
            debug!(url = %entry.url, "Marking URL failed");
            self.frontier.mark_failed(&entry.url);
            return;
        };

        let final_url = clean_url(&page.url).to_string();
        let ctx = self.page.clone();
        let frontier = Arc::clone(&self.frontier);
        let blocking_entry = entry.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            process_page(&ctx, &blocking_entry, &page.url, &page.body, |url| {
                frontier.is_unseen(url)
            })
        })
        .await;

        match outcome {
            Ok(outcome) => {
                self.written.fetch_add(outcome.written, Ordering::Relaxed);
                let queued = self.frontier.extend(outcome.links);
                debug!(url = %entry.url, queued, written = outcome.written, "Processed page");
            }
            Err(e) => warn!(url = %entry.url, error = %e, "Page processing task failed"),
        }
        // links are queued before the entry leaves in-flight, so idle
        // workers never observe a falsely exhausted frontier
        self.frontier.mark_visited(&entry.url, Some(&final_url));
    }
}

/// Crawls outlets with shared settings, HTTP client and dedup registry.
pub struct Crawler {
    settings: Settings,
    fetcher: Arc<Fetcher>,
    registry: Arc<DomainRegistry>,
    pipeline: Option<Arc<dyn LanguagePipeline>>,
    shutdown: ShutdownHandle,
}

impl Crawler {
    /// # Errors
    ///
    /// [`CrawlError::Client`] if the HTTP client cannot be built.
    pub fn new(settings: Settings) -> Result<Self, CrawlError> {
        let fetcher = Arc::new(Fetcher::new(&settings)?);
        let registry = Arc::new(DomainRegistry::new(settings.output_dir.clone()));
        Ok(Self {
            settings,
            fetcher,
            registry,
            pipeline: None,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Use `pipeline` for keyword extraction instead of the fallback.
    pub fn with_pipeline(mut self, pipeline: Arc<dyn LanguagePipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// Handle that cancels any running and future crawls of this crawler.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Crawl one outlet until its quota, exhaustion, timeout or cancellation.
    ///
    /// # Errors
    ///
    /// [`CrawlError::OutputDir`] when the output directory is not writable.
    /// Failures after the crawl starts are logged and skipped.
    #[instrument(level = "info", skip_all, fields(domain = %job.outlet_domain))]
    pub async fn run(&self, job: CrawlJob) -> Result<CrawlSummary, CrawlError> {
        let started = Instant::now();
        let output_dir = &self.settings.output_dir;
        ensure_writable_dir(output_dir).map_err(|source| CrawlError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let state = self.registry.state(&job.outlet_domain);
        let preexisting = state.count();
        let frontier = Arc::new(Frontier::new(
            job.max_depth,
            self.settings.window_multiplier * job.max_workers,
        ));
        frontier.push(FrontierEntry::new(
            clean_url(&job.homepage).to_string(),
            0,
            NAVIGATION_PRIORITY,
        ));

        info!(
            homepage = %job.homepage,
            max_articles = job.max_articles,
            max_workers = job.max_workers,
            max_depth = job.max_depth,
            preexisting,
            "Starting crawl"
        );

        let job = Arc::new(job);
        let run = Arc::new(Run {
            page: PageContext {
                job: Arc::clone(&job),
                state: Arc::clone(&state),
                pipeline: self.pipeline.clone(),
                links_per_page: self.settings.links_per_page,
            },
            job: Arc::clone(&job),
            state: Arc::clone(&state),
            frontier: Arc::clone(&frontier),
            fetcher: Arc::clone(&self.fetcher),
            politeness_ms: self.settings.politeness_delay_ms,
            stop: ShutdownHandle::new(),
            reason: Mutex::new(None),
            work: Notify::new(),
            written: AtomicUsize::new(0),
        });

        if self.shutdown.is_triggered() {
            run.finish(StopReason::Cancelled);
        }

        let watcher_run = Arc::clone(&run);
        let cancel = self.shutdown.clone();
        let timeout = job.timeout;
        let watcher = tokio::spawn(async move {
            let expired = async {
                match timeout {
                    Some(limit) => sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = cancel.triggered() => watcher_run.finish(StopReason::Cancelled),
                _ = expired => {
                    warn!(?timeout, "Job timeout reached");
                    watcher_run.finish(StopReason::TimedOut);
                }
                _ = watcher_run.stop.triggered() => {}
            }
        });
        let _watcher_guard = AbortTaskOnDrop(watcher.abort_handle());

        let workers = (0..job.max_workers).map(|id| tokio::spawn(Arc::clone(&run).worker_loop(id)));
        for result in join_all(workers).await {
            if let Err(e) = result {
                warn!(error = %e, "Worker task failed");
            }
        }

        let stop_reason = (*run.reason.lock()).unwrap_or(StopReason::FrontierExhausted);
        let stats = frontier.stats();
        let summary = CrawlSummary {
            outlet: job.outlet_name.clone(),
            domain: job.outlet_domain.clone(),
            output_file: state.path().to_path_buf(),
            articles: state.count(),
            written: run.written.load(Ordering::Relaxed),
            pages_visited: stats.visited,
            pages_failed: stats.failed,
            urls_rejected: stats.rejected,
            elapsed_secs: started.elapsed().as_secs_f64(),
            stop_reason,
        };
        info!(
            articles = summary.articles,
            written = summary.written,
            visited = summary.pages_visited,
            failed = summary.pages_failed,
            stop_reason = ?summary.stop_reason,
            elapsed_secs = summary.elapsed_secs,
            "Crawl finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_handle_wakes_waiters() {
        let handle = ShutdownHandle::new();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.triggered().await })
        };
        tokio::task::yield_now().await;
        assert!(!handle.is_triggered());
        handle.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .unwrap();
    }

    #[tokio::test]
    async fn test_triggered_returns_immediately_when_already_set() {
        let handle = ShutdownHandle::new();
        handle.trigger();
        tokio::time::timeout(Duration::from_millis(100), handle.triggered())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            output_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let crawler = Crawler::new(settings).unwrap();
        crawler.shutdown_handle().trigger();

        let job = CrawlJob::new("http://127.0.0.1:9/", "Local", 5, 2, 1).unwrap();
        let summary = crawler.run(job).await.unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.written, 0);
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_fails_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let settings = Settings {
            output_dir: file,
            ..Settings::default()
        };
        let crawler = Crawler::new(settings).unwrap();
        let job = CrawlJob::new("http://127.0.0.1:9/", "Local", 5, 2, 1).unwrap();
        assert!(matches!(crawler.run(job).await, Err(CrawlError::OutputDir { .. })));
    }
}
