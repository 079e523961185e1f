//! Per-domain dedup store.
//!
//! [`DomainRegistry`] hands out one [`DomainState`] per outlet domain. The
//! state's lock covers the seen set, the count and the CSV append, so every
//! row it appends is a case-insensitive (author, headline) pair not yet on
//! disk, and `count` is the number of distinct pairs in the file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::models::{pair_key, ArticleRecord};
use crate::outputs::dataset;
use crate::utils::sanitize_filename;

#[derive(Debug, Default)]
struct Ledger {
    seen: HashSet<(String, String)>,
    count: usize,
}

/// Dedup state and output file of one outlet domain.
#[derive(Debug)]
pub struct DomainState {
    domain: String,
    path: PathBuf,
    ledger: Mutex<Ledger>,
}

impl DomainState {
    /// Open the state for `domain`, loading any rows already in `path`.
    ///
    /// An unreadable file is logged and treated as empty.
    pub fn open(domain: &str, path: PathBuf) -> Self {
        let mut ledger = Ledger::default();
        match dataset::read_pairs(&path) {
            Ok(pairs) => {
                ledger.seen = pairs.iter().map(|(a, h)| pair_key(a, h)).collect();
                ledger.count = ledger.seen.len();
                if pairs.len() > ledger.count {
                    warn!(
                        domain,
                        rows = pairs.len(),
                        distinct = ledger.count,
                        "Existing dataset holds duplicate pairs; counting each once"
                    );
                }
                if ledger.count > 0 {
                    info!(domain, rows = ledger.count, path = %path.display(), "Loaded existing dataset");
                }
            }
            Err(e) => warn!(domain, error = %e, "Could not read existing dataset; starting empty"),
        }
        Self {
            domain: domain.to_string(),
            path,
            ledger: Mutex::new(ledger),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Facts recorded so far, including rows loaded at open.
    pub fn count(&self) -> usize {
        self.ledger.lock().count
    }

    pub fn has_seen(&self, author: &str, headline: &str) -> bool {
        self.ledger.lock().seen.contains(&pair_key(author, headline))
    }

    /// Append `record` unless its pair is known or `quota` is already met.
    ///
    /// Returns `true` only when a row was written. Blocks on file I/O.
    pub fn record(&self, record: &ArticleRecord, quota: usize) -> bool {
        let mut ledger = self.ledger.lock();
        if ledger.count >= quota {
            return false;
        }
        let key = record.pair_key();
        if ledger.seen.contains(&key) {
            return false;
        }
        if let Err(e) = dataset::append_row(&self.path, record) {
            error!(domain = %self.domain, url = %record.url, error = %e, "Failed to write fact");
            return false;
        }
        ledger.seen.insert(key);
        ledger.count += 1;
        true
    }
}

/// Lazily created [`DomainState`]s keyed by outlet domain.
#[derive(Debug)]
pub struct DomainRegistry {
    output_dir: PathBuf,
    domains: DashMap<String, Arc<DomainState>>,
}

impl DomainRegistry {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            domains: DashMap::new(),
        }
    }

    /// `<output_dir>/<sanitized_domain>_data.csv`
    pub fn csv_path(&self, domain: &str) -> PathBuf {
        self.output_dir.join(format!("{}_data.csv", sanitize_filename(domain)))
    }

    /// The state for `domain`, created on first use.
    pub fn state(&self, domain: &str) -> Arc<DomainState> {
        if let Some(state) = self.domains.get(domain) {
            return Arc::clone(&state);
        }
        let path = self.csv_path(domain);
        self.domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(DomainState::open(domain, path)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(author: &str, headline: &str) -> ArticleRecord {
        ArticleRecord {
            author: author.to_string(),
            headline: headline.to_string(),
            keywords: vec!["Fire".to_string()],
            topics: vec!["General".to_string()],
            url: format!("https://example.com/{}", headline.len()),
            outlet: "Example".to_string(),
            timestamp: "2025-05-06 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_csv_path_sanitized() {
        let registry = DomainRegistry::new("/data");
        assert_eq!(
            registry.csv_path("127.0.0.1:8080"),
            PathBuf::from("/data/127.0.0.1_8080_data.csv")
        );
    }

    #[test]
    fn test_record_is_idempotent_and_case_insensitive() {
        let dir = tempdir().unwrap();
        let registry = DomainRegistry::new(dir.path());
        let state = registry.state("example.com");

        assert!(state.record(&record("Rahul Sharma", "Fire breaks out downtown"), 10));
        assert!(!state.record(&record("Rahul Sharma", "Fire breaks out downtown"), 10));
        assert!(!state.record(&record("RAHUL SHARMA", "fire breaks out DOWNTOWN"), 10));
        assert!(state.record(&record("Priya Nair", "Fire breaks out downtown"), 10));

        assert_eq!(state.count(), 2);
        assert!(state.has_seen("rahul sharma", "FIRE BREAKS OUT DOWNTOWN"));
        assert_eq!(dataset::row_count(state.path()).unwrap(), state.count());
    }

    #[test]
    fn test_quota_is_never_exceeded() {
        let dir = tempdir().unwrap();
        let registry = DomainRegistry::new(dir.path());
        let state = registry.state("example.com");

        std::thread::scope(|s| {
            for worker in 0..8 {
                let state = &state;
                s.spawn(move || {
                    for i in 0..5 {
                        state.record(&record(&format!("Author {worker}"), &format!("Story {i}")), 7);
                    }
                });
            }
        });

        assert_eq!(state.count(), 7);
        assert_eq!(dataset::row_count(state.path()).unwrap(), 7);
    }

    #[test]
    fn test_state_is_shared_per_domain() {
        let dir = tempdir().unwrap();
        let registry = DomainRegistry::new(dir.path());
        assert!(Arc::ptr_eq(&registry.state("a.com"), &registry.state("a.com")));
        assert!(!Arc::ptr_eq(&registry.state("a.com"), &registry.state("b.com")));
    }

    #[test]
    fn test_existing_rows_are_preloaded() {
        let dir = tempdir().unwrap();
        {
            let registry = DomainRegistry::new(dir.path());
            let state = registry.state("example.com");
            assert!(state.record(&record("Rahul Sharma", "First story"), 10));
            assert!(state.record(&record("Priya Nair", "Second story"), 10));
        }

        let registry = DomainRegistry::new(dir.path());
        let state = registry.state("example.com");
        assert_eq!(state.count(), 2);
        assert!(!state.record(&record("rahul sharma", "first story"), 10));
        assert!(!state.record(&record("Anita Rao", "Third story"), 2));
        assert!(state.record(&record("Anita Rao", "Third story"), 3));
        assert_eq!(dataset::row_count(state.path()).unwrap(), 3);
    }

    #[test]
    fn test_preload_counts_case_variants_once() {
        let dir = tempdir().unwrap();
        let registry = DomainRegistry::new(dir.path());
        let path = registry.csv_path("example.com");
        dataset::append_row(&path, &record("Rahul Sharma", "First story")).unwrap();
        dataset::append_row(&path, &record("RAHUL SHARMA", "FIRST STORY")).unwrap();

        let state = registry.state("example.com");
        assert_eq!(state.count(), 1);
        assert!(state.record(&record("Priya Nair", "Second story"), 2));
        assert!(!state.record(&record("Anita Rao", "Third story"), 2));
    }

    #[test]
    fn test_write_failure_leaves_count_unchanged() {
        let dir = tempdir().unwrap();
        let registry = DomainRegistry::new(dir.path().join("missing-dir"));
        let state = registry.state("example.com");
        assert!(!state.record(&record("Rahul Sharma", "Fire breaks out"), 10));
        assert_eq!(state.count(), 0);
        assert!(!state.has_seen("Rahul Sharma", "Fire breaks out"));
    }
}
