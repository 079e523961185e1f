//! Shared URL frontier.
//!
//! One lock covers the queue and every membership set, so each URL moves
//! `queued → in_flight → visited | failed` exactly once.

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;

use crate::models::FrontierEntry;

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
    visited: HashSet<String>,
    failed: HashSet<String>,
    rejected: usize,
}

impl State {
    fn known(&self, url: &str) -> bool {
        self.queued.contains(url)
            || self.in_flight.contains(url)
            || self.visited.contains(url)
            || self.failed.contains(url)
    }
}

/// Point-in-time frontier counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrontierStats {
    pub queued: usize,
    pub in_flight: usize,
    pub visited: usize,
    pub failed: usize,
    pub rejected: usize,
}

#[derive(Debug)]
pub struct Frontier {
    max_depth: usize,
    /// How many queued entries a worker considers when picking the next one.
    window: usize,
    state: Mutex<State>,
}

impl Frontier {
    pub fn new(max_depth: usize, window: usize) -> Self {
        Self {
            max_depth,
            window: window.max(1),
            state: Mutex::new(State::default()),
        }
    }

    /// `true` if `url` has never been queued, dispatched or finished.
    pub fn is_unseen(&self, url: &str) -> bool {
        !self.state.lock().known(url)
    }

    /// Queue `entry` unless it is too deep or already known.
    pub fn push(&self, entry: FrontierEntry) -> bool {
        let mut state = self.state.lock();
        if entry.depth > self.max_depth || state.known(&entry.url) {
            state.rejected += 1;
            return false;
        }
        state.queued.insert(entry.url.clone());
        state.queue.push_back(entry);
        true
    }

    /// Queue every admissible entry; returns how many were queued.
    pub fn extend(&self, entries: impl IntoIterator<Item = FrontierEntry>) -> usize {
        entries.into_iter().map(|e| self.push(e)).filter(|queued| *queued).count()
    }

    /// Take the best entry of the dispatch window and mark it in flight.
    ///
    /// Best is highest priority, then shallowest, then oldest.
    pub fn pop(&self) -> Option<FrontierEntry> {
        let mut state = self.state.lock();
        let best = state
            .queue
            .iter()
            .take(self.window)
            .enumerate()
            .min_by_key(|(i, e)| (std::cmp::Reverse(e.priority), e.depth, *i))
            .map(|(i, _)| i)?;
        let entry = state.queue.remove(best)?;
        state.queued.remove(&entry.url);
        state.in_flight.insert(entry.url.clone());
        Some(entry)
    }

    /// Finish a dispatched URL as visited.
    ///
    /// `final_url` is the post-redirect address; it is marked visited too
    /// so the same page is not fetched again under its canonical URL.
    pub fn mark_visited(&self, url: &str, final_url: Option<&str>) {
        let mut state = self.state.lock();
        state.in_flight.remove(url);
        state.visited.insert(url.to_string());
        if let Some(final_url) = final_url
            && final_url != url
            && !state.known(final_url)
        {
            state.visited.insert(final_url.to_string());
        }
    }

    /// Finish a dispatched URL as failed. Failed URLs are never retried.
    pub fn mark_failed(&self, url: &str) {
        let mut state = self.state.lock();
        state.in_flight.remove(url);
        state.failed.insert(url.to_string());
    }

    /// Drop a dispatched URL that was interrupted by shutdown.
    pub fn abandon(&self, url: &str) {
        self.state.lock().in_flight.remove(url);
    }

    /// Nothing queued and nothing in flight that could queue more.
    pub fn is_exhausted(&self) -> bool {
        let state = self.state.lock();
        state.queue.is_empty() && state.in_flight.is_empty()
    }

    pub fn stats(&self) -> FrontierStats {
        let state = self.state.lock();
        FrontierStats {
            queued: state.queue.len(),
            in_flight: state.in_flight.len(),
            visited: state.visited.len(),
            failed: state.failed.len(),
            rejected: state.rejected,
        }
    }
}
