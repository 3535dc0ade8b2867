//! Default proxy pool: fixed set of proxies, shared liveness table.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use super::{Proxy, ProxyEntry, ProxyOutcome, ProxySource, SelectionStrategy};

/// Thread-safe proxy pool shared by all workers.
///
/// Selection takes the read lock only; `report` takes the write lock so that
/// liveness changes are serialized.
#[derive(Debug)]
pub struct ProxyPool {
    entries: RwLock<Vec<ProxyEntry>>,
    selections: Vec<AtomicU64>,
    cursor: AtomicUsize,
    strategy: SelectionStrategy,
    max_failures: u32,
}

impl ProxyPool {
    /// Consecutive failures after which a proxy is marked dead unless configured otherwise.
    pub const DEFAULT_MAX_FAILURES: u32 = 3;

    pub fn new(proxies: Vec<Proxy>, strategy: SelectionStrategy) -> Self {
        let selections = proxies.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            entries: RwLock::new(proxies.into_iter().map(ProxyEntry::new).collect()),
            selections,
            cursor: AtomicUsize::new(0),
            strategy,
            max_failures: Self::DEFAULT_MAX_FAILURES,
        }
    }

    /// Pool with no proxies: `get` always returns `None` (direct connections).
    pub fn empty() -> Self {
        Self::new(Vec::new(), SelectionStrategy::default())
    }

    /// Consecutive failures before a proxy is marked dead (minimum 1).
    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Number of proxies currently marked alive.
    pub fn live_count(&self) -> usize {
        self.read_entries().iter().filter(|e| e.alive).count()
    }

    pub fn is_alive(&self, proxy: &Proxy) -> Option<bool> {
        self.read_entries()
            .iter()
            .find(|e| &e.proxy == proxy)
            .map(|e| e.alive)
    }

    /// Copy of the liveness table, for status output and tests.
    pub fn snapshot(&self) -> Vec<ProxyEntry> {
        self.read_entries().clone()
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Vec<ProxyEntry>> {
        // A poisoned lock only means a reporter panicked mid-update; the counters are still usable.
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProxySource for ProxyPool {
    fn get(&self) -> Option<Proxy> {
        let entries = self.read_entries();
        if entries.is_empty() {
            return None;
        }
        let live: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].alive).collect();
        let candidates = if live.is_empty() {
            tracing::debug!("all {} proxies dead; selecting from full set", entries.len());
            (0..entries.len()).collect()
        } else {
            live
        };
        let idx = self
            .strategy
            .pick(&entries, &self.selections, &candidates, &self.cursor);
        self.selections[idx].fetch_add(1, Ordering::Relaxed);
        Some(entries[idx].proxy.clone())
    }

    fn report(&self, proxy: &Proxy, outcome: ProxyOutcome) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let Some(entry) = entries.iter_mut().find(|e| &e.proxy == proxy) else {
            // Proxy pinned on a work item but not part of this pool.
            return;
        };
        match outcome {
            ProxyOutcome::Success => {
                entry.total_successes = entry.total_successes.saturating_add(1);
                entry.consecutive_failures = 0;
                if !entry.alive {
                    entry.alive = true;
                    tracing::info!(proxy = %entry.proxy, "proxy revived after success");
                }
            }
            ProxyOutcome::Failure => {
                entry.total_failures = entry.total_failures.saturating_add(1);
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                entry.last_failure_at = Some(Instant::now());
                if entry.alive && entry.consecutive_failures >= self.max_failures {
                    entry.alive = false;
                    tracing::warn!(
                        proxy = %entry.proxy,
                        failures = entry.consecutive_failures,
                        "proxy marked dead"
                    );
                }
            }
        }
    }
}
