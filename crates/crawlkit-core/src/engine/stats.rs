//! Per-item outcome counters shared by all workers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Terminal state of one dequeued work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Downloaded, handled, transformed and delivered to the consumer set.
    Consumed,
    /// Transport failure; handler and pipeline were skipped.
    DownloadFailed,
    /// Pipeline returned an error; nothing was delivered.
    PipeFailed,
}

#[derive(Debug, Default)]
pub struct CrawlStats {
    dequeued: AtomicU64,
    consumed: AtomicU64,
    download_failed: AtomicU64,
    pipe_failed: AtomicU64,
    extract_failed: AtomicU64,
    discovered: AtomicU64,
    consumer_failures: AtomicU64,
    discarded: AtomicU64,
}

/// Point-in-time copy of [`CrawlStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub dequeued: u64,
    pub consumed: u64,
    pub download_failed: u64,
    pub pipe_failed: u64,
    pub extract_failed: u64,
    /// Follow-up items accepted by the scheduler.
    pub discovered: u64,
    pub consumer_failures: u64,
    /// Items still queued when the engine stopped.
    pub discarded: u64,
}

impl CrawlStats {
    pub(crate) fn record_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Consumed => &self.consumed,
            ItemOutcome::DownloadFailed => &self.download_failed,
            ItemOutcome::PipeFailed => &self.pipe_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_extract_failed(&self) {
        self.extract_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discovered(&self, n: u64) {
        self.discovered.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_consumer_failures(&self, n: u64) {
        self.consumer_failures.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, n: u64) {
        self.discarded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dequeued: self.dequeued.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            download_failed: self.download_failed.load(Ordering::Relaxed),
            pipe_failed: self.pipe_failed.load(Ordering::Relaxed),
            extract_failed: self.extract_failed.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            consumer_failures: self.consumer_failures.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_land_in_their_counters() {
        let stats = CrawlStats::default();
        stats.record_dequeued();
        stats.record_dequeued();
        stats.record_outcome(ItemOutcome::Consumed);
        stats.record_outcome(ItemOutcome::DownloadFailed);
        stats.record_discovered(4);
        let s = stats.snapshot();
        assert_eq!(s.dequeued, 2);
        assert_eq!(s.consumed, 1);
        assert_eq!(s.download_failed, 1);
        assert_eq!(s.pipe_failed, 0);
        assert_eq!(s.discovered, 4);
    }
}
