//! Opt-in deduplicating wrapper around another scheduler.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use super::{Polled, Scheduler};
use crate::request::{Method, WorkItem};

/// Drops items whose `(method, url)` was already offered during this process lifetime.
///
/// Visited keys are kept in memory only and grow with the crawl.
#[derive(Debug)]
pub struct DedupScheduler<S> {
    inner: S,
    seen: Mutex<HashSet<(Method, String)>>,
}

impl<S: Scheduler> DedupScheduler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of distinct keys offered so far.
    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<S: Scheduler> Scheduler for DedupScheduler<S> {
    fn offer(&self, item: WorkItem) -> bool {
        let key = (item.method(), item.url().to_string());
        let fresh = self
            .seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key);
        if !fresh {
            tracing::trace!(item = %item, "duplicate item skipped");
            return false;
        }
        self.inner.offer(item)
    }

    fn poll(&self) -> Polled {
        self.inner.poll()
    }

    fn complete(&self) {
        self.inner.complete()
    }

    fn close(&self) -> usize {
        self.inner.close()
    }

    fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        self.inner.wait_idle(timeout)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::QueueScheduler;

    #[test]
    fn duplicate_urls_enqueued_once() {
        let s = DedupScheduler::new(QueueScheduler::new());
        assert!(s.offer(WorkItem::get("http://h/a")));
        assert!(!s.offer(WorkItem::get("http://h/a")));
        assert!(s.offer(WorkItem::get("http://h/b")));
        assert_eq!(s.len(), 2);
        assert_eq!(s.seen_count(), 2);
    }

    #[test]
    fn method_is_part_of_the_key() {
        let s = DedupScheduler::new(QueueScheduler::new());
        assert!(s.offer(WorkItem::get("http://h/a")));
        assert!(s.offer(WorkItem::new(Method::Post, "http://h/a")));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn already_polled_url_is_still_rejected() {
        let s = DedupScheduler::new(QueueScheduler::new());
        s.offer(WorkItem::get("http://h/a"));
        assert!(matches!(s.poll(), Polled::Item(_)));
        s.complete();
        assert!(!s.offer(WorkItem::get("http://h/a")));
        assert!(s.is_empty());
    }
}
