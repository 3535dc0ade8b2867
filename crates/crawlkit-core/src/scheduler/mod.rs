//! Work queue shared by all workers.
//!
//! `offer` may be called from any thread (workers, seeding code, listeners).
//! `poll` blocks until an item is available or the scheduler is closed. Each
//! item is handed to exactly one `poll` caller.
//!
//! The scheduler also counts outstanding work (queued plus in flight) so the
//! embedding application can wait for a crawl to run dry before stopping it.

mod dedup;
mod queue;

use std::time::Duration;

use crate::request::WorkItem;

pub use dedup::DedupScheduler;
pub use queue::QueueScheduler;

/// Result of [`Scheduler::poll`].
#[derive(Debug)]
pub enum Polled {
    Item(WorkItem),
    /// Shutdown was requested; the caller should exit its loop.
    Closed,
}

pub trait Scheduler: Send + Sync {
    /// Enqueue an item. Returns false if the item was not accepted
    /// (scheduler closed, or filtered by a wrapper such as `DedupScheduler`).
    fn offer(&self, item: WorkItem) -> bool;

    /// Block until an item is available or the scheduler is closed.
    fn poll(&self) -> Polled;

    /// Mark one previously polled item as finished (after its follow-ups were offered).
    fn complete(&self);

    /// Close the scheduler: wake every blocked `poll` and discard queued items.
    /// Returns the number of items discarded.
    fn close(&self) -> usize;

    /// Block until no work is queued or in flight. `None` waits forever.
    /// Returns false on timeout.
    fn wait_idle(&self, timeout: Option<Duration>) -> bool;

    /// Number of items currently queued (not counting in-flight items).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
