//! FIFO scheduler over a `Mutex<VecDeque>` and two condition variables.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::{Polled, Scheduler};
use crate::request::WorkItem;

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<WorkItem>,
    closed: bool,
    /// Queued plus polled-but-not-completed items.
    outstanding: usize,
    discarded: u64,
}

/// Default scheduler: unbounded FIFO, no deduplication.
#[derive(Debug, Default)]
pub struct QueueScheduler {
    state: Mutex<State>,
    available: Condvar,
    idle: Condvar,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items dropped because they were queued at close time or offered after it.
    pub fn discarded(&self) -> u64 {
        self.lock().discarded
    }

    /// Queued plus in-flight items.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Nothing in this module panics while holding the lock; recover the state if a caller did.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Scheduler for QueueScheduler {
    fn offer(&self, item: WorkItem) -> bool {
        let mut state = self.lock();
        if state.closed {
            state.discarded += 1;
            tracing::debug!(item = %item, "scheduler closed; discarding offered item");
            return false;
        }
        state.queue.push_back(item);
        state.outstanding += 1;
        drop(state);
        self.available.notify_one();
        true
    }

    fn poll(&self) -> Polled {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Polled::Closed;
            }
            if let Some(item) = state.queue.pop_front() {
                return Polled::Item(item);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    fn complete(&self) {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.outstanding == 0 {
            self.idle.notify_all();
        }
    }

    fn close(&self) -> usize {
        let mut state = self.lock();
        if state.closed {
            return 0;
        }
        state.closed = true;
        let dropped = state.queue.len();
        state.queue.clear();
        state.outstanding = state.outstanding.saturating_sub(dropped);
        state.discarded += dropped as u64;
        let idle = state.outstanding == 0;
        drop(state);
        if dropped > 0 {
            tracing::info!(dropped, "scheduler closed; discarded queued items");
        }
        self.available.notify_all();
        if idle {
            self.idle.notify_all();
        }
        dropped
    }

    fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let state = self.lock();
        match timeout {
            None => {
                let _state = self
                    .idle
                    .wait_while(state, |s| s.outstanding > 0)
                    .unwrap_or_else(|e| e.into_inner());
                true
            }
            Some(t) => {
                let (_state, res) = self
                    .idle
                    .wait_timeout_while(state, t, |s| s.outstanding > 0)
                    .unwrap_or_else(|e| e.into_inner());
                !res.timed_out()
            }
        }
    }

    fn len(&self) -> usize {
        self.lock().queue.len()
    }
}
