//! Worker loop: poll → download → handle → transform → consume.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::stats::{CrawlStats, ItemOutcome};
use crate::consumer::ConsumerSet;
use crate::downloader::Downloader;
use crate::error::{CrawlError, FetchError};
use crate::exchange::Exchange;
use crate::handler::ResponseHandler;
use crate::pipeline::Pipeline;
use crate::request::WorkItem;
use crate::scheduler::{Polled, Scheduler};

pub(super) struct Worker<T> {
    pub(super) id: usize,
    pub(super) scheduler: Arc<dyn Scheduler>,
    pub(super) downloader: Arc<dyn Downloader>,
    pub(super) handler: Arc<dyn ResponseHandler>,
    pub(super) pipeline: Arc<dyn Pipeline<Output = T>>,
    pub(super) consumers: ConsumerSet<T>,
    pub(super) stats: Arc<CrawlStats>,
}

impl<T: Send + 'static> Worker<T> {
    /// Loop until the scheduler reports `Closed`. The current item always runs to completion.
    pub(super) fn run(self) {
        tracing::debug!(worker = self.id, "worker started");
        while let Polled::Item(item) = self.scheduler.poll() {
            let _done = CompletionGuard(self.scheduler.as_ref());
            self.stats.record_dequeued();
            let outcome = self.process(item);
            self.stats.record_outcome(outcome);
        }
        tracing::debug!(worker = self.id, "worker stopped");
    }

    fn process(&self, item: WorkItem) -> ItemOutcome {
        let exchange = self.download(item);
        if let Err(e) = &exchange.outcome {
            tracing::warn!(worker = self.id, item = %exchange.item, error = %e, "download failed");
            return ItemOutcome::DownloadFailed;
        }

        let offered = guarded(CrawlError::Extract, || {
            let items = self.handler.handle(&exchange)?;
            // Offers run under the same guard: a panicking scheduler counts as a failed extraction.
            let accepted = items
                .into_iter()
                .map(|next| self.scheduler.offer(next))
                .filter(|accepted| *accepted)
                .count();
            Ok(accepted as u64)
        });
        match offered {
            Ok(accepted) => {
                if accepted > 0 {
                    tracing::trace!(worker = self.id, item = %exchange.item, accepted, "follow-ups enqueued");
                    self.stats.record_discovered(accepted);
                }
            }
            Err(e) => {
                self.stats.record_extract_failed();
                tracing::warn!(worker = self.id, item = %exchange.item, error = %e, "extraction failed; no follow-ups");
            }
        }

        match guarded(CrawlError::Transform, || self.pipeline.transform(&exchange)) {
            Ok(value) => {
                let failed = self.consumers.deliver(value);
                if failed > 0 {
                    self.stats.record_consumer_failures(failed as u64);
                }
                ItemOutcome::Consumed
            }
            Err(e) if e.is_upstream() => {
                tracing::warn!(worker = self.id, item = %exchange.item, error = %e, "unexpected upstream payload");
                ItemOutcome::PipeFailed
            }
            Err(e) => {
                tracing::warn!(worker = self.id, item = %exchange.item, error = %e, "pipeline failed");
                ItemOutcome::PipeFailed
            }
        }
    }

    /// Run the downloader, turning a panic into a failed exchange.
    fn download(&self, item: WorkItem) -> Exchange {
        let fallback = item.clone();
        match catch_unwind(AssertUnwindSafe(|| self.downloader.execute(item))) {
            Ok(exchange) => exchange,
            Err(_) => Exchange::new(
                fallback,
                Err(FetchError::InvalidRequest("downloader panicked".to_string())),
            ),
        }
    }
}

/// Marks the polled item complete even if processing unwinds, so idle waits still return.
struct CompletionGuard<'a>(&'a dyn Scheduler);

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// Run a handler/pipeline call, mapping a panic to an error of the given kind.
fn guarded<R>(
    on_panic: fn(String) -> CrawlError,
    f: impl FnOnce() -> Result<R, CrawlError>,
) -> Result<R, CrawlError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| Err(on_panic("panicked".to_string())))
}
