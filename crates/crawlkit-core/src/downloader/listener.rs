//! Lifecycle hooks invoked synchronously around each download.

use crate::error::FetchError;
use crate::exchange::Response;
use crate::request::WorkItem;

/// Observer of per-request lifecycle events. All methods default to no-ops.
///
/// Listeners run on the worker thread in registration order. Use them for
/// cross-cutting concerns (rate limiting, metrics, cookie capture) without
/// touching the downloader itself.
pub trait DownloadListener: Send + Sync {
    /// Called before the request is dispatched. The item already carries its proxy, if any.
    fn before_dispatch(&self, _item: &WorkItem) {}

    /// Called after a response was received (any HTTP status).
    fn on_success(&self, _item: &WorkItem, _response: &Response) {}

    /// Called when the request failed without a response.
    fn on_failure(&self, _item: &WorkItem, _error: &FetchError) {}
}

/// Listener that logs every event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl DownloadListener for TracingListener {
    fn before_dispatch(&self, item: &WorkItem) {
        match item.proxy() {
            Some(proxy) => tracing::debug!(item = %item, proxy = %proxy, "dispatch"),
            None => tracing::debug!(item = %item, "dispatch"),
        }
    }

    fn on_success(&self, item: &WorkItem, response: &Response) {
        tracing::debug!(
            item = %item,
            status = response.status,
            bytes = response.body.len(),
            "response received"
        );
    }

    fn on_failure(&self, item: &WorkItem, error: &FetchError) {
        tracing::debug!(item = %item, error = %error, "request failed");
    }
}
