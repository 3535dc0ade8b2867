//! Downloader: executes a work item as an HTTP exchange.
//!
//! The default `CurlDownloader` runs one blocking libcurl easy handle per
//! call on the worker thread. It enforces a connection ceiling, attaches a
//! proxy from the configured source when the item has none, reports proxy
//! health, and notifies listeners before and after each request. Failures are
//! returned inside the `Exchange`, never raised.

mod easy;
mod limiter;
mod listener;
mod parse;

use std::time::Duration;

use crate::exchange::Exchange;
use crate::request::WorkItem;
use crate::retry::RetryPolicy;

pub use easy::CurlDownloader;
pub use limiter::{ConnectionLimiter, ConnectionSlot};
pub use listener::{DownloadListener, TracingListener};

/// Default `User-Agent` sent when the configuration does not set one.
pub const DEFAULT_USER_AGENT: &str = concat!("crawlkit/", env!("CARGO_PKG_VERSION"));

pub trait Downloader: Send + Sync {
    /// Fetch `item`. Transport failures come back as a failed exchange.
    fn execute(&self, item: WorkItem) -> Exchange;
}

/// Transport options for `CurlDownloader`, fixed at construction.
#[derive(Debug, Clone)]
pub struct DownloaderOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Whole-transfer timeout. The engine enforces no per-item timeout of its own.
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirections: u32,
    /// Maximum simultaneous connections across all workers.
    pub max_connections: usize,
    /// Retry with backoff on timeouts/5xx/throttling. `None` = single attempt.
    pub retry: Option<RetryPolicy>,
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
            follow_redirects: true,
            max_redirections: 10,
            max_connections: 1,
            retry: None,
        }
    }
}

impl DownloaderOptions {
    /// Defaults with the connection ceiling derived from the worker count.
    pub fn for_workers(workers: usize) -> Self {
        Self {
            max_connections: connection_ceiling(workers),
            ..Self::default()
        }
    }
}

/// Connection ceiling for `workers` threads: half the workers, rounded up, at least 1.
pub fn connection_ceiling(workers: usize) -> usize {
    workers.div_ceil(2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_half_of_workers_rounded_up() {
        assert_eq!(connection_ceiling(0), 1);
        assert_eq!(connection_ceiling(1), 1);
        assert_eq!(connection_ceiling(2), 1);
        assert_eq!(connection_ceiling(5), 3);
        assert_eq!(connection_ceiling(8), 4);
    }

    #[test]
    fn options_for_workers() {
        let opts = DownloaderOptions::for_workers(7);
        assert_eq!(opts.max_connections, 4);
        assert!(opts.retry.is_none());
        assert!(opts.user_agent.starts_with("crawlkit/"));
    }
}
