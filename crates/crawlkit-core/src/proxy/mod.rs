//! Outbound proxy endpoints and the pool that rotates them.
//!
//! The pool keeps a small liveness table per proxy:
//! - consecutive failures reported by the downloader
//! - total failures and selections (used by the least-failures strategy)
//! - an alive flag, cleared after `max_failures` consecutive failures
//!
//! Dead proxies are skipped unless every proxy is dead, in which case the
//! whole set is used again so the crawl never loses all outbound routes.

mod entry;
mod key;
mod pool;
mod strategy;

pub use entry::ProxyEntry;
pub use key::Proxy;
pub use pool::ProxyPool;
pub use strategy::SelectionStrategy;

/// Health signal fed back by the downloader after each request made through a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyOutcome {
    Success,
    Failure,
}

/// Source of proxies for the downloader. `ProxyPool` is the default; embedders
/// can plug in their own (e.g. one backed by an external proxy service).
pub trait ProxySource: Send + Sync {
    /// A proxy to use for the next request, or `None` for a direct connection.
    fn get(&self) -> Option<Proxy>;

    /// Feed back the outcome of a request made through `proxy`.
    fn report(&self, proxy: &Proxy, outcome: ProxyOutcome);
}
