//! Error types shared by the engine and its pluggable components.

use thiserror::Error;

/// Failure of a single fetch. Carried inside a failed [`Exchange`](crate::exchange::Exchange)
/// rather than propagated across the worker loop.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (connection refused, timeout, TLS, proxy, ...).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// The work item could not be turned into a request (bad URL, header, cookie).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors raised by configuration, response handlers, pipelines and consumers.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Engine configuration rejected before any worker was spawned.
    #[error("configuration: {0}")]
    Config(String),
    /// A response handler could not extract follow-up work.
    #[error("extract: {0}")]
    Extract(String),
    /// A pipeline could not map the exchange to a domain value.
    #[error("transform: {0}")]
    Transform(String),
    /// The remote answered, but not with what the caller expected
    /// (e.g. non-2xx, or an error code inside a 200 body).
    #[error("unknown upstream: {0}")]
    UnknownUpstream(String),
    /// A consumer rejected a value.
    #[error("consumer: {0}")]
    Consumer(String),
    /// A pipeline or handler was asked to work on a failed exchange.
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// True for failures that came from the remote side rather than our own code.
    pub fn is_upstream(&self) -> bool {
        matches!(self, CrawlError::UnknownUpstream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_prefix() {
        let e = CrawlError::UnknownUpstream("code=A00003".to_string());
        assert_eq!(e.to_string(), "unknown upstream: code=A00003");
        assert!(e.is_upstream());
        assert!(!CrawlError::Extract("bad html".into()).is_upstream());
    }

    #[test]
    fn invalid_request_display() {
        let e = FetchError::InvalidRequest("empty url".into());
        assert_eq!(e.to_string(), "invalid request: empty url");
    }
}
