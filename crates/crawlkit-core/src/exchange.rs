//! Exchange: a work item paired with its fetch outcome.

use serde::Serialize;

use crate::error::{CrawlError, FetchError};
use crate::request::WorkItem;

/// Raw HTTP response: status, headers and body, plus the URL that produced it
/// after redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: u32,
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Vec<u8>,
    /// Effective URL (after redirects). Relative links resolve against this.
    pub url: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx status into `CrawlError::UnknownUpstream`.
    pub fn ensure_success(&self) -> Result<&Self, CrawlError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CrawlError::UnknownUpstream(format!(
                "{} returned HTTP {}",
                self.url, self.status
            )))
        }
    }
}

/// The paired work item and outcome. Owned by the worker that produced it.
#[derive(Debug)]
pub struct Exchange {
    pub item: WorkItem,
    pub outcome: Result<Response, FetchError>,
}

impl Exchange {
    pub fn new(item: WorkItem, outcome: Result<Response, FetchError>) -> Self {
        Self { item, outcome }
    }

    pub fn response(&self) -> Option<&Response> {
        self.outcome.as_ref().ok()
    }

    pub fn is_failed(&self) -> bool {
        self.outcome.is_err()
    }

    /// Response or `CrawlError::Fetch`, for handlers and pipelines that only
    /// make sense on a completed exchange.
    pub fn require_response(&self) -> Result<&Response, CrawlError> {
        self.outcome
            .as_ref()
            .map_err(|e| CrawlError::Fetch(format!("{}: {}", self.item, e)))
    }
}
