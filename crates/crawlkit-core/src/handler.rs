//! Response handlers: derive follow-up work items from a completed exchange.
//!
//! Handlers are pure over the exchange. An `Err` is logged by the worker and
//! treated as "no new items"; it never stops the worker.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

use crate::error::CrawlError;
use crate::exchange::Exchange;
use crate::request::WorkItem;

pub trait ResponseHandler: Send + Sync {
    fn handle(&self, exchange: &Exchange) -> Result<Vec<WorkItem>, CrawlError>;
}

/// Canonical no-op handler: never produces follow-up work, so only the seeds are fetched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFollow;

impl ResponseHandler for NoFollow {
    fn handle(&self, _exchange: &Exchange) -> Result<Vec<WorkItem>, CrawlError> {
        Ok(Vec::new())
    }
}

/// Handler built from a closure; see [`handler_fn`].
pub struct HandlerFn<F>(F);

/// Wrap a closure as a `ResponseHandler`.
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Exchange) -> Result<Vec<WorkItem>, CrawlError> + Send + Sync,
{
    HandlerFn(f)
}

impl<F> ResponseHandler for HandlerFn<F>
where
    F: Fn(&Exchange) -> Result<Vec<WorkItem>, CrawlError> + Send + Sync,
{
    fn handle(&self, exchange: &Exchange) -> Result<Vec<WorkItem>, CrawlError> {
        (self.0)(exchange)
    }
}

/// Elements whose `href`/`src` attributes are link candidates.
const LINK_SELECTOR: &str = "[href], [src]";

/// Follows `href`/`src` links whose absolute URL matches a pattern.
///
/// The body is parsed as HTML, so entities in attribute values are decoded
/// and unquoted attributes are seen. Links are resolved against the
/// response's effective URL; fragments are stripped and only http(s) links
/// are kept. Each link appears at most once per page, but nothing is
/// remembered across pages.
#[derive(Debug, Clone)]
pub struct RegexLinkHandler {
    pattern: Regex,
    inherit_metadata: bool,
}

impl RegexLinkHandler {
    pub fn new(pattern: &str) -> Result<Self, CrawlError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| CrawlError::Config(format!("invalid follow pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern,
            inherit_metadata: false,
        })
    }

    /// Copy the parent item's headers and cookies onto discovered items.
    pub fn inherit_metadata(mut self, inherit: bool) -> Self {
        self.inherit_metadata = inherit;
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn child(&self, parent: &WorkItem, url: String) -> WorkItem {
        let mut item = WorkItem::get(url);
        if self.inherit_metadata {
            for (k, v) in parent.headers() {
                item = item.with_header(k.clone(), v.clone());
            }
            for (k, v) in parent.cookies() {
                item = item.with_cookie(k.clone(), v.clone());
            }
        }
        item
    }
}

impl ResponseHandler for RegexLinkHandler {
    fn handle(&self, exchange: &Exchange) -> Result<Vec<WorkItem>, CrawlError> {
        let response = exchange.require_response()?;
        if !response.is_success() {
            return Ok(Vec::new());
        }
        let base = url::Url::parse(&response.url)
            .map_err(|e| CrawlError::Extract(format!("base url {}: {}", response.url, e)))?;
        let selector = Selector::parse(LINK_SELECTOR)
            .map_err(|e| CrawlError::Extract(format!("link selector: {e:?}")))?;
        let document = Html::parse_document(&response.text());
        let raw_links = document.select(&selector).flat_map(|el| {
            let el = el.value();
            [el.attr("href"), el.attr("src")].into_iter().flatten()
        });

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in raw_links {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let Ok(mut resolved) = base.join(raw) else {
                continue;
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            resolved.set_fragment(None);
            let resolved = resolved.to_string();
            if self.pattern.is_match(&resolved) && seen.insert(resolved.clone()) {
                out.push(self.child(&exchange.item, resolved));
            }
        }
        Ok(out)
    }
}
