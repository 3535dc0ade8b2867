//! Work items: a fetch request plus its metadata.
//!
//! A `WorkItem` is assembled with the `with_*` methods and is not mutated once
//! it has been offered to a scheduler. Fields are private so that a worker
//! holding an item can read it but never change what was enqueued.

use std::fmt;

use crate::proxy::Proxy;

/// HTTP method of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of fetch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    proxy: Option<Proxy>,
}

impl WorkItem {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
            proxy: None,
        }
    }

    /// Shorthand for a GET item, the common case for seeds and discovered links.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Request body (sent only for POST).
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Pin this item to a proxy. The downloader will not consult the proxy pool for it.
    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Cookies rendered as a single `Cookie` header value (`a=1; b=2`), or `None` if empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k.trim(), v.trim()))
            .collect();
        Some(parts.join("; "))
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_defaults() {
        let item = WorkItem::get("https://example.com/");
        assert_eq!(item.method(), Method::Get);
        assert_eq!(item.url(), "https://example.com/");
        assert!(item.headers().is_empty());
        assert!(item.proxy().is_none());
        assert!(item.cookie_header().is_none());
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let item = WorkItem::get("https://example.com/")
            .with_cookie("session", "abc")
            .with_cookie(" lang ", "en");
        assert_eq!(item.cookie_header().as_deref(), Some("session=abc; lang=en"));
    }

    #[test]
    fn display_is_method_and_url() {
        let item = WorkItem::new(Method::Post, "http://h/x").with_body("a=1");
        assert_eq!(item.to_string(), "POST http://h/x");
        assert_eq!(item.body(), Some(&b"a=1"[..]));
    }
}
