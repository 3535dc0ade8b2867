//! libcurl easy-handle downloader.

use std::str;
use std::sync::Arc;

use super::limiter::ConnectionLimiter;
use super::listener::DownloadListener;
use super::parse::parse_header_lines;
use super::{Downloader, DownloaderOptions};
use crate::error::FetchError;
use crate::exchange::{Exchange, Response};
use crate::proxy::{Proxy, ProxyOutcome, ProxySource};
use crate::request::{Method, WorkItem};
use crate::retry::run_with_retry;

pub struct CurlDownloader {
    options: DownloaderOptions,
    limiter: ConnectionLimiter,
    listeners: Vec<Arc<dyn DownloadListener>>,
    proxies: Option<Arc<dyn ProxySource>>,
}

impl CurlDownloader {
    pub fn new(options: DownloaderOptions) -> Self {
        let limiter = ConnectionLimiter::new(options.max_connections);
        Self {
            options,
            limiter,
            listeners: Vec::new(),
            proxies: None,
        }
    }

    /// Append a listener. Listeners are notified in the order they were added.
    pub fn with_listener(mut self, listener: Arc<dyn DownloadListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_listeners(mut self, listeners: impl IntoIterator<Item = Arc<dyn DownloadListener>>) -> Self {
        self.listeners.extend(listeners);
        self
    }

    pub fn with_proxy_source(mut self, proxies: Arc<dyn ProxySource>) -> Self {
        self.proxies = Some(proxies);
        self
    }

    pub fn options(&self) -> &DownloaderOptions {
        &self.options
    }

    pub fn limiter(&self) -> &ConnectionLimiter {
        &self.limiter
    }

    fn attach_proxy(&self, item: WorkItem) -> WorkItem {
        if item.proxy().is_some() {
            return item;
        }
        match self.proxies.as_ref().and_then(|p| p.get()) {
            Some(proxy) => item.with_proxy(proxy),
            None => item,
        }
    }
}

impl Downloader for CurlDownloader {
    fn execute(&self, item: WorkItem) -> Exchange {
        let item = self.attach_proxy(item);
        for l in &self.listeners {
            l.before_dispatch(&item);
        }

        // A slot is held per attempt only, never across a retry backoff.
        let attempt = || {
            let _slot = self.limiter.acquire();
            fetch(&item, &self.options)
        };
        let outcome = match &self.options.retry {
            Some(policy) => run_with_retry(policy, attempt),
            None => attempt(),
        };

        if let (Some(source), Some(proxy)) = (&self.proxies, item.proxy()) {
            match &outcome {
                Ok(_) => source.report(proxy, ProxyOutcome::Success),
                Err(FetchError::Transport(_)) => source.report(proxy, ProxyOutcome::Failure),
                Err(FetchError::InvalidRequest(_)) => {}
            }
        }

        match &outcome {
            Ok(response) => {
                for l in &self.listeners {
                    l.on_success(&item, response);
                }
            }
            Err(error) => {
                for l in &self.listeners {
                    l.on_failure(&item, error);
                }
            }
        }

        Exchange::new(item, outcome)
    }
}

/// One HTTP exchange on a fresh easy handle. Any status code is a response.
fn fetch(item: &WorkItem, options: &DownloaderOptions) -> Result<Response, FetchError> {
    url::Url::parse(item.url())
        .map_err(|e| FetchError::InvalidRequest(format!("{}: {}", item.url(), e)))?;

    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(item.url())?;
    match item.method() {
        Method::Get => easy.get(true)?,
        Method::Head => easy.nobody(true)?,
        Method::Post => {
            easy.post(true)?;
            easy.post_fields_copy(item.body().unwrap_or_default())?;
        }
    }
    easy.follow_location(options.follow_redirects)?;
    easy.max_redirections(options.max_redirections)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.timeout(options.timeout)?;
    easy.useragent(&options.user_agent)?;

    let mut list = curl::easy::List::new();
    for (k, v) in item.headers() {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !item.headers().is_empty() {
        easy.http_headers(list)?;
    }
    if let Some(cookie) = item.cookie_header() {
        easy.cookie(&cookie)?;
    }
    apply_proxy(&mut easy, item.proxy())?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    let url = easy
        .effective_url()?
        .map(str::to_string)
        .unwrap_or_else(|| item.url().to_string());

    Ok(Response {
        status,
        headers: parse_header_lines(&header_lines),
        body,
        url,
    })
}

fn apply_proxy(easy: &mut curl::easy::Easy, proxy: Option<&Proxy>) -> Result<(), curl::Error> {
    match proxy {
        Some(p) => {
            easy.proxy(&p.url())?;
            if let Some(user) = &p.username {
                easy.proxy_username(user)?;
                easy.proxy_password(p.password.as_deref().unwrap_or(""))?;
            }
        }
        // Empty string disables proxies picked up from the environment: no proxy means direct.
        None => easy.proxy("")?,
    }
    Ok(())
}
