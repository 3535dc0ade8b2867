//! Engine: wires the components together and runs a fixed pool of worker threads.
//!
//! Configuration happens on a single thread through [`EngineBuilder`];
//! [`EngineBuilder::build`] validates it once and yields an immutable
//! [`EngineConfig`], which [`Engine::start`] consumes. Nothing about the
//! configuration is shared mutably with the workers.

mod stats;
mod worker;

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::CrawlConfig;
use crate::consumer::{consumer_fn, Consumer, ConsumerSet};
use crate::downloader::{
    connection_ceiling, CurlDownloader, DownloadListener, Downloader, DownloaderOptions,
};
use crate::error::CrawlError;
use crate::exchange::Response;
use crate::handler::{NoFollow, RegexLinkHandler, ResponseHandler};
use crate::pipeline::{IdentityPipeline, Pipeline};
use crate::proxy::{Proxy, ProxyPool, ProxySource, SelectionStrategy};
use crate::request::WorkItem;
use crate::retry::RetryPolicy;
use crate::scheduler::{DedupScheduler, QueueScheduler, Scheduler};

pub use stats::{CrawlStats, ItemOutcome, StatsSnapshot};
use worker::Worker;

/// Mutable, single-threaded configuration of an engine.
pub struct EngineBuilder<T> {
    seeds: Vec<WorkItem>,
    workers: usize,
    max_connections: Option<usize>,
    options: DownloaderOptions,
    downloader: Option<Arc<dyn Downloader>>,
    listeners: Vec<Arc<dyn DownloadListener>>,
    proxies: Option<Arc<dyn ProxySource>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    dedup: bool,
    handler: Arc<dyn ResponseHandler>,
    pipeline: Arc<dyn Pipeline<Output = T>>,
    consumers: ConsumerSet<T>,
    fallback: Option<Arc<dyn Consumer<T>>>,
}

impl EngineBuilder<Response> {
    /// Builder whose pipeline is [`IdentityPipeline`]: consumers receive raw responses.
    /// Without a registered consumer each response is logged (status, URL, size).
    pub fn identity() -> Self {
        Self::new(IdentityPipeline).fallback_consumer(Arc::new(consumer_fn(|r: &Response| {
            tracing::info!(status = r.status, url = %r.url, bytes = r.body.len(), "fetched");
            Ok(())
        })))
    }
}

impl<T: Send + 'static> EngineBuilder<T> {
    /// Builder with the given pipeline, the [`NoFollow`] handler, one worker,
    /// the built-in curl downloader and a FIFO scheduler.
    pub fn new<P>(pipeline: P) -> Self
    where
        P: Pipeline<Output = T> + 'static,
    {
        Self {
            seeds: Vec::new(),
            workers: 1,
            max_connections: None,
            options: DownloaderOptions::default(),
            downloader: None,
            listeners: Vec::new(),
            proxies: None,
            scheduler: None,
            dedup: false,
            handler: Arc::new(NoFollow),
            pipeline: Arc::new(pipeline),
            consumers: ConsumerSet::new(),
            fallback: None,
        }
    }

    pub fn seed(mut self, item: WorkItem) -> Self {
        self.seeds.push(item);
        self
    }

    pub fn seed_url(self, url: impl Into<String>) -> Self {
        self.seed(WorkItem::get(url))
    }

    pub fn seeds(mut self, items: impl IntoIterator<Item = WorkItem>) -> Self {
        self.seeds.extend(items);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Override the connection ceiling (default: half the workers, rounded up).
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Transport options for the built-in downloader. `max_connections` in
    /// `options` is ignored; use [`max_connections`](Self::max_connections).
    pub fn downloader_options(mut self, options: DownloaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.options.retry = Some(policy);
        self
    }

    /// Replace the built-in downloader. Listeners and the proxy source only
    /// apply to the built-in one.
    pub fn downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn DownloadListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn proxy_source(mut self, source: Arc<dyn ProxySource>) -> Self {
        self.proxies = Some(source);
        self
    }

    /// Convenience for a [`ProxyPool`] over `proxies`. An empty list means direct connections.
    pub fn proxies(self, proxies: Vec<Proxy>, strategy: SelectionStrategy) -> Self {
        if proxies.is_empty() {
            return self;
        }
        self.proxy_source(Arc::new(ProxyPool::new(proxies, strategy)))
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Wrap the default scheduler in a [`DedupScheduler`]. Ignored with a custom scheduler.
    pub fn dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Follow links matching `pattern` (see [`RegexLinkHandler`]).
    pub fn follow(self, pattern: &str) -> Result<Self, CrawlError> {
        let handler = RegexLinkHandler::new(pattern)?;
        Ok(self.handler(Arc::new(handler)))
    }

    /// Register a consumer. Consumers are called in registration order.
    pub fn consumer(mut self, consumer: Arc<dyn Consumer<T>>) -> Self {
        self.consumers.push(consumer);
        self
    }

    /// Consumer used only when none was registered, e.g. `Arc::new(LogConsumer)`.
    pub fn fallback_consumer(mut self, consumer: Arc<dyn Consumer<T>>) -> Self {
        self.fallback = Some(consumer);
        self
    }

    /// Install a scheduler that also watches downloads: it is registered as
    /// both the scheduler and the last listener, so it sees every dispatch
    /// and result of the built-in downloader.
    pub fn observing_scheduler<S>(self, scheduler: Arc<S>) -> Self
    where
        S: Scheduler + DownloadListener + 'static,
    {
        let listener: Arc<dyn DownloadListener> = scheduler.clone();
        self.scheduler(scheduler).listener(listener)
    }

    /// Apply workers, transport, proxy, retry and dedup settings from a config file.
    pub fn apply_config(mut self, cfg: &CrawlConfig) -> Self {
        self.workers = cfg.workers;
        self.max_connections = cfg.max_connections;
        self.options.user_agent = cfg.user_agent.clone();
        self.options.connect_timeout = Duration::from_secs(cfg.connect_timeout_secs);
        self.options.timeout = Duration::from_secs(cfg.timeout_secs);
        self.options.follow_redirects = cfg.follow_redirects;
        self.options.retry = cfg.retry.as_ref().map(RetryPolicy::from);
        self.dedup = cfg.dedup;
        if !cfg.proxies.is_empty() {
            let pool = ProxyPool::new(cfg.proxies.clone(), cfg.proxy_strategy)
                .with_max_failures(cfg.proxy_max_failures);
            self.proxies = Some(Arc::new(pool));
        }
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<EngineConfig<T>, CrawlError> {
        if self.seeds.is_empty() {
            return Err(CrawlError::Config(
                "no seed work item: add at least one seed before starting".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("worker count must be at least 1".to_string()));
        }
        let max_connections = self
            .max_connections
            .unwrap_or_else(|| connection_ceiling(self.workers));
        if max_connections == 0 {
            return Err(CrawlError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        let mut consumers = self.consumers;
        if consumers.is_empty() {
            match self.fallback {
                Some(fallback) => consumers.push(fallback),
                None => tracing::warn!("no consumers registered; pipeline output will be dropped"),
            }
        }

        let downloader: Arc<dyn Downloader> = match self.downloader {
            Some(custom) => {
                if !self.listeners.is_empty() || self.proxies.is_some() {
                    tracing::warn!(
                        "custom downloader set; listeners and proxy source are not attached to it"
                    );
                }
                custom
            }
            None => {
                let options = DownloaderOptions {
                    max_connections,
                    ..self.options
                };
                let mut curl = CurlDownloader::new(options).with_listeners(self.listeners);
                if let Some(proxies) = self.proxies {
                    curl = curl.with_proxy_source(proxies);
                }
                Arc::new(curl)
            }
        };

        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(custom) => custom,
            None if self.dedup => Arc::new(DedupScheduler::new(QueueScheduler::new())),
            None => Arc::new(QueueScheduler::new()),
        };

        Ok(EngineConfig {
            seeds: self.seeds,
            workers: self.workers,
            max_connections,
            scheduler,
            downloader,
            handler: self.handler,
            pipeline: self.pipeline,
            consumers,
        })
    }
}

/// Validated, immutable engine configuration.
pub struct EngineConfig<T> {
    seeds: Vec<WorkItem>,
    workers: usize,
    max_connections: usize,
    scheduler: Arc<dyn Scheduler>,
    downloader: Arc<dyn Downloader>,
    handler: Arc<dyn ResponseHandler>,
    pipeline: Arc<dyn Pipeline<Output = T>>,
    consumers: ConsumerSet<T>,
}

impl<T> EngineConfig<T> {
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn seeds(&self) -> &[WorkItem] {
        &self.seeds
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }
}

/// A running crawl.
pub struct Engine {
    scheduler: Arc<dyn Scheduler>,
    stats: Arc<CrawlStats>,
    handles: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Seed the scheduler and spawn the worker threads.
    pub fn start<T: Send + 'static>(config: EngineConfig<T>) -> Result<Engine, CrawlError> {
        let EngineConfig {
            seeds,
            workers,
            max_connections,
            scheduler,
            downloader,
            handler,
            pipeline,
            consumers,
        } = config;

        let seeded = seeds
            .into_iter()
            .map(|item| scheduler.offer(item))
            .filter(|accepted| *accepted)
            .count();
        tracing::info!(workers, max_connections, seeded, "starting crawl engine");

        let stats = Arc::new(CrawlStats::default());
        let mut engine = Engine {
            scheduler: Arc::clone(&scheduler),
            stats: Arc::clone(&stats),
            handles: Vec::with_capacity(workers),
        };

        for id in 0..workers {
            let worker = Worker {
                id,
                scheduler: Arc::clone(&scheduler),
                downloader: Arc::clone(&downloader),
                handler: Arc::clone(&handler),
                pipeline: Arc::clone(&pipeline),
                consumers: consumers.clone(),
                stats: Arc::clone(&stats),
            };
            let spawned = std::thread::Builder::new()
                .name(format!("crawlkit-worker-{id}"))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => engine.handles.push(handle),
                Err(e) => {
                    tracing::error!(worker = id, error = %e, "failed to spawn worker");
                    engine.stop();
                    engine.join_workers();
                    return Err(CrawlError::Io(e));
                }
            }
        }
        Ok(engine)
    }

    /// Request shutdown. Workers finish their current item and exit; queued items are discarded.
    pub fn stop(&self) {
        let dropped = self.scheduler.close();
        self.stats.record_discarded(dropped as u64);
        tracing::info!(dropped, "crawl engine stopping");
    }

    /// Block until no work is queued or in flight. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        self.scheduler.wait_idle(timeout)
    }

    /// Wait for every worker thread to exit. Call after [`stop`](Self::stop).
    pub fn join(mut self) -> StatsSnapshot {
        self.join_workers();
        self.stats.snapshot()
    }

    /// Wait until the crawl runs dry (or `timeout` elapses), then stop and join.
    pub fn run_until_idle(self, timeout: Option<Duration>) -> StatsSnapshot {
        if !self.wait_idle(timeout) {
            tracing::warn!("crawl did not become idle before timeout; stopping");
        }
        self.stop();
        self.join()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    fn join_workers(&mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                tracing::error!(thread = %name, "worker thread panicked");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop();
            self.join_workers();
        }
    }
}
