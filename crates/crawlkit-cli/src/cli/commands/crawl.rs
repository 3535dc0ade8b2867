//! `crawlkit crawl` – run the engine over the given seeds until idle.

use anyhow::{Context, Result};
use crawlkit_core::config::{self, CrawlConfig};
use crawlkit_core::consumer::Consumer;
use crawlkit_core::downloader::TracingListener;
use crawlkit_core::proxy::Proxy;
use crawlkit_core::{CrawlError, Engine, EngineBuilder, Response};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CrawlArgs {
    pub urls: Vec<String>,
    pub follow: Option<String>,
    pub workers: Option<usize>,
    pub proxies: Vec<String>,
    pub user_agent: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub idle_timeout: Option<u64>,
}

/// Prints one line per fetched page to stdout.
struct PrintConsumer {
    json: bool,
}

impl Consumer<Response> for PrintConsumer {
    fn accept(&self, response: &Response) -> Result<(), CrawlError> {
        if self.json {
            let line = serde_json::json!({
                "status": response.status,
                "url": response.url,
                "bytes": response.body.len(),
                "content_type": response.header("content-type"),
            });
            println!("{line}");
        } else {
            println!("{} {} {}", response.status, response.url, response.body.len());
        }
        Ok(())
    }
}

/// Config file settings with command-line overrides applied.
pub(crate) fn effective_config(args: &CrawlArgs) -> Result<CrawlConfig> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_or_init()?,
    };
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if let Some(ua) = &args.user_agent {
        cfg.user_agent = ua.clone();
    }
    if !args.proxies.is_empty() {
        cfg.proxies = parse_proxies(&args.proxies)?;
    }
    Ok(cfg)
}

pub(crate) fn parse_proxies(specs: &[String]) -> Result<Vec<Proxy>> {
    specs
        .iter()
        .map(|s| Proxy::parse(s).with_context(|| format!("invalid --proxy {s:?}")))
        .collect()
}

pub fn run_crawl(args: CrawlArgs) -> Result<()> {
    let cfg = effective_config(&args)?;
    tracing::debug!("effective config: {:?}", cfg);

    let mut builder = EngineBuilder::identity()
        .apply_config(&cfg)
        .seeds(args.urls.iter().map(crawlkit_core::WorkItem::get))
        .listener(Arc::new(TracingListener))
        .consumer(Arc::new(PrintConsumer { json: args.json }));
    if let Some(pattern) = &args.follow {
        builder = builder.follow(pattern)?;
    }
    let engine_config = builder.build()?;

    let started = Instant::now();
    let engine = Engine::start(engine_config)?;
    let stats = engine.run_until_idle(args.idle_timeout.map(Duration::from_secs));

    tracing::info!(?stats, elapsed_ms = started.elapsed().as_millis() as u64, "crawl finished");
    eprintln!(
        "fetched {} page(s), {} download failure(s), {} pipeline failure(s), {} discarded in {:.1}s",
        stats.consumed,
        stats.download_failed,
        stats.pipe_failed,
        stats.discarded,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
