use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::downloader::DEFAULT_USER_AGENT;
use crate::proxy::{Proxy, SelectionStrategy};

/// Retry policy parameters (optional `[retry]` section in config.toml).
/// Without this section the downloader makes a single attempt per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per item (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

fn default_proxy_max_failures() -> u32 {
    crate::proxy::ProxyPool::DEFAULT_MAX_FAILURES
}

/// Global configuration loaded from `~/.config/crawlkit/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum simultaneous connections. `None` = half the workers, rounded up.
    #[serde(default)]
    pub max_connections: Option<usize>,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; the engine has no per-item timeout of its own.
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    /// Skip items whose method+URL was already offered in this run.
    #[serde(default)]
    pub dedup: bool,
    #[serde(default)]
    pub proxy_strategy: SelectionStrategy,
    /// Consecutive failures before a proxy is marked dead.
    #[serde(default = "default_proxy_max_failures")]
    pub proxy_max_failures: u32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Outbound proxies (`[[proxies]]` tables). Empty = direct connections.
    #[serde(default)]
    pub proxies: Vec<Proxy>,
}

fn default_true() -> bool {
    true
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_connections: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 15,
            timeout_secs: 60,
            follow_redirects: true,
            dedup: false,
            proxy_strategy: SelectionStrategy::RoundRobin,
            proxy_max_failures: default_proxy_max_failures(),
            retry: None,
            proxies: Vec::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("crawlkit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CrawlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CrawlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path (e.g. `--config`).
pub fn load_from(path: &Path) -> Result<CrawlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: CrawlConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
