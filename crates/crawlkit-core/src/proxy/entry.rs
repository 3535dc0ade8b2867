//! Per-proxy liveness entry.

use std::time::Instant;

use super::Proxy;

/// Liveness and usage counters for one proxy.
#[derive(Debug, Clone)]
pub struct ProxyEntry {
    pub proxy: Proxy,
    pub alive: bool,
    /// Failures since the last success; reset to 0 on success.
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    pub last_failure_at: Option<Instant>,
}

impl ProxyEntry {
    pub(super) fn new(proxy: Proxy) -> Self {
        Self {
            proxy,
            alive: true,
            consecutive_failures: 0,
            total_failures: 0,
            total_successes: 0,
            last_failure_at: None,
        }
    }
}
