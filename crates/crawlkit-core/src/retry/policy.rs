use std::time::Duration;

use super::classify::ErrorKind;
use crate::config::RetryConfig;

/// How often and how patiently the downloader retries one work item.
///
/// Delays double from `base_delay` with each attempt and never exceed
/// `max_delay`. A throttled response carrying `Retry-After` waits that long
/// instead, also capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per item, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    /// Out-of-range delays (negative, NaN, infinite, too large) are clamped rather than rejected.
    fn from(cfg: &RetryConfig) -> Self {
        let max_delay = Duration::from_secs(cfg.max_delay_secs);
        let base_delay = if cfg.base_delay_secs.is_nan() || cfg.base_delay_secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(cfg.base_delay_secs)
                .unwrap_or(max_delay)
                .min(max_delay)
        };
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, or `None` once `attempt` (1-based)
    /// used up the budget.
    pub fn next_delay(&self, attempt: u32, kind: ErrorKind) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let delay = match kind {
            ErrorKind::Throttled {
                retry_after: Some(hint),
            } => hint,
            _ => self.backoff(attempt),
        };
        Some(delay.min(self.max_delay))
    }

    /// `base_delay * 2^(attempt - 1)`, saturating.
    fn backoff(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << doublings)
            .unwrap_or(Duration::MAX)
    }
}
