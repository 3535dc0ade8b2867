//! Retry loop: run a fetch until it succeeds or the policy says stop.

use super::classify::classify_outcome;
use super::policy::RetryPolicy;
use crate::error::FetchError;
use crate::exchange::Response;

/// Runs `f` until it yields a non-retryable outcome or the policy gives up.
///
/// Retryable outcomes are transport timeouts/connection errors and responses
/// with status 429, 503 or 5xx. The last outcome is returned as-is, so a
/// persistent 503 still comes back as a `Response`.
pub fn run_with_retry<F>(policy: &RetryPolicy, mut f: F) -> Result<Response, FetchError>
where
    F: FnMut() -> Result<Response, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        let outcome = f();
        let Some(kind) = classify_outcome(&outcome) else {
            return outcome;
        };
        let Some(delay) = policy.next_delay(attempt, kind) else {
            return outcome;
        };
        tracing::debug!(attempt, ?kind, delay_ms = delay.as_millis() as u64, "retrying request");
        std::thread::sleep(delay);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn response(status: u32) -> Response {
        Response {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            url: "http://h/".into(),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn retries_throttled_until_success() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(5), || {
            calls += 1;
            Ok(response(if calls < 3 { 503 } else { 200 }))
        });
        assert_eq!(out.unwrap().status, 200);
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_max_attempts_and_returns_last_response() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(3), || {
            calls += 1;
            Ok(response(500))
        });
        assert_eq!(out.unwrap().status, 500);
        assert_eq!(calls, 3);
    }

    #[test]
    fn does_not_retry_client_errors() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(5), || {
            calls += 1;
            Ok(response(404))
        });
        assert_eq!(out.unwrap().status, 404);
        assert_eq!(calls, 1);
    }

    #[test]
    fn does_not_retry_invalid_request() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(5), || {
            calls += 1;
            Err(FetchError::InvalidRequest("bad".into()))
        });
        assert!(out.is_err());
        assert_eq!(calls, 1);
    }
}
