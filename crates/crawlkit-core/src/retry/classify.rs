//! Decide whether a fetch outcome is worth another attempt.

use std::time::Duration;

use crate::error::FetchError;
use crate::exchange::Response;

/// Why an attempt failed in a way that may go away on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer timeout.
    Timeout,
    /// Connection refused/reset, DNS failure, empty reply.
    Connection,
    /// 429 or 503. `retry_after` is the server's `Retry-After` in seconds, when given.
    Throttled { retry_after: Option<Duration> },
    /// Any other 5xx status.
    ServerError(u32),
}

/// Transport failures that are plausibly transient. Malformed requests and
/// everything curl reports as a local problem are not.
pub fn classify_fetch_error(e: &FetchError) -> Option<ErrorKind> {
    let FetchError::Transport(ce) = e else {
        return None;
    };
    if ce.is_operation_timedout() {
        Some(ErrorKind::Timeout)
    } else if ce.is_couldnt_connect()
        || ce.is_couldnt_resolve_host()
        || ce.is_couldnt_resolve_proxy()
        || ce.is_recv_error()
        || ce.is_send_error()
        || ce.is_got_nothing()
        || ce.is_partial_file()
    {
        Some(ErrorKind::Connection)
    } else {
        None
    }
}

/// Retryable statuses: 429/503 (honouring `Retry-After`) and the remaining 5xx.
pub fn classify_response(response: &Response) -> Option<ErrorKind> {
    match response.status {
        429 | 503 => Some(ErrorKind::Throttled {
            retry_after: retry_after(response),
        }),
        500..=599 => Some(ErrorKind::ServerError(response.status)),
        _ => None,
    }
}

pub fn classify_outcome(outcome: &Result<Response, FetchError>) -> Option<ErrorKind> {
    match outcome {
        Ok(response) => classify_response(response),
        Err(e) => classify_fetch_error(e),
    }
}

/// Delta-seconds form only; an HTTP-date falls back to the policy's backoff.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
