//! Opt-in retry with exponential backoff for the downloader.
//!
//! An outcome is retryable when it is a transient transport failure or a
//! 429/5xx response. The engine never retries on its own: a downloader only
//! retries when it was built with a `RetryPolicy`.

mod classify;
mod policy;
mod run;

pub use classify::{classify_fetch_error, classify_outcome, classify_response, ErrorKind};
pub use policy::RetryPolicy;
pub use run::run_with_retry;
