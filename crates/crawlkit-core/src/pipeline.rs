//! Pipelines: map a completed exchange to a typed domain value.

use crate::error::CrawlError;
use crate::exchange::{Exchange, Response};

/// Pure mapping from an exchange to a domain value. A failed transform drops
/// the item for this run; it is not retried.
pub trait Pipeline: Send + Sync {
    type Output: Send + 'static;

    fn transform(&self, exchange: &Exchange) -> Result<Self::Output, CrawlError>;
}

/// Canonical pipeline: passes the raw response through.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityPipeline;

impl Pipeline for IdentityPipeline {
    type Output = Response;

    fn transform(&self, exchange: &Exchange) -> Result<Response, CrawlError> {
        exchange.require_response().cloned()
    }
}

/// Pipeline built from a closure; see [`pipeline_fn`].
pub struct PipelineFn<F>(F);

/// Wrap a closure as a `Pipeline`.
pub fn pipeline_fn<F, T>(f: F) -> PipelineFn<F>
where
    F: Fn(&Exchange) -> Result<T, CrawlError> + Send + Sync,
    T: Send + 'static,
{
    PipelineFn(f)
}

impl<F, T> Pipeline for PipelineFn<F>
where
    F: Fn(&Exchange) -> Result<T, CrawlError> + Send + Sync,
    T: Send + 'static,
{
    type Output = T;

    fn transform(&self, exchange: &Exchange) -> Result<T, CrawlError> {
        (self.0)(exchange)
    }
}
