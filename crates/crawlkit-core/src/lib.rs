pub mod config;
pub mod logging;

pub mod consumer;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod handler;
pub mod pipeline;
pub mod proxy;
pub mod request;
pub mod retry;
pub mod scheduler;

pub use engine::{Engine, EngineBuilder, EngineConfig, StatsSnapshot};
pub use error::{CrawlError, FetchError};
pub use exchange::{Exchange, Response};
pub use request::{Method, WorkItem};
