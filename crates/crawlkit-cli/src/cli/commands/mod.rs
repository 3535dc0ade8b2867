//! CLI command handlers.

mod config_path;
mod crawl;

pub use config_path::run_config_path;
pub use crawl::{run_crawl, CrawlArgs};
