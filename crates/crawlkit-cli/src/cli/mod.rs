//! CLI for the crawlkit crawling engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_config_path, run_crawl, CrawlArgs};

/// Top-level CLI for crawlkit.
#[derive(Debug, Parser)]
#[command(name = "crawlkit")]
#[command(about = "crawlkit: multi-threaded web crawler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Crawl from one or more seed URLs until no work is left.
    Crawl {
        /// Seed URLs (http or https).
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        /// Follow links whose absolute URL matches this regex. Without it only the seeds are fetched.
        #[arg(long, value_name = "REGEX")]
        follow: Option<String>,

        /// Number of worker threads (overrides config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Outbound proxy, `host:port` or `user:pass@host:port`. Repeat for a pool.
        #[arg(long, value_name = "HOST:PORT")]
        proxy: Vec<String>,

        /// User-Agent header (overrides config).
        #[arg(long, value_name = "UA")]
        user_agent: Option<String>,

        /// Read configuration from this file instead of the default location.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Print one JSON object per fetched page.
        #[arg(long)]
        json: bool,

        /// Give up waiting for the crawl to go idle after this many seconds.
        #[arg(long, value_name = "SECS")]
        idle_timeout: Option<u64>,
    },

    /// Print the path of the configuration file.
    ConfigPath,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Crawl {
                urls,
                follow,
                workers,
                proxy,
                user_agent,
                config,
                json,
                idle_timeout,
            } => run_crawl(CrawlArgs {
                urls,
                follow,
                workers,
                proxies: proxy,
                user_agent,
                config,
                json,
                idle_timeout,
            })?,
            CliCommand::ConfigPath => run_config_path()?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
