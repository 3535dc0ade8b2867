use crawlkit_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Log to the state-dir file when possible; a read-only home still gets stderr logs.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {e:#}");
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("crawlkit error: {:#}", err);
        std::process::exit(1);
    }
}
