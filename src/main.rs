//! SMS Bridge - a minimal outbound message relay.

use clap::Parser;
use std::process::ExitCode;

use smsbridge::{logging, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Commands::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(args.writes_log_file());

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
