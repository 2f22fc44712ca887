//! Serena - Telegram wellbeing assistant.

use clap::Parser;
use std::process::ExitCode;

use serena::cli::Commands;
use serena::{config, logging};

#[tokio::main]
async fn main() -> ExitCode {
    config::load_dotenv();

    // Parse command line arguments
    let args = Commands::parse();

    // Initialize logging; the guard flushes the file writer on exit
    let _guard = match logging::init(args.command.log_prefix()) {
        Ok((guard, log_dir)) => {
            tracing::debug!("Logging to {}", log_dir.display());
            guard
        }
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
