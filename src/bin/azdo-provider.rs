use clap::Parser;
use tracing::error;

use azdo_provider::cli::{self, Args, ExitCode};
use azdo_provider::logging::{init_logging, parse_early_log_config};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Logging starts before argument parsing so start-up is covered too
    let raw_args: Vec<String> = std::env::args().collect();
    let _log_guard = init_logging(parse_early_log_config(&raw_args));

    let args = Args::parse();

    match cli::run(args).await {
        Ok(code) => code.into(),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::GeneralError.into()
        }
    }
}
