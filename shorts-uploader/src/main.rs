use clap::Parser;
use shorts_uploader::cli::{run, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) if report.is_success() => {
            tracing::info!(uploaded = report.uploaded(), "CLI completed successfully");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            tracing::error!(
                skipped = report.skipped(),
                failed = report.failed(),
                "No clip was uploaded"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}
