use std::process::ExitCode;

use clap::Parser;
use klines::config::{self, Cli};
use klines::{Session, Shutdown, connect};
use klines_core::{KlinesError, SessionReport};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot render session report");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "klines failed");
            eprintln!("error: {e}");
            match e {
                KlinesError::Config(_) | KlinesError::InvalidArg(_) | KlinesError::Unsupported { .. } => {
                    ExitCode::from(2)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: &Cli) -> Result<SessionReport, KlinesError> {
    let cfg = config::resolve(cli)?;
    let client = connect::connect(&cfg)?;
    let shutdown = Shutdown::new();
    let _signals = shutdown.listen_for_signals();
    Session::new(cfg, client, shutdown.token())?.run().await
}
