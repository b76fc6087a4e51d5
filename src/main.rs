//! Main entry point for the DeepL command-line client

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepl_client::cli::commands::{self, Commands};
use deepl_client::TranslationError;

/// DeepL Client - translate texts and documents from the command line
#[derive(Parser, Debug)]
#[command(name = "deepl", version, about, long_about = None)]
struct Args {
    /// Use the free API endpoint
    #[arg(short = 'f', long, global = true)]
    use_free_api: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv().ok();

    // Help and version are not failures; every other parse error is
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("deepl_client={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match commands::run(args.command, args.use_free_api, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TranslationError>() {
                Some(TranslationError::Cancelled) => eprintln!("Cancelled."),
                _ => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
