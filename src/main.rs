use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod api;
mod cache;
mod commands;
mod config;
mod models;
mod services;
mod utils;

use commands::{Cli, Context};
use config::Config;
use utils::{extract_clean_error, AppError};

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "tonrub=debug" } else { "tonrub=warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()?;
    debug!(
        "Using {} (API key {})",
        config.api_url,
        if config.api_key.is_some() { "set" } else { "not set" }
    );

    let ctx = Context::new(config, cli.no_cache, cli.refresh)?;
    commands::handle(&ctx, cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_tracing(verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_msg = e.to_string();
            debug!("Command failed: {:?}", e);
            eprintln!("error: {}", extract_clean_error(&error_msg, verbose));
            ExitCode::FAILURE
        }
    }
}
