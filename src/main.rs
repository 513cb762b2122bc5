use anyhow::Result;
use clap::Parser;
use createai_probe::{
    cli::{self, Cli},
    config,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine, the token may already be exported
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Determine log level: environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logs.level.clone());

    let filter = match EnvFilter::try_new(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!(
                "Invalid log level: '{}' ({}). Valid levels: error, warn, info, debug, trace",
                log_level, e
            );
            std::process::exit(1);
        }
    };

    // stdout carries streamed text and reports, logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logs.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting createai-probe with log level: {}", log_level);

    cli::run(cli, config)
        .await
        .map_err(|e| {
            let context = cli::failure_context(&e);
            anyhow::Error::new(e).context(context)
        })?;

    Ok(())
}
