use clap::Parser;
use tracing_subscriber::EnvFilter;

use goalplan::cli::{self, Cli};
use goalplan::config::AppConfig;

const DEFAULT_LOG_FILTER: &str = "goalplan=info,tower_http=info";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Loads .env before the filter reads RUST_LOG.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(cli, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
