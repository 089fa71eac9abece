//! Scout CLI
//!
//! Command-line explorer for public repository search, with session-local
//! edits and deletions layered over the fetched results.

mod commands;
mod config;
mod explorer;
mod render;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Search and curate repositories from the terminal", long_about = None)]
struct Cli {
    /// Search API root
    #[arg(long, env = "SCOUT_API_URL", default_value = scout_client::DEFAULT_API_URL)]
    api_url: String,

    /// Access token, raises the rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "SCOUT_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with rendered output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scout_cli=warn,scout_client=warn,scout_core=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
