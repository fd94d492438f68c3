use anyhow::Result;
use clap::Parser;
use renamebot::config::Config;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // A .env file next to the binary is the usual home of BOT_TOKEN
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref());

    // RUST_LOG wins, then -v, then the configured level
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "info".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    match cli.command {
        Commands::Run => cli::run::run(config?).await,
        Commands::Config(args) => cli::config::run(args, cli.config.as_deref(), config),
    }
}
