pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "renamebot")]
#[command(author, version, about = "Telegram bot that renames uploaded files")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "RENAMEBOT_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the bot (long polling until Ctrl-C)
    Run,

    /// Configuration management
    Config(config::ConfigArgs),
}
