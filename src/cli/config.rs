use anyhow::Result;
use clap::{Args, Subcommand};
use renamebot::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (token masked)
    Show,

    /// Write a commented config template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file location
    Path,
}

pub fn run(args: ConfigArgs, path: Option<&str>, loaded: Result<Config>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = loaded?;
            print!("{}", config.redacted().to_toml()?);
        }
        ConfigCommands::Init { force } => {
            let target = Config::resolve_path(path)?;
            Config::write_template(&target, force)?;
            println!("Wrote config template to {}", target.display());
        }
        ConfigCommands::Path => {
            let target = Config::resolve_path(path)?;
            let note = if target.exists() { "" } else { " (not created)" };
            println!("{}{}", target.display(), note);
        }
    }
    Ok(())
}
