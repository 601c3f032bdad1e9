//! hostwatch CLI - `hostwatch` command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod config;
mod locks;
mod logging;

/// hostwatch - Poll a directory for changes and sample host resources
#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: $HOSTWATCH_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the directory and sample resources until Ctrl-C, then write the report
    Run,
    /// Monitor the directory only, until Ctrl-C
    Watch,
    /// Sample host resources until Ctrl-C
    Sample {
        /// Take a single sample, print it and exit without logging
        #[arg(long)]
        once: bool,
    },
    /// Write the report from the existing logs
    Report,
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective configuration values
    Show,
    /// Show the config file location
    Path,
    /// Print an example configuration file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init(cli.verbose, cli.log_file.as_deref())?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run => cmd::run::run(config_path).await,
        Commands::Watch => cmd::watch::run(config_path).await,
        Commands::Sample { once } => cmd::sample::run(config_path, once).await,
        Commands::Report => cmd::report::run(config_path).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => cmd::config::run_show(config_path).await,
            ConfigCommands::Path => cmd::config::run_path(config_path).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
