mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, inspect, replay, settings, InitArgs, InspectArgs, ReplayArgs, SettingsCommand,
};
use tracing_subscriber::EnvFilter;

/// Page builder CLI - edit pages and site settings from the terminal
#[derive(Parser, Debug)]
#[command(name = "pagebuilder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a pagebuilder.config.json
    Init(InitArgs),

    /// Apply a log of action events to a page file
    Replay(ReplayArgs),

    /// List or page through the elements of a page file
    Inspect(InspectArgs),

    /// Read or update the site settings record
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; RUST_LOG=debug shows editor and cache internals
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(dir) => {
            let cwd = dir.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Replay(args) => replay(args, &cwd),
                Command::Inspect(args) => inspect(args, &cwd),
                Command::Settings { command } => settings(command, &cwd).await,
            }
        }
        Err(e) => Err(anyhow::anyhow!("Cannot get current directory: {}", e)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
