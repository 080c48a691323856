//! FleetView CLI - Command-line interface
//!
//! This binary provides a terminal front end to the FleetView library.

mod commands;
mod error;
mod render;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::address::AddressArgs;
use commands::config::ConfigCommands;
use commands::snapshot::SnapshotArgs;
use commands::watch::WatchArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "fleetview")]
#[command(version = fleetview::VERSION)]
#[command(about = "Live device tracking for Traccar servers", long_about = None)]
struct Cli {
    /// Config file (default: ~/.fleetview/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track devices live, reading commands from stdin
    Watch(WatchArgs),

    /// Poll once and print the device list
    Snapshot(SnapshotArgs),

    /// Look up the address of a coordinate
    Address(AddressArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Commands::Config(command) => {
            let path = cli
                .config
                .unwrap_or_else(fleetview::config::config_file_path);
            return commands::config::run(command, &path);
        }
        other => other,
    };

    let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match command {
            Commands::Watch(args) => commands::watch::run(&runner, args).await,
            Commands::Snapshot(args) => commands::snapshot::run(&runner, args).await,
            Commands::Address(args) => commands::address::run(&runner, args).await,
            Commands::Config(_) => unreachable!("handled before the runtime starts"),
        }
    })
}
