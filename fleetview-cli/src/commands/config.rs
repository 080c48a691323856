//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show`, and `config init`. These run
//! without logging so they work even when the log location is broken.

use std::path::Path;

use clap::Subcommand;
use fleetview::config::{ConfigFile, ENV_EMAIL, ENV_PASSWORD, ENV_SERVER_URL};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file plus environment overrides)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand against `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(path),
        ConfigCommands::Show => run_show(path),
        ConfigCommands::Init { force } => run_init(path, force),
    }
}

fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are in use)");
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = load_config(path)?;
    print!("{}", describe(&config));

    let overrides: Vec<&str> = [ENV_SERVER_URL, ENV_EMAIL, ENV_PASSWORD]
        .into_iter()
        .filter(|key| std::env::var(key).is_ok_and(|v| !v.trim().is_empty()))
        .collect();
    if !overrides.is_empty() {
        println!();
        println!("Overridden by environment: {}", overrides.join(", "));
    }
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

/// Human-readable dump of the effective configuration. Passwords are masked.
pub fn describe(config: &ConfigFile) -> String {
    let password = if config.server.password.is_empty() {
        "(not set)"
    } else {
        "********"
    };
    let email = if config.server.email.is_empty() {
        "(not set)"
    } else {
        config.server.email.as_str()
    };

    format!(
        "[server]\n  url = {}\n  email = {}\n  password = {}\n  timeout = {}s\n\
         [geocoder]\n  url = {}\n  user_agent = {}\n  zoom = {}\n\
         [polling]\n  interval = {}s\n  online_threshold = {}s\n\
         [trail]\n  max_points = {}\n\
         [logging]\n  file = {}\n",
        config.server.url,
        email,
        password,
        config.server.timeout,
        config.geocoder.url,
        config.geocoder.user_agent,
        config.geocoder.zoom,
        config.polling.interval,
        config.polling.online_threshold,
        config.trail.max_points,
        config.logging.file.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_masks_password() {
        let mut config = ConfigFile::default();
        config.server.password = "hunter2".to_string();

        let out = describe(&config);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("password = ********"));
        assert!(out.contains("email = (not set)"));
        assert!(out.contains("interval = 30s"));
    }
}
