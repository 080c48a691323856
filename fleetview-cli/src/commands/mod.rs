//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`address`] - One reverse-geocode lookup
//! - [`config`] - Configuration management (path, show, init)
//! - [`snapshot`] - Poll once and print the device list
//! - [`watch`] - Run the tracker with live rendering (main command)

pub mod address;
pub mod config;
pub mod snapshot;
pub mod watch;
