//! `snapshot` - poll once, print the device list, exit.

use chrono::Utc;
use clap::Args;

use crate::error::CliError;
use crate::render;
use crate::runner::CliRunner;
use fleetview::tracker::{fetch_poll, TrackerState, TrailBook};

/// Arguments for the snapshot command.
#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Only show devices whose name contains this term
    #[arg(long)]
    pub search: Option<String>,

    /// Print the device views as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run the snapshot command.
pub async fn run(runner: &CliRunner, args: SnapshotArgs) -> Result<(), CliError> {
    runner.log_startup("snapshot");

    let client = runner.create_client()?;
    let tracker_config = runner.config().tracker_config();

    let data = fetch_poll(&client).await?;

    let mut state = TrackerState::with_settings(
        tracker_config.online_threshold,
        TrailBook::with_capacity(tracker_config.trail_points),
    );
    if let Some(term) = args.search {
        state.set_search_term(term);
    }
    let now = Utc::now();
    state.apply_poll(&data, now);

    if args.json {
        let json = serde_json::to_string_pretty(state.filtered())
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        println!("{}", json);
    } else {
        print!("{}", render::device_list(&state.snapshot(), now));
    }

    Ok(())
}
