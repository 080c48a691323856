//! `watch` - run the tracker and render every snapshot.
//!
//! Reads line commands from stdin while running:
//!
//! ```text
//! refresh            poll now
//! search <term>      filter by name
//! clear-search       show all devices
//! select <id>        select a device
//! deselect           clear the selection
//! trail <id>         print a device's recent positions
//! quit               stop
//! ```

use std::io::{IsTerminal, Write};

use chrono::Utc;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::error::CliError;
use crate::render;
use crate::runner::CliRunner;
use fleetview::device::DeviceId;
use fleetview::tracker::{
    LoadPhase, TrackerCommand, TrackerHandle, TrackerService, TrackerSnapshot,
};

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Initial search term
    #[arg(long)]
    pub search: Option<String>,

    /// Device id to select once the first poll completes
    #[arg(long)]
    pub select: Option<DeviceId>,
}

/// A parsed stdin line.
#[derive(Debug, PartialEq)]
pub enum WatchInput {
    Tracker(TrackerCommand),
    Trail(DeviceId),
    Help,
    Quit,
}

const HELP: &str = "Commands: refresh | search <term> | clear-search | select <id> | deselect | trail <id> | quit";

/// Parse one line of user input. Blank lines yield `Ok(None)`.
pub fn parse_input(line: &str) -> Result<Option<WatchInput>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let parse_id = |arg: &str| -> Result<DeviceId, String> {
        if arg.is_empty() {
            return Err(format!("'{}' needs a device id", word));
        }
        arg.parse()
            .map_err(|_| format!("'{}' is not a device id", arg))
    };

    let input = match word.to_lowercase().as_str() {
        "refresh" | "r" => WatchInput::Tracker(TrackerCommand::Refresh),
        "search" | "s" => WatchInput::Tracker(TrackerCommand::Search(rest.to_string())),
        "clear-search" => WatchInput::Tracker(TrackerCommand::Search(String::new())),
        "select" => WatchInput::Tracker(TrackerCommand::Select(parse_id(rest)?)),
        "deselect" => WatchInput::Tracker(TrackerCommand::ClearSelection),
        "trail" => WatchInput::Trail(parse_id(rest)?),
        "help" | "?" => WatchInput::Help,
        "quit" | "q" | "exit" => WatchInput::Quit,
        other => return Err(format!("Unknown command '{}'. {}", other, HELP)),
    };
    Ok(Some(input))
}

/// Hand out the `--select` id once a poll has succeeded.
///
/// A failed first poll leaves it pending for the next one.
fn take_ready_select(pending: &mut Option<DeviceId>, snapshot: &TrackerSnapshot) -> Option<DeviceId> {
    if snapshot.phase == LoadPhase::Idle && snapshot.error.is_none() {
        pending.take()
    } else {
        None
    }
}

/// Run the watch command.
pub async fn run(runner: &CliRunner, args: WatchArgs) -> Result<(), CliError> {
    runner.log_startup("watch");

    let client = runner.create_client()?;
    let handle = TrackerService::new(client, runner.config().tracker_config()).start();

    if let Some(term) = args.search {
        handle.search(term).await?;
    }

    println!("Connecting to {} ...", runner.config().server.url);
    println!("{}", HELP);

    let result = watch_loop(&handle, args.select).await;

    handle.shutdown().await;
    info!("Watch stopped");
    result
}

async fn watch_loop(handle: &TrackerHandle, mut pending_select: Option<DeviceId>) -> Result<(), CliError> {
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let clear_screen = std::io::stdout().is_terminal();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, stopping");
                return Ok(());
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();

                if let Some(id) = take_ready_select(&mut pending_select, &snapshot) {
                    handle.select(id).await?;
                }

                let mut stdout = std::io::stdout().lock();
                if clear_screen {
                    write!(stdout, "\x1b[2J\x1b[H")?;
                }
                write!(stdout, "{}", render::screen(&snapshot, Utc::now()))?;
                stdout.flush()?;
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };

                match parse_input(&line) {
                    Ok(None) => {}
                    Ok(Some(WatchInput::Quit)) => return Ok(()),
                    Ok(Some(WatchInput::Help)) => println!("{}", HELP),
                    Ok(Some(WatchInput::Trail(id))) => {
                        let snapshot = handle.snapshot();
                        let points = snapshot
                            .trails
                            .iter()
                            .find(|(trail_id, _)| *trail_id == id)
                            .map(|(_, points)| points.as_slice())
                            .unwrap_or_default();
                        println!("Trail for device {}:\n{}", id, render::trail(points));
                    }
                    Ok(Some(WatchInput::Tracker(command))) => {
                        if let TrackerCommand::Select(id) = &command {
                            if !handle.snapshot().devices.iter().any(|v| v.id() == *id) {
                                println!("No visible device with id {}", id);
                            }
                        }
                        handle.send(command).await?;
                    }
                    Err(message) => println!("{}", message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tracker_commands() {
        assert_eq!(
            parse_input("refresh").unwrap(),
            Some(WatchInput::Tracker(TrackerCommand::Refresh))
        );
        assert_eq!(
            parse_input("  search  Truck A ").unwrap(),
            Some(WatchInput::Tracker(TrackerCommand::Search("Truck A".to_string())))
        );
        assert_eq!(
            parse_input("clear-search").unwrap(),
            Some(WatchInput::Tracker(TrackerCommand::Search(String::new())))
        );
        assert_eq!(
            parse_input("select 42").unwrap(),
            Some(WatchInput::Tracker(TrackerCommand::Select(DeviceId(42))))
        );
        assert_eq!(
            parse_input("DESELECT").unwrap(),
            Some(WatchInput::Tracker(TrackerCommand::ClearSelection))
        );
    }

    #[test]
    fn test_parse_local_commands() {
        assert_eq!(parse_input("trail 7").unwrap(), Some(WatchInput::Trail(DeviceId(7))));
        assert_eq!(parse_input("quit").unwrap(), Some(WatchInput::Quit));
        assert_eq!(parse_input("?").unwrap(), Some(WatchInput::Help));
        assert_eq!(parse_input("   ").unwrap(), None);
    }

    #[test]
    fn test_select_waits_for_successful_poll() {
        let mut pending = Some(DeviceId(7));

        let loading = TrackerSnapshot::default();
        assert_eq!(take_ready_select(&mut pending, &loading), None);

        let failed = TrackerSnapshot {
            phase: LoadPhase::Idle,
            error: Some("Failed to fetch data.".to_string()),
            ..Default::default()
        };
        assert_eq!(take_ready_select(&mut pending, &failed), None);
        assert_eq!(pending, Some(DeviceId(7)));

        let ok = TrackerSnapshot {
            phase: LoadPhase::Idle,
            ..Default::default()
        };
        assert_eq!(take_ready_select(&mut pending, &ok), Some(DeviceId(7)));
        assert_eq!(take_ready_select(&mut pending, &ok), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_input("select").unwrap_err().contains("needs a device id"));
        assert!(parse_input("select abc").unwrap_err().contains("not a device id"));
        assert!(parse_input("launch").unwrap_err().contains("Unknown command"));
    }
}
