//! Plain-text rendering of tracker snapshots.
//!
//! Everything here is pure: snapshot in, string out.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use fleetview::device::{DeviceView, GeoPoint};
use fleetview::time::{format_clock, format_local, time_ago};
use fleetview::tracker::{LoadPhase, MapFrame, TrackerSnapshot};

const NAME_WIDTH: usize = 24;

/// Coordinates for the device list: 4 decimals.
pub fn list_coordinates(point: Option<GeoPoint>) -> String {
    match point {
        Some(p) => format!("{:.4}, {:.4}", p.latitude, p.longitude),
        None => "No location data".to_string(),
    }
}

/// Coordinates for the details panel: 6 decimals.
pub fn detail_coordinates(point: GeoPoint) -> String {
    format!("{:.6}, {:.6}", point.latitude, point.longitude)
}

/// One device list row.
pub fn device_line(view: &DeviceView, selected: bool, now: DateTime<Utc>) -> String {
    let marker = if selected { '>' } else { ' ' };
    let dot = if view.status.is_online() { '●' } else { '○' };

    format!(
        "{} {} {:<width$} {:<7} {:<22} {}",
        marker,
        dot,
        truncate(view.name(), NAME_WIDTH),
        view.status,
        list_coordinates(view.coordinates),
        time_ago(view.last_update, now),
        width = NAME_WIDTH,
    )
}

/// The device list with a header.
pub fn device_list(snapshot: &TrackerSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let online = snapshot.devices.iter().filter(|v| v.status.is_online()).count();

    let _ = write!(out, "Devices ({} shown", snapshot.devices.len());
    if snapshot.devices.len() != snapshot.total_devices {
        let _ = write!(out, " of {}", snapshot.total_devices);
    }
    let _ = writeln!(out, ", {} online)", online);
    if !snapshot.search_term.trim().is_empty() {
        let _ = writeln!(out, "Search: \"{}\"", snapshot.search_term);
    }

    if snapshot.devices.is_empty() {
        let message = match snapshot.phase {
            LoadPhase::Loading => "Loading devices...",
            _ if snapshot.total_devices > 0 => "No devices match the search",
            _ => "No devices found",
        };
        let _ = writeln!(out, "  {}", message);
        return out;
    }

    let selected_id = snapshot.selected.as_ref().map(|v| v.id());
    for view in &snapshot.devices {
        let _ = writeln!(out, "{}", device_line(view, Some(view.id()) == selected_id, now));
    }
    out
}

/// Details panel for the selected device, empty when nothing is selected.
pub fn selection_details(snapshot: &TrackerSnapshot) -> String {
    let Some(view) = &snapshot.selected else {
        return String::new();
    };

    let mut out = String::new();
    let _ = write!(out, "Selected: {} (#{})", view.name(), view.id());
    if snapshot.selection_detached {
        let _ = write!(out, "  [not in latest poll]");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  Status:      {}", view.status);

    match view.coordinates {
        Some(point) => {
            let _ = writeln!(out, "  Coordinates: {}", detail_coordinates(point));
            let address = view.address.as_deref().unwrap_or("Loading address...");
            let _ = writeln!(out, "  Address:     {}", address);
        }
        None => {
            let _ = writeln!(out, "  Coordinates: No location data");
        }
    }

    let _ = writeln!(out, "  Speed:       {:.1} kn", view.speed);
    let _ = writeln!(out, "  Course:      {:.0}°", view.course);
    let last_update = view
        .last_update
        .map(format_local)
        .unwrap_or_else(|| "Unknown".to_string());
    let _ = writeln!(out, "  Last update: {}", last_update);

    let trail_len = snapshot
        .trails
        .iter()
        .find(|(id, _)| *id == view.id())
        .map_or(0, |(_, points)| points.len());
    let _ = writeln!(out, "  Trail:       {} points", trail_len);
    out
}

/// One-line description of the map framing.
pub fn map_line(map: &MapFrame) -> String {
    match map {
        MapFrame::Default { center, zoom } => {
            format!("Map: default view at {} (zoom {})", list_coordinates(Some(*center)), zoom)
        }
        MapFrame::Fit { bounds, padding } => format!(
            "Map: fit {} to {} (padding {}px)",
            list_coordinates(Some(bounds.south_west)),
            list_coordinates(Some(bounds.north_east)),
            padding
        ),
        MapFrame::Center { center, zoom } => {
            format!("Map: centred on {} (zoom {})", list_coordinates(Some(*center)), zoom)
        }
    }
}

/// Status footer.
pub fn footer(snapshot: &TrackerSnapshot) -> String {
    let mut out = match snapshot.last_refreshed {
        Some(at) => format!("Last updated: {}", format_clock(at)),
        None => "Last updated: never".to_string(),
    };
    match snapshot.phase {
        LoadPhase::Loading => out.push_str("  (loading...)"),
        LoadPhase::Refreshing => out.push_str("  (refreshing...)"),
        LoadPhase::Idle => {}
    }
    out
}

/// Full screen for the watch command.
pub fn screen(snapshot: &TrackerSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "!! {}", error);
        let _ = writeln!(out);
    }

    out.push_str(&device_list(snapshot, now));

    let details = selection_details(snapshot);
    if !details.is_empty() {
        let _ = writeln!(out);
        out.push_str(&details);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", map_line(&snapshot.map));
    let _ = writeln!(out, "{}", footer(snapshot));
    out
}

/// Trail points, oldest first.
pub fn trail(points: &[GeoPoint]) -> String {
    if points.is_empty() {
        return "No trail recorded".to_string();
    }
    points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:>3}. {}", i + 1, detail_coordinates(*p)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut short: String = name.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
