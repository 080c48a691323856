//! Time-related utility functions.
//!
//! Human-readable renderings of report timestamps.

use chrono::{DateTime, Local, Utc};

/// Relative age of a timestamp: "Just now", "5m ago", "3h ago", "2d ago".
///
/// `None` renders as "Unknown". Timestamps in the future count as "Just now".
pub fn time_ago(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(timestamp) = timestamp else {
        return "Unknown".to_string();
    };

    let minutes = now.signed_duration_since(timestamp).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    format!("{}d ago", hours / 24)
}

/// Local wall-clock rendering, e.g. `2025-06-01 14:03:22`.
pub fn format_local(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Local time of day, e.g. `14:03:22`.
pub fn format_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}
