//! Reconciliation - joins devices with positions into [`DeviceView`]s.
//!
//! This is a pure function of its inputs plus `now`: no I/O, no shared state.
//! Trail recording and selection handling are separate steps driven by the
//! caller with the output of [`reconcile`].
//!
//! # Position choice
//!
//! The server is expected to return one current position per device. When
//! it returns several for the same device, the one with the most recent
//! `device_time` wins; a position with a timestamp beats one without; exact
//! ties keep the earliest in poll order.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::device::{Device, DeviceId, DeviceStatus, DeviceView, Position};

/// Maximum report age for a device to be considered online.
pub const ONLINE_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Output of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// One view per distinct device id, in server order.
    pub views: Vec<DeviceView>,

    /// Fresh view for the previously selected id, `None` if it vanished
    /// (or nothing was selected).
    pub selected: Option<DeviceView>,
}

/// Reconcile using the wall clock and the default threshold.
pub fn reconcile_now(
    devices: &[Device],
    positions: &[Position],
    previous_selected: Option<DeviceId>,
) -> Reconciled {
    reconcile(devices, positions, previous_selected, Utc::now(), ONLINE_THRESHOLD)
}

/// Merge a device list and a position list taken from the same poll.
pub fn reconcile(
    devices: &[Device],
    positions: &[Position],
    previous_selected: Option<DeviceId>,
    now: DateTime<Utc>,
    online_threshold: Duration,
) -> Reconciled {
    let latest = latest_positions(positions);
    let mut seen = HashSet::with_capacity(devices.len());
    let mut views = Vec::with_capacity(devices.len());

    for device in devices {
        if !seen.insert(device.id) {
            tracing::debug!(device_id = %device.id, "Duplicate device in poll, keeping first");
            continue;
        }

        let position = latest.get(&device.id).copied();
        let status = classify(position, now, online_threshold);
        views.push(DeviceView::build(device, position, status));
    }

    let selected = previous_selected
        .and_then(|id| views.iter().find(|v| v.id() == id))
        .cloned();

    Reconciled { views, selected }
}

/// Online iff a position exists, carries a report time, and is younger than the threshold.
///
/// A report time in the future (device clock ahead) counts as fresh.
pub fn classify(
    position: Option<&Position>,
    now: DateTime<Utc>,
    online_threshold: Duration,
) -> DeviceStatus {
    let Some(reported) = position.and_then(|p| p.device_time) else {
        return DeviceStatus::Offline;
    };

    match (now - reported).to_std() {
        Ok(age) if age >= online_threshold => DeviceStatus::Offline,
        _ => DeviceStatus::Online,
    }
}

/// Pick one position per device id.
fn latest_positions(positions: &[Position]) -> HashMap<DeviceId, &Position> {
    let mut latest: HashMap<DeviceId, &Position> = HashMap::with_capacity(positions.len());

    for position in positions {
        latest
            .entry(position.device_id)
            .and_modify(|current| {
                if is_newer(position, current) {
                    *current = position;
                }
            })
            .or_insert(position);
    }

    latest
}

/// Strictly newer; equal timestamps keep the incumbent.
fn is_newer(candidate: &Position, incumbent: &Position) -> bool {
    match (candidate.device_time, incumbent.device_time) {
        (Some(c), Some(i)) => c > i,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GeoPoint;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn seconds_ago(secs: i64) -> DateTime<Utc> {
        now() - chrono::Duration::seconds(secs)
    }

    fn run(devices: &[Device], positions: &[Position], selected: Option<DeviceId>) -> Reconciled {
        reconcile(devices, positions, selected, now(), ONLINE_THRESHOLD)
    }

    #[test]
    fn test_fresh_position_is_online() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![Position::new(1, 9.0, 40.0).with_device_time(seconds_ago(60))];

        let result = run(&devices, &positions, None);

        assert_eq!(result.views.len(), 1);
        let view = &result.views[0];
        assert_eq!(view.id(), DeviceId(1));
        assert_eq!(view.status, DeviceStatus::Online);
        assert_eq!(view.coordinates, Some(GeoPoint::new(9.0, 40.0)));
    }

    #[test]
    fn test_stale_position_is_offline() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![Position::new(1, 9.0, 40.0).with_device_time(seconds_ago(600))];

        let result = run(&devices, &positions, None);
        assert_eq!(result.views[0].status, DeviceStatus::Offline);
        assert!(result.views[0].has_coordinates());
    }

    #[test]
    fn test_threshold_boundary() {
        let at = Position::new(1, 0.5, 0.5).with_device_time(seconds_ago(300));
        let just_under = Position::new(1, 0.5, 0.5).with_device_time(seconds_ago(299));

        assert_eq!(
            classify(Some(&at), now(), ONLINE_THRESHOLD),
            DeviceStatus::Offline
        );
        assert_eq!(
            classify(Some(&just_under), now(), ONLINE_THRESHOLD),
            DeviceStatus::Online
        );
    }

    #[test]
    fn test_future_report_time_is_online() {
        let ahead = Position::new(1, 0.5, 0.5).with_device_time(now() + chrono::Duration::seconds(30));
        assert_eq!(
            classify(Some(&ahead), now(), ONLINE_THRESHOLD),
            DeviceStatus::Online
        );
    }

    #[test]
    fn test_position_without_time_is_offline() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![Position::new(1, 9.0, 40.0)];

        let result = run(&devices, &positions, None);
        assert_eq!(result.views[0].status, DeviceStatus::Offline);
        assert!(result.views[0].last_update.is_none());
    }

    #[test]
    fn test_device_without_position() {
        let devices = vec![Device::new(1, "Truck A"), Device::new(2, "Van B")];
        let positions = vec![Position::new(1, 9.0, 40.0).with_device_time(seconds_ago(10))];

        let result = run(&devices, &positions, None);

        let van = &result.views[1];
        assert_eq!(van.status, DeviceStatus::Offline);
        assert!(van.coordinates.is_none());
        assert_eq!(van.speed, 0.0);
        assert_eq!(van.course, 0.0);
    }

    #[test]
    fn test_orphan_positions_ignored() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![Position::new(99, 1.0, 1.0).with_device_time(seconds_ago(10))];

        let result = run(&devices, &positions, None);
        assert_eq!(result.views.len(), 1);
        assert!(result.views[0].coordinates.is_none());
    }

    #[test]
    fn test_multiple_positions_most_recent_wins() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![
            Position::new(1, 1.0, 1.0).with_device_time(seconds_ago(120)),
            Position::new(1, 2.0, 2.0).with_device_time(seconds_ago(30)),
            Position::new(1, 3.0, 3.0),
        ];

        let result = run(&devices, &positions, None);
        assert_eq!(result.views[0].coordinates, Some(GeoPoint::new(2.0, 2.0)));
    }

    #[test]
    fn test_multiple_positions_tie_keeps_first() {
        let devices = vec![Device::new(1, "Truck A")];
        let ts = seconds_ago(30);
        let positions = vec![
            Position::new(1, 1.0, 1.0).with_device_time(ts),
            Position::new(1, 2.0, 2.0).with_device_time(ts),
        ];

        let result = run(&devices, &positions, None);
        assert_eq!(result.views[0].coordinates, Some(GeoPoint::new(1.0, 1.0)));
    }

    #[test]
    fn test_duplicate_device_ids_collapse() {
        let devices = vec![Device::new(1, "Truck A"), Device::new(1, "Truck A (dup)")];

        let result = run(&devices, &[], None);
        assert_eq!(result.views.len(), 1);
        assert_eq!(result.views[0].name(), "Truck A");
    }

    #[test]
    fn test_preserves_device_order() {
        let devices = vec![
            Device::new(3, "C"),
            Device::new(1, "A"),
            Device::new(2, "B"),
        ];

        let result = run(&devices, &[], None);
        let ids: Vec<i64> = result.views.iter().map(|v| v.id().0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_selected_is_refreshed() {
        let devices = vec![Device::new(1, "Truck A")];
        let positions = vec![Position::new(1, 9.5, 40.5).with_device_time(seconds_ago(5))];

        let result = run(&devices, &positions, Some(DeviceId(1)));
        let selected = result.selected.expect("selected device should be present");
        assert_eq!(selected.coordinates, Some(GeoPoint::new(9.5, 40.5)));
    }

    #[test]
    fn test_selected_vanished_is_none() {
        let devices = vec![Device::new(2, "Van B")];

        let result = run(&devices, &[], Some(DeviceId(1)));
        assert!(result.selected.is_none());
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let devices = vec![Device::new(1, "Truck A"), Device::new(2, "Van B")];
        let positions = vec![
            Position::new(2, 8.0, 38.0).with_device_time(seconds_ago(400)),
            Position::new(1, 9.0, 40.0).with_device_time(seconds_ago(60)),
        ];

        let first = run(&devices, &positions, Some(DeviceId(2)));
        let second = run(&devices, &positions, Some(DeviceId(2)));
        assert_eq!(first.views, second.views);
        assert_eq!(first.selected, second.selected);
    }

    #[test]
    fn test_custom_threshold() {
        let position = Position::new(1, 0.0, 0.0).with_device_time(seconds_ago(90));
        assert_eq!(
            classify(Some(&position), now(), Duration::from_secs(60)),
            DeviceStatus::Offline
        );
    }
}
