//! Tracker state - everything the presentation layer renders.
//!
//! All mutation is synchronous. The async service feeds results into this
//! struct and publishes a [`TrackerSnapshot`] after every change.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::reconcile::{reconcile, ONLINE_THRESHOLD};
use super::selection::{filter_by_name, Selection};
use super::trail::TrailBook;
use super::viewport::{frame, MapFrame};
use crate::device::{Device, DeviceId, DeviceView, GeoPoint, Position};

/// Banner shown when a poll fails.
pub const FETCH_FAILED_MESSAGE: &str =
    "Failed to fetch data. Please check if the Traccar server is running.";

/// Result of one poll: devices and positions fetched as a unit.
#[derive(Debug, Clone, Default)]
pub struct PollData {
    pub devices: Vec<Device>,
    pub positions: Vec<Position>,
}

/// Loading phases.
///
/// `Loading` only before the first completed poll; afterwards refreshes keep
/// the current data on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Loading,
    Refreshing,
    Idle,
}

/// Presentation state owned by the tracker.
#[derive(Debug, Clone)]
pub struct TrackerState {
    views: Vec<DeviceView>,
    filtered: Vec<DeviceView>,
    search_term: String,
    selection: Selection,
    trails: TrailBook,
    phase: LoadPhase,
    error: Option<String>,
    last_refreshed: Option<DateTime<Utc>>,
    online_threshold: Duration,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::with_settings(ONLINE_THRESHOLD, TrailBook::new())
    }

    pub fn with_settings(online_threshold: Duration, trails: TrailBook) -> Self {
        Self {
            views: Vec::new(),
            filtered: Vec::new(),
            search_term: String::new(),
            selection: Selection::None,
            trails,
            phase: LoadPhase::Loading,
            error: None,
            last_refreshed: None,
            online_threshold,
        }
    }

    /// A poll has started.
    pub fn begin_refresh(&mut self) {
        if self.phase != LoadPhase::Loading {
            self.phase = LoadPhase::Refreshing;
        }
    }

    /// Apply a completed poll: reconcile, record trails, refilter, refresh selection.
    pub fn apply_poll(&mut self, data: &PollData, now: DateTime<Utc>) {
        let reconciled = reconcile(
            &data.devices,
            &data.positions,
            self.selection.id(),
            now,
            self.online_threshold,
        );

        self.trails.record_views(&reconciled.views);
        self.views = reconciled.views;
        self.refilter();
        self.selection.refresh(reconciled.selected);

        self.phase = LoadPhase::Idle;
        self.error = None;
        self.last_refreshed = Some(now);

        tracing::debug!(
            devices = self.views.len(),
            online = self.views.iter().filter(|v| v.status.is_online()).count(),
            visible = self.filtered.len(),
            "Poll applied"
        );
    }

    /// Record a failed poll. Existing views stay as they are.
    pub fn apply_failure(&mut self, cause: &str) {
        tracing::warn!(error = cause, "Poll failed, keeping last known data");
        self.phase = LoadPhase::Idle;
        self.error = Some(FETCH_FAILED_MESSAGE.to_string());
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.refilter();
    }

    /// Select a device by id. Returns false for unknown ids.
    pub fn select(&mut self, id: DeviceId) -> bool {
        self.selection.pick(&self.views, id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Attach an address to the selected device if still relevant.
    pub fn attach_address(&mut self, id: DeviceId, point: GeoPoint, address: String) -> bool {
        self.selection.attach_address(id, point, address)
    }

    /// Coordinates of the selected device that still lack an address.
    pub fn pending_address(&self) -> Option<(DeviceId, GeoPoint)> {
        self.selection.pending_address()
    }

    pub fn views(&self) -> &[DeviceView] {
        &self.views
    }

    pub fn filtered(&self) -> &[DeviceView] {
        &self.filtered
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn trails(&self) -> &TrailBook {
        &self.trails
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == LoadPhase::Refreshing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Immutable copy for publishing to observers.
    pub fn snapshot(&self) -> TrackerSnapshot {
        let trails = self
            .views
            .iter()
            .map(|v| (v.id(), self.trails.points(v.id())))
            .filter(|(_, points)| !points.is_empty())
            .collect();

        TrackerSnapshot {
            devices: self.filtered.clone(),
            total_devices: self.views.len(),
            search_term: self.search_term.clone(),
            selected: self.selection.view().cloned(),
            selection_detached: self.selection.is_detached(),
            trails,
            map: frame(&self.filtered, self.selection.view()),
            phase: self.phase,
            error: self.error.clone(),
            last_refreshed: self.last_refreshed,
        }
    }

    fn refilter(&mut self) {
        self.filtered = filter_by_name(&self.views, &self.search_term);
    }
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

/// What observers receive after every state change.
#[derive(Debug, Clone, Default)]
pub struct TrackerSnapshot {
    /// Devices matching the search term, in server order.
    pub devices: Vec<DeviceView>,
    /// Devices before filtering.
    pub total_devices: usize,
    pub search_term: String,
    pub selected: Option<DeviceView>,
    /// The selected device was missing from the latest poll.
    pub selection_detached: bool,
    /// Trails of every device in the latest poll, oldest point first.
    /// Not limited by the search term.
    pub trails: Vec<(DeviceId, Vec<GeoPoint>)>,
    pub map: MapFrame,
    pub phase: LoadPhase,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}
