//! Tracker service - the polling daemon that owns [`TrackerState`].
//!
//! One task owns the state. Network work (polls, address lookups) runs in
//! spawned tasks that report back over an mpsc channel, so state changes
//! happen in exactly one place and never across an await.
//!
//! ```text
//!  ticker ──┐
//!  commands ┼──► service loop ──► TrackerState ──► watch::Sender<TrackerSnapshot>
//!  results ─┘        │
//!                    └──► spawned poll / geocode tasks ──► results
//! ```
//!
//! Shutdown goes through a [`CancellationToken`]; in-flight tasks observe the
//! same token and exit without reporting.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::poller::{run_poll, PollGate, PollResult};
use super::reconcile::ONLINE_THRESHOLD;
use super::state::{TrackerSnapshot, TrackerState};
use super::trail::{TrailBook, MAX_TRAIL_POINTS};
use crate::device::{DeviceId, GeoPoint};
use crate::geocode::GeocodeCache;
use crate::telemetry::TelemetryClient;

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Command channel capacity.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Errors from talking to a running tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker service has stopped")]
    Stopped,
}

/// Tracker tuning.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub online_threshold: Duration,
    pub trail_points: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            online_threshold: ONLINE_THRESHOLD,
            trail_points: MAX_TRAIL_POINTS,
        }
    }
}

/// User intents accepted by the service.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCommand {
    /// Poll now, unless a poll is already in flight.
    Refresh,
    Search(String),
    Select(DeviceId),
    ClearSelection,
}

/// Results reported by spawned tasks.
enum TaskEvent {
    Poll(PollResult),
    Address {
        device_id: DeviceId,
        point: GeoPoint,
        address: String,
    },
}

/// Tracker daemon. Create with [`TrackerService::new`], run with [`TrackerService::start`].
pub struct TrackerService<C: TelemetryClient> {
    client: Arc<C>,
    geocoder: Arc<GeocodeCache>,
    config: TrackerConfig,
}

impl<C: TelemetryClient + 'static> TrackerService<C> {
    pub fn new(client: C, config: TrackerConfig) -> Self {
        Self::with_cache(Arc::new(client), Arc::new(GeocodeCache::new()), config)
    }

    /// Share an existing client and address cache.
    pub fn with_cache(client: Arc<C>, geocoder: Arc<GeocodeCache>, config: TrackerConfig) -> Self {
        Self {
            client,
            geocoder,
            config,
        }
    }

    /// Start the service as an async task.
    pub fn start(self) -> TrackerHandle {
        let cancel = CancellationToken::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(TrackerSnapshot::default());

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                self.run(command_rx, snapshot_tx, cancel).await;
            })
        };

        TrackerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            cancel,
            task: Arc::new(std::sync::Mutex::new(Some(task))),
        }
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<TrackerCommand>,
        snapshots: watch::Sender<TrackerSnapshot>,
        cancel: CancellationToken,
    ) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            online_threshold_secs = self.config.online_threshold.as_secs(),
            trail_points = self.config.trail_points,
            "Tracker service started"
        );

        let mut state = TrackerState::with_settings(
            self.config.online_threshold,
            TrailBook::with_capacity(self.config.trail_points),
        );
        let mut gate = PollGate::new();
        let mut requested_address: Option<(DeviceId, GeoPoint)> = None;
        let (event_tx, mut events) = mpsc::unbounded_channel();

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        snapshots.send_replace(state.snapshot());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Tracker cancelled");
                    break;
                }

                _ = ticker.tick() => {
                    self.spawn_poll(&mut state, &mut gate, &event_tx, &cancel);
                }

                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("All tracker handles dropped, stopping");
                        break;
                    };
                    self.handle_command(command, &mut state, &mut gate, &event_tx, &cancel);
                }

                Some(event) = events.recv() => {
                    match event {
                        TaskEvent::Poll(result) => apply_poll_result(&mut state, &mut gate, result),
                        TaskEvent::Address { device_id, point, address } => {
                            if !state.attach_address(device_id, point, address) {
                                tracing::trace!(device_id = %device_id, "Dropping stale address");
                            }
                        }
                    }
                }
            }

            self.request_address(&mut state, &mut requested_address, &event_tx, &cancel);
            snapshots.send_replace(state.snapshot());
        }

        self.geocoder.log_stats();
        tracing::info!("Tracker service stopped");
    }

    fn handle_command(
        &self,
        command: TrackerCommand,
        state: &mut TrackerState,
        gate: &mut PollGate,
        events: &mpsc::UnboundedSender<TaskEvent>,
        cancel: &CancellationToken,
    ) {
        tracing::debug!(?command, "Tracker command");

        match command {
            TrackerCommand::Refresh => {
                if gate.in_flight() {
                    tracing::debug!("Refresh ignored, poll already in flight");
                } else {
                    self.spawn_poll(state, gate, events, cancel);
                }
            }
            TrackerCommand::Search(term) => state.set_search_term(term),
            TrackerCommand::Select(id) => {
                state.select(id);
            }
            TrackerCommand::ClearSelection => state.clear_selection(),
        }
    }

    fn spawn_poll(
        &self,
        state: &mut TrackerState,
        gate: &mut PollGate,
        events: &mpsc::UnboundedSender<TaskEvent>,
        cancel: &CancellationToken,
    ) {
        let generation = gate.begin();
        state.begin_refresh();

        let client = Arc::clone(&self.client);
        let events = events.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = run_poll(client.as_ref(), generation) => {
                    let _ = events.send(TaskEvent::Poll(result));
                }
            }
        });
    }

    /// Start an address lookup for the selection if it needs one.
    ///
    /// Cached addresses are attached immediately; misses resolve in a task.
    fn request_address(
        &self,
        state: &mut TrackerState,
        requested: &mut Option<(DeviceId, GeoPoint)>,
        events: &mpsc::UnboundedSender<TaskEvent>,
        cancel: &CancellationToken,
    ) {
        let Some((device_id, point)) = state.pending_address() else {
            *requested = None;
            return;
        };
        if *requested == Some((device_id, point)) {
            return;
        }

        if let Some(address) = self.geocoder.cached(point.latitude, point.longitude) {
            state.attach_address(device_id, point, address);
            *requested = None;
            return;
        }

        *requested = Some((device_id, point));

        let client = Arc::clone(&self.client);
        let geocoder = Arc::clone(&self.geocoder);
        let events = events.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let lookup = geocoder.resolve(point.latitude, point.longitude, |lat, lon| async move {
                client.reverse_geocode(lat, lon).await
            });

            tokio::select! {
                _ = cancel.cancelled() => {}
                address = lookup => {
                    let _ = events.send(TaskEvent::Address { device_id, point, address });
                }
            }
        });
    }
}

fn apply_poll_result(state: &mut TrackerState, gate: &mut PollGate, result: PollResult) {
    if !gate.accept(result.generation) {
        return;
    }

    match result.outcome {
        Ok(data) => state.apply_poll(&data, Utc::now()),
        Err(e) => state.apply_failure(&e.to_string()),
    }
}

/// Cloneable handle to a running tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<TrackerCommand>,
    snapshots: watch::Receiver<TrackerSnapshot>,
    cancel: CancellationToken,
    task: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl TrackerHandle {
    pub async fn send(&self, command: TrackerCommand) -> Result<(), TrackerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TrackerError::Stopped)
    }

    pub async fn refresh(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Refresh).await
    }

    pub async fn search(&self, term: impl Into<String>) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Search(term.into())).await
    }

    pub async fn select(&self, id: DeviceId) -> Result<(), TrackerError> {
        self.send(TrackerCommand::Select(id)).await
    }

    pub async fn clear_selection(&self) -> Result<(), TrackerError> {
        self.send(TrackerCommand::ClearSelection).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshots.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.commands.is_closed()
    }

    /// Stop the service and wait for its loop to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let task = self
            .task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Tracker task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, Position};
    use crate::telemetry::TelemetryError;
    use crate::tracker::state::LoadPhase;

    struct FixedClient;

    impl TelemetryClient for FixedClient {
        async fn fetch_devices(&self) -> Result<Vec<Device>, TelemetryError> {
            Ok(vec![Device::new(1, "Truck A"), Device::new(2, "Van B")])
        }

        async fn fetch_positions(&self) -> Result<Vec<Position>, TelemetryError> {
            Ok(vec![Position::new(1, 9.0, 40.0).with_device_time(Utc::now())])
        }

        async fn reverse_geocode(&self, _: f64, _: f64) -> Result<String, TelemetryError> {
            Ok("Addis Ababa, Ethiopia".to_string())
        }
    }

    async fn wait_for(
        rx: &mut watch::Receiver<TrackerSnapshot>,
        predicate: impl Fn(&TrackerSnapshot) -> bool,
    ) -> TrackerSnapshot {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for snapshot")
            .expect("tracker stopped")
            .clone()
    }

    #[test]
    fn test_apply_poll_result_respects_gate() {
        let mut state = TrackerState::new();
        let mut gate = PollGate::new();
        let old = gate.begin();
        let new = gate.begin();

        apply_poll_result(
            &mut state,
            &mut gate,
            PollResult {
                generation: new,
                outcome: Ok(Default::default()),
            },
        );
        apply_poll_result(
            &mut state,
            &mut gate,
            PollResult {
                generation: old,
                outcome: Err(TelemetryError::HttpError("late".into())),
            },
        );

        assert!(state.error().is_none());
        assert_eq!(state.phase(), LoadPhase::Idle);
    }

    #[tokio::test]
    async fn test_first_poll_is_immediate() {
        let handle = TrackerService::new(FixedClient, TrackerConfig::default()).start();
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.phase == LoadPhase::Idle).await;
        assert_eq!(snapshot.devices.len(), 2);
        assert!(snapshot.devices[0].status.is_online());

        handle.shutdown().await;
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_select_resolves_address() {
        let handle = TrackerService::new(FixedClient, TrackerConfig::default()).start();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.phase == LoadPhase::Idle).await;

        handle.select(DeviceId(1)).await.unwrap();
        let snapshot = wait_for(&mut rx, |s| {
            s.selected.as_ref().and_then(|v| v.address.as_deref()).is_some()
        })
        .await;

        assert_eq!(
            snapshot.selected.unwrap().address.as_deref(),
            Some("Addis Ababa, Ethiopia")
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_commands_fail_after_shutdown() {
        let handle = TrackerService::new(FixedClient, TrackerConfig::default()).start();
        handle.shutdown().await;

        assert!(matches!(handle.refresh().await, Err(TrackerError::Stopped)));
    }
}
