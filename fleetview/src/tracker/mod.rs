//! Device tracking engine.
//!
//! Turns raw device and position polls into the views a fleet display
//! renders: reconciliation, movement trails, search filtering, selection,
//! and map framing. [`TrackerService`] drives it on a timer.
//!
//! # Data Flow
//!
//! ```text
//! poll ──► reconcile ──► views ──┬──► trails
//!                                ├──► filter_by_name ──► visible list
//!                                └──► selection ──► address lookup
//! ```

mod poller;
mod reconcile;
mod selection;
mod service;
mod state;
mod trail;
mod viewport;

pub use poller::{fetch_poll, run_poll, PollGate, PollResult};
pub use reconcile::{classify, reconcile, reconcile_now, Reconciled, ONLINE_THRESHOLD};
pub use selection::{filter_by_name, resolve_selection, Selection};
pub use service::{
    TrackerCommand, TrackerConfig, TrackerError, TrackerHandle, TrackerService,
    DEFAULT_POLL_INTERVAL,
};
pub use state::{LoadPhase, PollData, TrackerSnapshot, TrackerState, FETCH_FAILED_MESSAGE};
pub use trail::{PathTrail, TrailBook, MAX_TRAIL_POINTS};
pub use viewport::{frame, Bounds, MapFrame, DEFAULT_CENTER, DEFAULT_ZOOM, SELECTED_ZOOM};
