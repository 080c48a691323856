//! Poll fetching and stale-result suppression.
//!
//! Polls can overlap: a timer tick may start a poll while a slow one is
//! still in flight. Each poll carries a generation number and the
//! [`PollGate`] only lets through results newer than the last one applied,
//! so a slow response can never overwrite fresher data.

use super::state::PollData;
use crate::telemetry::{TelemetryClient, TelemetryError};

/// Generation counter for overlapping polls.
#[derive(Debug, Default)]
pub struct PollGate {
    issued: u64,
    applied: u64,
}

impl PollGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the generation number for a new poll.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a completed poll may be applied. Accepting marks it applied.
    pub fn accept(&mut self, generation: u64) -> bool {
        if generation <= self.applied {
            tracing::debug!(
                generation,
                applied = self.applied,
                "Discarding out-of-order poll result"
            );
            return false;
        }
        self.applied = generation;
        true
    }

    /// True while a poll newer than the last applied one is outstanding.
    pub fn in_flight(&self) -> bool {
        self.issued > self.applied
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

/// A finished poll tagged with its generation.
#[derive(Debug)]
pub struct PollResult {
    pub generation: u64,
    pub outcome: Result<PollData, TelemetryError>,
}

/// Fetch devices, then positions, as one unit. Either failure fails the poll.
pub async fn fetch_poll<C: TelemetryClient>(client: &C) -> Result<PollData, TelemetryError> {
    let devices = client.fetch_devices().await?;
    let positions = client.fetch_positions().await?;
    Ok(PollData { devices, positions })
}

/// Run one poll and tag the outcome.
pub async fn run_poll<C: TelemetryClient>(client: &C, generation: u64) -> PollResult {
    let started = std::time::Instant::now();
    let outcome = fetch_poll(client).await;

    tracing::debug!(
        generation,
        ok = outcome.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Poll finished"
    );

    PollResult { generation, outcome }
}
