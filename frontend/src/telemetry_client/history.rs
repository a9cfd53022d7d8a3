// frontend/src/telemetry_client/history.rs

use chrono::{DateTime, Utc};
use gcs_shared::TelemetrySnapshot;

use crate::ring_buffer::RingBuffer;

/// Number of snapshots kept for the charts.
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub received_at: DateTime<Utc>,
    /// Backend clock, seconds. Absent if the envelope had no timestamp.
    pub server_timestamp: Option<f64>,
    pub snapshot: TelemetrySnapshot,
}

/// Rolling window of the last [`HISTORY_CAPACITY`] telemetry snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    entries: RingBuffer<HistoryEntry>,
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryHistory {
    pub fn new() -> Self {
        Self {
            entries: RingBuffer::new(HISTORY_CAPACITY),
        }
    }

    pub fn record(
        &mut self,
        snapshot: TelemetrySnapshot,
        server_timestamp: Option<f64>,
        received_at: DateTime<Utc>,
    ) {
        self.entries.push(HistoryEntry {
            received_at,
            server_timestamp,
            snapshot,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.latest()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.to_vec()
    }

    /// Points for the altitude / speed / battery charts. Missing values plot as 0.
    pub fn chart_series(&self) -> Vec<ChartPoint> {
        chart_series(self.entries.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub index: usize,
    pub altitude: f64,
    pub ground_speed: f64,
    pub airspeed: f64,
    pub climb_rate: f64,
    pub battery: f64,
}

pub fn chart_series<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> Vec<ChartPoint> {
    entries
        .enumerate()
        .map(|(index, entry)| {
            let s = &entry.snapshot;
            ChartPoint {
                index,
                altitude: s.position.relative_altitude.unwrap_or(0.0),
                ground_speed: s.position.ground_speed.unwrap_or(0.0),
                airspeed: s.status.airspeed.unwrap_or(0.0),
                climb_rate: s.status.climb_rate.unwrap_or(0.0),
                battery: s.battery.remaining.unwrap_or(0.0),
            }
        })
        .collect()
}
