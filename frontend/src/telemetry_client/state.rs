// frontend/src/telemetry_client/state.rs

use chrono::{DateTime, Utc};
use gcs_shared::{SystemInfo, TelemetryEnvelope, TelemetrySnapshot, merge_network};
use std::fmt;
use tracing::{debug, info};

use super::history::{HistoryEntry, TelemetryHistory};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the dashboard knows about the vehicle and the link.
///
/// Frames are applied one at a time in delivery order; nothing here does I/O.
#[derive(Debug, Default)]
pub struct TelemetryState {
    connection: ConnectionState,
    telemetry: Option<TelemetrySnapshot>,
    system_info: Option<SystemInfo>,
    history: TelemetryHistory,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.telemetry.as_ref()
    }

    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_ref()
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }

    /// Returns true if the state changed.
    pub fn set_connection(&mut self, next: ConnectionState) -> bool {
        if self.connection == next {
            return false;
        }
        debug!("connection {} -> {}", self.connection, next);
        self.connection = next;
        true
    }

    /// Decodes one raw text frame and applies it.
    ///
    /// On error nothing has been touched; the caller logs and moves on.
    pub fn handle_frame(&mut self, raw: &str, received_at: DateTime<Utc>) -> Result<bool, ClientError> {
        let envelope = TelemetryEnvelope::decode(raw)?;
        Ok(self.apply(envelope, received_at))
    }

    /// Returns true if any field visible through [`ClientView`] changed.
    pub fn apply(&mut self, envelope: TelemetryEnvelope, received_at: DateTime<Utc>) -> bool {
        match envelope {
            TelemetryEnvelope::SystemInfo(info) => {
                info!(
                    "system info: mavlink={} vpn={} video={}",
                    info.features.mavlink, info.features.zerotier_vpn, info.features.video_streaming
                );
                self.system_info = Some(info);
                true
            }

            TelemetryEnvelope::Telemetry(frame) => {
                self.history
                    .record(frame.data.clone(), frame.timestamp, received_at);
                self.telemetry = Some(frame.data);
                true
            }

            TelemetryEnvelope::NetworkUpdate(update) => {
                let Some(current) = self.telemetry.as_ref() else {
                    debug!("network update before first telemetry; dropped");
                    return false;
                };
                info!("network updated: {}", update.network.kind);
                self.telemetry = Some(merge_network(current, &update.network));
                true
            }

            TelemetryEnvelope::CommandResponse(resp) => {
                info!(
                    "command response: {} success={}",
                    resp.command, resp.success
                );
                false
            }
        }
    }

    pub fn view(&self) -> ClientView {
        ClientView {
            connection: self.connection,
            telemetry: self.telemetry.clone(),
            system_info: self.system_info.clone(),
            history: self.history.to_vec(),
        }
    }
}

/// Read-only copy handed to presentation code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientView {
    pub connection: ConnectionState,
    pub telemetry: Option<TelemetrySnapshot>,
    pub system_info: Option<SystemInfo>,
    pub history: Vec<HistoryEntry>,
}
