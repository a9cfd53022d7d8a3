use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::network::{NetworkInfo, NetworkType};
use crate::telemetry::TelemetrySnapshot;

/// Frames pushed from the backend to the dashboard:
///   { "type": "system_info",      "features": {...}, "network": {...} }
///   { "type": "telemetry",        "data": {...TelemetrySnapshot...}, "timestamp": 12.3 }
///   { "type": "network_update",   "network": {...NetworkInfo...} }
///   { "type": "command_response", "command": "TAKEOFF", "success": true }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEnvelope {
    SystemInfo(SystemInfo),
    Telemetry(TelemetryFrame),
    NetworkUpdate(NetworkUpdate),
    CommandResponse(CommandResponse),
}

impl TelemetryEnvelope {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEnvelope::SystemInfo(_) => "system_info",
            TelemetryEnvelope::Telemetry(_) => "telemetry",
            TelemetryEnvelope::NetworkUpdate(_) => "network_update",
            TelemetryEnvelope::CommandResponse(_) => "command_response",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkInfo>,
}

/// Capability flags advertised by the backend once per connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub mavlink: bool,
    #[serde(default)]
    pub zerotier_vpn: bool,
    #[serde(default)]
    pub network_simulation: bool,
    #[serde(default)]
    pub video_streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub data: TelemetrySnapshot,
    /// Seconds on the backend's clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkUpdate {
    pub network: NetworkInfo,
}

/// Carries no request id, so it cannot be matched to the command that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub success: bool,
}

/// Frames sent from the dashboard to the backend:
///   { "type": "command",        "command": "TAKEOFF", "params": {} }
///   { "type": "network_switch", "network": "LTE" }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    Command {
        command: String,
        #[serde(default)]
        params: Map<String, Value>,
    },
    NetworkSwitch {
        network: NetworkType,
    },
}

impl OutboundCommand {
    pub fn named(command: impl Into<String>, params: Map<String, Value>) -> Self {
        OutboundCommand::Command {
            command: command.into(),
            params,
        }
    }

    pub fn vehicle(cmd: VehicleCommand) -> Self {
        Self::named(cmd.as_str(), Map::new())
    }

    pub fn network_switch(network: NetworkType) -> Self {
        OutboundCommand::NetworkSwitch { network }
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The operator buttons of the command panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleCommand {
    Takeoff,
    Land,
    Rtl,
}

impl VehicleCommand {
    pub const ALL: [VehicleCommand; 3] = [
        VehicleCommand::Takeoff,
        VehicleCommand::Land,
        VehicleCommand::Rtl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCommand::Takeoff => "TAKEOFF",
            VehicleCommand::Land => "LAND",
            VehicleCommand::Rtl => "RTL",
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TAKEOFF" => Ok(VehicleCommand::Takeoff),
            "LAND" => Ok(VehicleCommand::Land),
            "RTL" | "RETURN" => Ok(VehicleCommand::Rtl),
            other => Err(format!("unknown vehicle command {other:?}")),
        }
    }
}
