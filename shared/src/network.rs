use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::telemetry::TelemetrySnapshot;

/// Link descriptor carried inside telemetry snapshots and `network_update` envelopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Human label, e.g. "WiFi" or "4G/LTE".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub bandwidth_mbps: f64,
    #[serde(default)]
    pub connected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteAccess {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

/// Network types the operator may ask the backend to switch to.
///
/// Serialized with the upper-case names used in `network_switch` requests;
/// [`NetworkType::label`] is what the backend reports back in [`NetworkInfo::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Wifi,
    Lte,
    FiveG,
    Ethernet,
}

impl NetworkType {
    pub const ALL: [NetworkType; 4] = [
        NetworkType::Wifi,
        NetworkType::Lte,
        NetworkType::FiveG,
        NetworkType::Ethernet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Wifi => "WIFI",
            NetworkType::Lte => "LTE",
            NetworkType::FiveG => "FIVE_G",
            NetworkType::Ethernet => "ETHERNET",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NetworkType::Wifi => "WiFi",
            NetworkType::Lte => "4G/LTE",
            NetworkType::FiveG => "5G",
            NetworkType::Ethernet => "Ethernet",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    /// Accepts the wire name, the label, and a few operator shorthands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WIFI" | "WI-FI" => Ok(NetworkType::Wifi),
            "LTE" | "4G" | "4G/LTE" => Ok(NetworkType::Lte),
            "FIVE_G" | "5G" => Ok(NetworkType::FiveG),
            "ETHERNET" | "ETH" => Ok(NetworkType::Ethernet),
            other => Err(format!("unknown network type {other:?}")),
        }
    }
}

/// Applies a `network_update` patch: only `network` changes, every other
/// field of the snapshot is carried over untouched.
pub fn merge_network(snapshot: &TelemetrySnapshot, patch: &NetworkInfo) -> TelemetrySnapshot {
    TelemetrySnapshot {
        network: Some(patch.clone()),
        ..snapshot.clone()
    }
}
