use serde::{Deserialize, Serialize};
use std::fmt;

use crate::network::{NetworkInfo, RemoteAccess};

/// One full vehicle snapshot as pushed by the backend in a `telemetry` envelope.
///
/// Every block is optional: a backend that has not heard from the vehicle yet
/// sends empty objects, and the real MAVLink bridge only fills the fields it
/// has decoded so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    #[serde(default)]
    pub heartbeat: Heartbeat,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub attitude: Attitude,
    #[serde(default)]
    pub battery: Battery,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_access: Option<RemoteAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_status: Option<SystemStatus>,
    /// MAVLink `base_mode` bitmask (bit 7 = armed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_mode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_mode: Option<u32>,
}

impl Heartbeat {
    pub const MAV_MODE_FLAG_SAFETY_ARMED: u32 = 0b1000_0000;

    pub fn is_armed(&self) -> Option<bool> {
        self.base_mode
            .map(|mode| mode & Self::MAV_MODE_FLAG_SAFETY_ARMED != 0)
    }
}

/// The real bridge forwards the raw MAVLink code, the mock backend a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemStatus {
    Code(u8),
    Label(String),
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Code(code) => write!(f, "{code}"),
            SystemStatus::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Metres above mean sea level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Metres above home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_z: Option<f64>,
}

impl Position {
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Degrees, and degrees per second for the rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollspeed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitchspeed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yawspeed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    /// Percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_consumed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airspeed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climb_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blocks_parse_as_unknown() {
        let snap: TelemetrySnapshot = serde_json::from_str(
            r#"{"connected":false,"heartbeat":{},"position":{},"attitude":{},"battery":{},"status":{}}"#,
        )
        .expect("empty snapshot should parse");

        assert_eq!(snap.connected, Some(false));
        assert_eq!(snap.position.lat_lon(), None);
        assert_eq!(snap.network, None);
    }

    #[test]
    fn system_status_accepts_code_or_label() {
        let coded: Heartbeat =
            serde_json::from_str(r#"{"system_status":4,"base_mode":209}"#).unwrap();
        assert_eq!(coded.system_status, Some(SystemStatus::Code(4)));
        assert_eq!(coded.is_armed(), Some(true));

        let labelled: Heartbeat =
            serde_json::from_str(r#"{"flight_mode":"AUTO","system_status":"ACTIVE","base_mode":81}"#)
                .unwrap();
        assert_eq!(labelled.is_armed(), Some(false));
        assert_eq!(
            labelled.system_status.as_ref().map(ToString::to_string).as_deref(),
            Some("ACTIVE")
        );
    }
}
