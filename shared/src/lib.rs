//! Wire types shared by the dashboard client and the mock vehicle backend.

mod network;
mod protocol;
mod telemetry;

pub use network::{NetworkInfo, NetworkType, RemoteAccess, merge_network};
pub use protocol::{
    CommandResponse, FeatureFlags, NetworkUpdate, OutboundCommand, SystemInfo, TelemetryEnvelope,
    TelemetryFrame, VehicleCommand,
};
pub use telemetry::{
    Attitude, Battery, Heartbeat, Position, SystemStatus, TelemetrySnapshot, VehicleStatus,
};
