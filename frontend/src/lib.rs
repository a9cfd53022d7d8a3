//! Ground-control telemetry client.
//!
//! [`TelemetryClient`] holds one WebSocket to the vehicle backend, keeps the
//! latest snapshot plus a short history, and forwards operator commands.
//! Presentation code reads a [`ClientView`] and never touches the socket.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod ring_buffer;
pub mod telemetry_client;

pub use config::ClientConfig;
pub use error::ClientError;
pub use telemetry_client::TelemetryClient;
pub use telemetry_client::history::{ChartPoint, HISTORY_CAPACITY, HistoryEntry, TelemetryHistory};
pub use telemetry_client::state::{ClientView, ConnectionState, TelemetryState};
pub use telemetry_client::transport::{Connector, MemoryConnector, MemoryPeer, WsConnector};
