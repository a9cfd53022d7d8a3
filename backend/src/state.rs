use crate::network_sim::NetworkManager;
use crate::vehicle_sim::VehicleSim;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::time::Instant;

#[derive(Clone)]
pub struct AppState {
    /// Mock vehicle, advanced by the vehicle task
    pub vehicle: Arc<Mutex<VehicleSim>>,

    /// Simulated link the dashboard is "connected" through
    pub network: Arc<Mutex<NetworkManager>>,

    /// Serialized telemetry envelopes → every connected dashboard
    pub ws_tx: broadcast::Sender<String>,

    /// Envelope timestamps are seconds since this instant
    pub started: Instant,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            vehicle: Arc::new(Mutex::new(VehicleSim::new())),
            network: Arc::new(Mutex::new(NetworkManager::new())),
            ws_tx: broadcast::channel(512).0,
            started: Instant::now(),
        }
    }

    pub fn vehicle(&self) -> MutexGuard<'_, VehicleSim> {
        self.vehicle.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn network(&self) -> MutexGuard<'_, NetworkManager> {
        self.network.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
