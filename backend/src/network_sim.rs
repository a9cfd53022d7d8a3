// network_sim.rs
//
// Simulated uplink. The dashboard can ask to switch link type; latency and
// bandwidth wander within the selected type's range.

use gcs_shared::{NetworkInfo, NetworkType, RemoteAccess};
use rand::RngExt;
use std::ops::RangeInclusive;
use tokio::time::{Duration, interval};
use tracing::info;

use crate::state::AppState;

pub const RESAMPLE_PERIOD: Duration = Duration::from_secs(5);

pub const REMOTE_ACCESS_PROTOCOL: &str = "ZeroTier VPN";

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkManager {
    current: NetworkType,
    latency_ms: u32,
    bandwidth_mbps: u32,
    connected: bool,
}

impl Default for NetworkManager {
    fn default() -> Self {
        Self::new()
    }
}

/// (latency ms, bandwidth Mbps). `None`: conditions stay as they are.
fn ranges(kind: NetworkType) -> Option<(RangeInclusive<u32>, RangeInclusive<u32>)> {
    match kind {
        NetworkType::Wifi => Some((10..=50, 50..=100)),
        NetworkType::Lte => Some((30..=100, 10..=50)),
        NetworkType::FiveG => Some((5..=20, 100..=200)),
        NetworkType::Ethernet => None,
    }
}

impl NetworkManager {
    pub fn new() -> Self {
        Self {
            current: NetworkType::Wifi,
            latency_ms: 50,
            bandwidth_mbps: 100,
            connected: true,
        }
    }

    pub fn current(&self) -> NetworkType {
        self.current
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(u64::from(self.latency_ms))
    }

    /// Conditions change on the next resample, not immediately.
    pub fn switch(&mut self, kind: NetworkType) {
        if self.current != kind {
            info!("switched to {} network", kind.label());
        }
        self.current = kind;
    }

    pub fn resample(&mut self, rng: &mut impl RngExt) {
        if let Some((latency, bandwidth)) = ranges(self.current) {
            self.latency_ms = rng.random_range(latency);
            self.bandwidth_mbps = rng.random_range(bandwidth);
        }
    }

    pub fn info(&self) -> NetworkInfo {
        NetworkInfo {
            kind: self.current.label().to_string(),
            latency_ms: f64::from(self.latency_ms),
            bandwidth_mbps: f64::from(self.bandwidth_mbps),
            connected: self.connected,
        }
    }

    pub fn remote_access(&self) -> RemoteAccess {
        RemoteAccess {
            enabled: true,
            protocol: Some(REMOTE_ACCESS_PROTOCOL.to_string()),
            latency_ms: Some(f64::from(self.latency_ms)),
        }
    }
}

pub async fn network_task(state: AppState) {
    let mut ticker = interval(RESAMPLE_PERIOD);
    loop {
        ticker.tick().await;
        let mut rng = rand::rng();
        state.network().resample(&mut rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_wifi() {
        let net = NetworkManager::new();
        assert_eq!(
            net.info(),
            NetworkInfo {
                kind: "WiFi".into(),
                latency_ms: 50.0,
                bandwidth_mbps: 100.0,
                connected: true,
            }
        );
        assert_eq!(net.remote_access().protocol.as_deref(), Some("ZeroTier VPN"));
    }

    #[test]
    fn resample_stays_within_type_ranges() {
        let mut net = NetworkManager::new();
        let mut rng = rand::rng();

        for kind in [NetworkType::Wifi, NetworkType::Lte, NetworkType::FiveG] {
            net.switch(kind);
            let (latency, bandwidth) = ranges(kind).unwrap();
            for _ in 0..200 {
                net.resample(&mut rng);
                let info = net.info();
                assert!(latency.contains(&(info.latency_ms as u32)), "{kind}: {info:?}");
                assert!(bandwidth.contains(&(info.bandwidth_mbps as u32)), "{kind}: {info:?}");
            }
            assert_eq!(net.info().kind, kind.label());
        }
    }

    #[test]
    fn ethernet_keeps_last_conditions() {
        let mut net = NetworkManager::new();
        let mut rng = rand::rng();
        net.switch(NetworkType::FiveG);
        net.resample(&mut rng);
        let before = net.info();

        net.switch(NetworkType::Ethernet);
        for _ in 0..20 {
            net.resample(&mut rng);
        }
        let after = net.info();
        assert_eq!(after.kind, "Ethernet");
        assert_eq!(after.latency_ms, before.latency_ms);
        assert_eq!(after.bandwidth_mbps, before.bandwidth_mbps);
    }
}
