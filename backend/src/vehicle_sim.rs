// vehicle_sim.rs
//
// Mock vehicle flying slow circles over a fixed home point. Purely a function
// of the tick counter so the dashboard sees smooth, repeatable motion.

use gcs_shared::{
    Attitude, Battery, Heartbeat, Position, SystemStatus, TelemetrySnapshot, VehicleCommand,
    VehicleStatus,
};
use tokio::time::{Duration, interval};

use crate::state::AppState;

pub const HOME_LAT: f64 = 47.3769;
pub const HOME_LON: f64 = 8.5417;

/// Degrees; roughly 100 m.
const ORBIT_RADIUS: f64 = 0.001;
/// Radians per tick.
const ANGLE_STEP: f64 = 0.05;
const BASE_ALTITUDE_M: f64 = 100.0;

pub const TICK_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct VehicleSim {
    tick: u64,
    snapshot: TelemetrySnapshot,
}

impl Default for VehicleSim {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleSim {
    pub fn new() -> Self {
        Self {
            tick: 0,
            snapshot: TelemetrySnapshot {
                connected: Some(true),
                heartbeat: Heartbeat {
                    flight_mode: Some("AUTO".into()),
                    system_status: Some(SystemStatus::Label("ACTIVE".into())),
                    base_mode: Some(217),
                    custom_mode: Some(4),
                },
                position: Position {
                    latitude: Some(HOME_LAT),
                    longitude: Some(HOME_LON),
                    altitude: Some(BASE_ALTITUDE_M),
                    relative_altitude: Some(BASE_ALTITUDE_M),
                    heading: Some(45.0),
                    ground_speed: Some(15.0),
                    ..Default::default()
                },
                attitude: Attitude {
                    roll: Some(2.1),
                    pitch: Some(1.2),
                    yaw: Some(45.0),
                    ..Default::default()
                },
                battery: Battery {
                    remaining: Some(87.0),
                    voltage: Some(12.6),
                    current: Some(8.5),
                    ..Default::default()
                },
                status: VehicleStatus {
                    airspeed: Some(18.0),
                    ground_speed: Some(15.0),
                    climb_rate: Some(0.5),
                    ..Default::default()
                },
                network: None,
                remote_access: None,
            },
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    /// Advance one tick along the orbit.
    pub fn step(&mut self) {
        let n = self.tick as f64;
        let angle = n * ANGLE_STEP;
        let heading = angle.to_degrees().rem_euclid(360.0);

        let altitude = BASE_ALTITUDE_M + (n * 0.1).sin() * 20.0;
        let ground_speed = 8.0 + (n * 0.2).sin() * 4.0;

        let s = &mut self.snapshot;

        s.position.latitude = Some(HOME_LAT + angle.cos() * ORBIT_RADIUS);
        s.position.longitude = Some(HOME_LON + angle.sin() * ORBIT_RADIUS);
        s.position.altitude = Some(altitude);
        s.position.relative_altitude = Some(altitude);
        s.position.ground_speed = Some(ground_speed);
        s.position.heading = Some(heading);

        // slow drain
        s.battery.remaining = Some((87.0 - n * 0.001).max(0.0));
        s.battery.voltage = Some(12.6 - n * 0.0001);

        s.attitude.roll = Some((n * 0.2).sin() * 5.0);
        s.attitude.pitch = Some((n * 0.15).cos() * 3.0);
        s.attitude.yaw = Some(heading);

        s.status.airspeed = Some(ground_speed + 2.0);
        s.status.climb_rate = Some((n * 0.1).cos() * 2.0);

        self.tick += 1;
    }

    pub fn set_flight_mode(&mut self, mode: &str) {
        self.snapshot.heartbeat.flight_mode = Some(mode.to_string());
    }

    /// Returns whether the command was accepted.
    pub fn handle_command(&mut self, command: &str) -> bool {
        let Some(cmd) = VehicleCommand::ALL.iter().find(|c| c.as_str() == command) else {
            return false;
        };
        self.set_flight_mode(cmd.as_str());
        true
    }
}

/// Keeps the mock vehicle moving for the lifetime of the server.
pub async fn vehicle_task(state: AppState) {
    let mut ticker = interval(TICK_PERIOD);
    loop {
        ticker.tick().await;
        state.vehicle().step();
    }
}
