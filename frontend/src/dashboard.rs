// frontend/src/dashboard.rs
//
// Text rendering + operator input for the terminal dashboard.

use gcs_shared::{NetworkType, OutboundCommand, VehicleCommand};

use crate::telemetry_client::state::ClientView;

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorInput {
    Send(OutboundCommand),
    Help,
    Quit,
}

pub const HELP: &str = "commands: takeoff | land | rtl | net <wifi|lte|5g|ethernet> | help | quit";

/// `None` for blank lines and anything unrecognised.
pub fn parse_operator_input(line: &str) -> Option<OperatorInput> {
    let mut words = line.split_whitespace();
    let head = words.next()?.to_ascii_lowercase();

    let input = match head.as_str() {
        "quit" | "exit" | "q" => OperatorInput::Quit,
        "help" | "?" => OperatorInput::Help,
        "net" | "network" => {
            let network: NetworkType = words.next()?.parse().ok()?;
            OperatorInput::Send(OutboundCommand::network_switch(network))
        }
        other => {
            let cmd: VehicleCommand = other.parse().ok()?;
            OperatorInput::Send(OutboundCommand::vehicle(cmd))
        }
    };

    if words.next().is_some() {
        return None;
    }
    Some(input)
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

/// One status line, e.g.
/// `[connected] AUTO armed | 47.37690,8.54170 alt 100.0m gs 8.0m/s | bat 87% | WiFi 50ms 100Mbps`
pub fn render_status_line(view: &ClientView) -> String {
    let mut line = format!("[{}]", view.connection);

    let Some(snap) = view.telemetry.as_ref() else {
        line.push_str(" waiting for telemetry");
        return line;
    };

    let mode = snap.heartbeat.flight_mode.as_deref().unwrap_or("-");
    line.push_str(&format!(" {mode}"));
    match snap.heartbeat.is_armed() {
        Some(true) => line.push_str(" armed"),
        Some(false) => line.push_str(" disarmed"),
        None => {}
    }

    let pos = &snap.position;
    let latlon = pos
        .lat_lon()
        .map(|(lat, lon)| format!("{lat:.5},{lon:.5}"))
        .unwrap_or_else(|| "-".to_string());
    line.push_str(&format!(
        " | {latlon} alt {}m gs {}m/s",
        fmt_opt(pos.relative_altitude, 1),
        fmt_opt(pos.ground_speed, 1)
    ));

    line.push_str(&format!(" | bat {}%", fmt_opt(snap.battery.remaining, 0)));

    if let Some(net) = snap.network.as_ref() {
        let link = if net.connected { "" } else { " (down)" };
        line.push_str(&format!(
            " | {} {:.0}ms {:.0}Mbps{link}",
            net.kind, net.latency_ms, net.bandwidth_mbps
        ));
    }

    if let Some(remote) = snap.remote_access.as_ref()
        && remote.enabled
    {
        let proto = remote.protocol.as_deref().unwrap_or("remote");
        line.push_str(&format!(" | {proto}"));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry_client::state::ConnectionState;
    use gcs_shared::{Battery, Heartbeat, NetworkInfo, Position, TelemetrySnapshot};

    #[test]
    fn parses_operator_commands() {
        assert_eq!(
            parse_operator_input("takeoff"),
            Some(OperatorInput::Send(OutboundCommand::vehicle(
                VehicleCommand::Takeoff
            )))
        );
        assert_eq!(
            parse_operator_input("  RTL "),
            Some(OperatorInput::Send(OutboundCommand::vehicle(VehicleCommand::Rtl)))
        );
        assert_eq!(
            parse_operator_input("net 5g"),
            Some(OperatorInput::Send(OutboundCommand::network_switch(
                NetworkType::FiveG
            )))
        );
        assert_eq!(parse_operator_input("quit"), Some(OperatorInput::Quit));
        assert_eq!(parse_operator_input("help"), Some(OperatorInput::Help));

        assert_eq!(parse_operator_input(""), None);
        assert_eq!(parse_operator_input("net"), None);
        assert_eq!(parse_operator_input("net carrier-pigeon"), None);
        assert_eq!(parse_operator_input("land now"), None);
        assert_eq!(parse_operator_input("loiter"), None);
    }

    #[test]
    fn status_line_before_telemetry() {
        let view = ClientView {
            connection: ConnectionState::Connecting,
            ..Default::default()
        };
        assert_eq!(render_status_line(&view), "[connecting] waiting for telemetry");
    }

    #[test]
    fn status_line_with_snapshot() {
        let view = ClientView {
            connection: ConnectionState::Connected,
            telemetry: Some(TelemetrySnapshot {
                heartbeat: Heartbeat {
                    flight_mode: Some("AUTO".into()),
                    base_mode: Some(217),
                    ..Default::default()
                },
                position: Position {
                    latitude: Some(47.3769),
                    longitude: Some(8.5417),
                    relative_altitude: Some(100.0),
                    ground_speed: Some(8.0),
                    ..Default::default()
                },
                battery: Battery {
                    remaining: Some(87.0),
                    ..Default::default()
                },
                network: Some(NetworkInfo {
                    kind: "WiFi".into(),
                    latency_ms: 50.0,
                    bandwidth_mbps: 100.0,
                    connected: true,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(
            render_status_line(&view),
            "[connected] AUTO armed | 47.37690,8.54170 alt 100.0m gs 8.0m/s | bat 87% | WiFi 50ms 100Mbps"
        );
    }
}
