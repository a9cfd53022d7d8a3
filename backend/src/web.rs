use crate::state::AppState;
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use gcs_shared::{
    CommandResponse, FeatureFlags, NetworkUpdate, OutboundCommand, SystemInfo, TelemetryEnvelope,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Public router constructor
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// First frame on every connection.
pub fn system_info_envelope(state: &AppState) -> TelemetryEnvelope {
    TelemetryEnvelope::SystemInfo(SystemInfo {
        features: FeatureFlags {
            mavlink: true,
            zerotier_vpn: true,
            network_simulation: true,
            video_streaming: true,
        },
        network: Some(state.network().info()),
    })
}

/// Applies one inbound text frame. Returns the reply for this client only.
pub fn handle_client_message(state: &AppState, text: &str) -> Option<TelemetryEnvelope> {
    let msg = match OutboundCommand::decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Invalid WS message {text:?}: {e}");
            return None;
        }
    };

    match msg {
        OutboundCommand::NetworkSwitch { network } => {
            let mut net = state.network();
            net.switch(network);
            Some(TelemetryEnvelope::NetworkUpdate(NetworkUpdate {
                network: net.info(),
            }))
        }
        OutboundCommand::Command { command, params } => {
            let success = state.vehicle().handle_command(&command);
            info!("command {command} params={params:?} success={success}");
            Some(TelemetryEnvelope::CommandResponse(CommandResponse {
                command,
                success,
            }))
        }
    }
}

/// `None` (logged) if the envelope cannot be serialized; nothing is sent then.
pub fn encode(envelope: &TelemetryEnvelope) -> Option<String> {
    match envelope.to_json() {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("dropping {} envelope: {e}", envelope.kind());
            None
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(socket: WebSocket, state: AppState) {
    let mut telemetry_rx = state.ws_tx.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<TelemetryEnvelope>();
    let (mut sender, mut receiver) = socket.split();

    info!("client connected ({} total)", state.ws_tx.receiver_count());

    if let Some(hello) = encode(&system_info_envelope(&state))
        && sender
            .send(Message::Text(Utf8Bytes::from(hello)))
            .await
            .is_err()
    {
        return;
    }

    // Task: server -> client (broadcast telemetry + direct replies)
    let send_task = async move {
        loop {
            let text = tokio::select! {
                recv = telemetry_rx.recv() => match recv {
                    Ok(text) => text,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(env) => match encode(&env) {
                        Some(text) => text,
                        None => continue,
                    },
                    None => break,
                },
            };
            if sender
                .send(Message::Text(Utf8Bytes::from(text)))
                .await
                .is_err()
            {
                break;
            }
        }
    };

    // Task: client -> server (commands, network switches)
    let recv_task = {
        let state = state.clone();
        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        if let Some(reply) = handle_client_message(&state, text.as_str()) {
                            debug!("reply {}", reply.kind());
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    };

    // Run both directions until one side ends
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }
    info!("client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_shared::{NetworkType, VehicleCommand};

    fn reply(state: &AppState, msg: OutboundCommand) -> Option<TelemetryEnvelope> {
        handle_client_message(state, &msg.to_json().unwrap())
    }

    #[test]
    fn system_info_advertises_everything() {
        let state = AppState::new();
        let TelemetryEnvelope::SystemInfo(info) = system_info_envelope(&state) else {
            panic!("expected system_info");
        };
        assert!(info.features.mavlink);
        assert!(info.features.zerotier_vpn);
        assert!(info.features.network_simulation);
        assert!(info.features.video_streaming);
        assert_eq!(info.network.unwrap().kind, "WiFi");
    }

    #[test]
    fn network_switch_replies_with_update() {
        let state = AppState::new();
        let Some(TelemetryEnvelope::NetworkUpdate(update)) =
            reply(&state, OutboundCommand::network_switch(NetworkType::FiveG))
        else {
            panic!("expected network_update");
        };
        assert_eq!(update.network.kind, "5G");
        assert_eq!(state.network().current(), NetworkType::FiveG);
    }

    #[test]
    fn vehicle_commands_succeed_and_unknown_fail() {
        let state = AppState::new();

        let resp = reply(&state, OutboundCommand::vehicle(VehicleCommand::Land));
        assert_eq!(
            resp,
            Some(TelemetryEnvelope::CommandResponse(CommandResponse {
                command: "LAND".into(),
                success: true,
            }))
        );
        assert_eq!(
            state.vehicle().snapshot().heartbeat.flight_mode.as_deref(),
            Some("LAND")
        );

        let resp = reply(&state, OutboundCommand::named("ARM", Default::default()));
        assert_eq!(
            resp,
            Some(TelemetryEnvelope::CommandResponse(CommandResponse {
                command: "ARM".into(),
                success: false,
            }))
        );
    }

    #[test]
    fn encoded_frames_decode_back() {
        let state = AppState::new();
        let hello = encode(&system_info_envelope(&state)).expect("system_info encodes");
        assert!(hello.starts_with(r#"{"type":"system_info""#));
        assert_eq!(
            TelemetryEnvelope::decode(&hello).unwrap(),
            system_info_envelope(&state)
        );
    }

    #[test]
    fn malformed_messages_get_no_reply() {
        let state = AppState::new();
        assert_eq!(handle_client_message(&state, "{not json"), None);
        assert_eq!(handle_client_message(&state, r#"{"type":"dance"}"#), None);
        assert_eq!(
            handle_client_message(&state, r#"{"type":"network_switch","network":"SATELLITE"}"#),
            None
        );
        assert_eq!(state.network().current(), NetworkType::Wifi);
    }
}
