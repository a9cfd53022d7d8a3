use crate::state::AppState;
use crate::web::encode;
use gcs_shared::{TelemetryEnvelope, TelemetryFrame};
use tokio::time::{Duration, sleep};
use tracing::trace;

pub const BROADCAST_PERIOD: Duration = Duration::from_millis(100);

/// Current vehicle snapshot plus link info, stamped with server uptime.
pub fn telemetry_envelope(state: &AppState) -> TelemetryEnvelope {
    let mut data = state.vehicle().snapshot().clone();
    let (network, remote_access) = {
        let net = state.network();
        (net.info(), net.remote_access())
    };
    data.network = Some(network);
    data.remote_access = Some(remote_access);

    TelemetryEnvelope::Telemetry(TelemetryFrame {
        data,
        timestamp: Some(state.uptime_secs()),
    })
}

/// Fan-out to every connected dashboard. Each round waits out the simulated
/// latency before sending, then [`BROADCAST_PERIOD`], so a slow link also
/// lowers the frame rate.
pub async fn telemetry_task(state: AppState) {
    loop {
        if state.ws_tx.receiver_count() > 0 {
            broadcast_once(&state).await;
        }
        sleep(BROADCAST_PERIOD).await;
    }
}

async fn broadcast_once(state: &AppState) {
    let Some(text) = encode(&telemetry_envelope(state)) else {
        return;
    };
    let latency = state.network().latency();
    if !latency.is_zero() {
        sleep(latency).await;
    }

    // no receivers left is fine
    if let Ok(n) = state.ws_tx.send(text) {
        trace!("telemetry -> {n} client(s)");
    }
}
