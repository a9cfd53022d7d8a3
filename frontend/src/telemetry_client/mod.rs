// frontend/src/telemetry_client/mod.rs

pub mod history;
pub mod state;
pub mod transport;

use chrono::Utc;
use gcs_shared::{NetworkType, OutboundCommand, VehicleCommand};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use history::TelemetryHistory;
use state::{ClientView, ConnectionState, TelemetryState};
use transport::{Connector, Link, LinkEvent, WsConnector};

// ============================================================================
// Shared state
// - One mutex around everything the supervisor writes and the UI reads.
// - `epoch` bumps on every connect()/shutdown(); a supervisor whose epoch is
//   stale can no longer touch state, so a superseded connection is inert even
//   while its task winds down.
// ============================================================================
struct Inner {
    epoch: u64,
    state: TelemetryState,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Shared {
    inner: Mutex<Inner>,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch: 0,
                state: TelemetryState::new(),
                outbound: None,
            }),
            revision: watch::Sender::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// Starts a new generation and drops the old one's sender.
    fn next_epoch(&self, connection: ConnectionState) -> u64 {
        let (epoch, changed) = {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.outbound = None;
            (inner.epoch, inner.state.set_connection(connection))
        };
        if changed {
            self.notify();
        }
        epoch
    }

    /// Runs `f` if `epoch` is still current. `f` returns whether the view
    /// changed. Returns false when the epoch is stale.
    fn update(&self, epoch: u64, f: impl FnOnce(&mut Inner) -> bool) -> bool {
        let changed = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return false;
            }
            f(&mut inner)
        };
        if changed {
            self.notify();
        }
        true
    }

    fn mark_disconnected(&self, epoch: u64) {
        self.update(epoch, |inner| {
            inner.outbound = None;
            inner.state.set_connection(ConnectionState::Disconnected)
        });
    }

    fn transmit(&self, command: &OutboundCommand) -> Result<(), ClientError> {
        let inner = self.lock();
        if inner.state.connection() != ConnectionState::Connected {
            return Err(ClientError::CommandDropped);
        }
        let Some(tx) = inner.outbound.as_ref() else {
            return Err(ClientError::CommandDropped);
        };
        let json = command
            .to_json()
            .map_err(|e| ClientError::Transport(format!("cannot encode command: {e}")))?;
        tx.send(json).map_err(|_| ClientError::CommandDropped)
    }
}

struct Supervisor {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Supervisor {
    fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Owns the single telemetry connection and keeps it alive.
///
/// `connect()` spawns a supervisor on the current tokio runtime that dials the
/// backend, applies every inbound frame to the shared state, and redials a
/// fixed delay after each close for as long as the client is running.
/// `shutdown()` (or dropping the client) stops it, including any pending
/// reconnect timer.
pub struct TelemetryClient<C: Connector = WsConnector> {
    config: ClientConfig,
    connector: C,
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl TelemetryClient<WsConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, WsConnector)
    }
}

impl<C: Connector> TelemetryClient<C> {
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            shared: Arc::new(Shared::new()),
            supervisor: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a new connection, superseding any existing one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut slot = self.supervisor.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.take() {
            debug!("[WS] superseding previous connection");
            old.stop();
        }

        let epoch = self.shared.next_epoch(ConnectionState::Connecting);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(supervise(
            self.connector.clone(),
            self.config.url.clone(),
            self.config.reconnect_delay(),
            self.shared.clone(),
            epoch,
            stop_rx,
        ));
        *slot = Some(Supervisor { stop_tx, task });
    }

    /// Stops reconnecting and closes the socket. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let supervisor = self
            .supervisor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.shared.next_epoch(ConnectionState::Disconnected);

        if let Some(supervisor) = supervisor {
            supervisor.stop();
            let _ = supervisor.task.await;
            info!("[WS] client shut down");
        }
    }

    /// Transmits `command` if connected; otherwise it is dropped.
    pub fn send_command(&self, command: OutboundCommand) {
        match self.shared.transmit(&command) {
            Ok(()) => debug!("[WS] sent {command:?}"),
            Err(e) => debug!("[WS] {e}: {command:?}"),
        }
    }

    pub fn send_vehicle_command(&self, command: VehicleCommand) {
        self.send_command(OutboundCommand::vehicle(command));
    }

    pub fn switch_network(&self, network: NetworkType) {
        self.send_command(OutboundCommand::network_switch(network));
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.lock().state.connection()
    }

    pub fn view(&self) -> ClientView {
        self.shared.lock().state.view()
    }

    pub fn history(&self) -> TelemetryHistory {
        self.shared.lock().state.history().clone()
    }

    /// Ticks whenever anything in [`ClientView`] changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }
}

impl<C: Connector> Drop for TelemetryClient<C> {
    fn drop(&mut self) {
        let slot = self.supervisor.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(supervisor) = slot.take() {
            supervisor.task.abort();
        }
    }
}

// ---------------------------------------------------------
// Supervisor (reconnect loop)
// ---------------------------------------------------------

/// Resolves once a stop was requested or the client is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stop| *stop).await;
}

async fn supervise<C: Connector>(
    connector: C,
    url: String,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    epoch: u64,
    mut stop: watch::Receiver<bool>,
) {
    info!("[WS] supervisor starting (epoch={epoch})");

    loop {
        if *stop.borrow() {
            break;
        }
        shared.update(epoch, |inner| {
            inner.state.set_connection(ConnectionState::Connecting)
        });
        info!("[WS] connecting to {url} (epoch={epoch})");

        let attempt = tokio::select! {
            res = connector.connect(&url) => res,
            _ = stopped(&mut stop) => break,
        };

        match attempt {
            Ok(link) => {
                if run_link(link, &shared, epoch, &mut stop).await {
                    break;
                }
            }
            Err(e) => {
                warn!("[WS] connect failed: {e}");
                shared.mark_disconnected(epoch);
            }
        }

        info!("[WS] reconnecting in {} ms", reconnect_delay.as_millis());
        tokio::select! {
            _ = tokio::time::sleep(reconnect_delay) => {}
            _ = stopped(&mut stop) => break,
        }
    }

    info!("[WS] supervisor stopped (epoch={epoch})");
}

/// Pumps one open link until it closes. Returns true if a stop was requested.
async fn run_link(
    mut link: Link,
    shared: &Shared,
    epoch: u64,
    stop: &mut watch::Receiver<bool>,
) -> bool {
    let sender = link.sender();
    let current = shared.update(epoch, |inner| {
        inner.outbound = sender;
        inner.state.set_connection(ConnectionState::Connected)
    });
    if !current {
        link.close().await;
        return true;
    }
    info!("[WS] open");

    let stop_requested = loop {
        tokio::select! {
            event = link.recv() => match event {
                Some(LinkEvent::Frame(raw)) => {
                    let received_at = Utc::now();
                    shared.update(epoch, |inner| {
                        match inner.state.handle_frame(&raw, received_at) {
                            Ok(changed) => changed,
                            Err(e) => {
                                warn!("[WS] ignoring frame: {e}");
                                false
                            }
                        }
                    });
                }
                Some(LinkEvent::Error(e)) => {
                    warn!("[WS] {}", ClientError::Transport(e));
                    shared.mark_disconnected(epoch);
                }
                None => break false,
            },
            _ = stopped(stop) => break true,
        }
    };

    info!("[WS] closed");
    shared.mark_disconnected(epoch);
    link.close().await;
    stop_requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_shared::TelemetryEnvelope;
    use serde_json::{Map, Value, json};
    use tokio::time::{Instant, timeout};
    use transport::{MemoryConnector, MemoryPeer};

    const DELAY: Duration = Duration::from_secs(3);

    const TELEMETRY: &str = r#"{"type":"telemetry","timestamp":1.0,"data":{"position":{"latitude":47.0,"longitude":8.0},"battery":{"remaining":90}}}"#;

    fn client() -> (
        TelemetryClient<MemoryConnector>,
        MemoryConnector,
        mpsc::UnboundedReceiver<MemoryPeer>,
    ) {
        let (connector, peers) = MemoryConnector::new();
        let client = TelemetryClient::with_connector(ClientConfig::default(), connector.clone());
        (client, connector, peers)
    }

    async fn wait_for_state<C: Connector>(client: &TelemetryClient<C>, want: ConnectionState) {
        let mut rx = client.subscribe();
        timeout(Duration::from_secs(600), async {
            while client.connection_state() != want {
                rx.changed().await.expect("client alive");
            }
        })
        .await
        .unwrap_or_else(|_| panic!("never reached {want}"));
    }

    async fn wait_for_revision(mut rx: watch::Receiver<u64>) {
        timeout(Duration::from_secs(600), rx.changed())
            .await
            .expect("no state change")
            .expect("client alive");
    }

    async fn next_peer(peers: &mut mpsc::UnboundedReceiver<MemoryPeer>) -> MemoryPeer {
        timeout(Duration::from_secs(600), peers.recv())
            .await
            .expect("no connection attempt")
            .expect("connector alive")
    }

    #[tokio::test(start_paused = true)]
    async fn command_is_sent_only_while_connected() {
        let (client, _connector, mut peers) = client();

        // nothing open yet
        client.send_command(OutboundCommand::named("TAKEOFF", Map::new()));

        client.connect();
        let mut peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        client.send_command(OutboundCommand::named("TAKEOFF", Map::new()));
        let frame = peer.recv().await.expect("frame");
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"type": "command", "command": "TAKEOFF", "params": {}}));
        assert_eq!(peer.try_recv(), None);

        client.switch_network(NetworkType::FiveG);
        let frame = peer.recv().await.expect("frame");
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"type": "network_switch", "network": "FIVE_G"}));

        client.shutdown().await;
        client.send_vehicle_command(VehicleCommand::Land);
        assert_eq!(peer.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn close_schedules_exactly_one_reconnect_after_delay() {
        let (client, connector, mut peers) = client();
        client.connect();

        let mut closed_at = Vec::new();
        for round in 1..=4 {
            let peer = next_peer(&mut peers).await;
            wait_for_state(&client, ConnectionState::Connected).await;
            assert_eq!(connector.attempts().len(), round);

            closed_at.push(Instant::now());
            peer.close();
            wait_for_state(&client, ConnectionState::Disconnected).await;
            assert_eq!(connector.attempts().len(), round, "no immediate redial");
        }

        // the fourth close is still pending its timer
        let next = next_peer(&mut peers).await;
        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 5);
        for (i, closed) in closed_at.iter().enumerate() {
            let gap = attempts[i + 1] - *closed;
            assert!(gap >= DELAY, "round {i}: redialed after {gap:?}");
            assert!(gap < DELAY + Duration::from_millis(50), "round {i}: {gap:?}");
        }

        drop(next);
        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connections_keep_retrying_at_fixed_interval() {
        let (client, connector, mut peers) = client();
        connector.set_refuse(true);
        let started = Instant::now();
        client.connect();

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 4);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
        for (i, at) in attempts.iter().enumerate() {
            let offset = *at - started;
            assert!(offset >= DELAY * i as u32);
            assert!(offset < DELAY * i as u32 + Duration::from_millis(50));
        }

        connector.set_refuse(false);
        let _peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;
        assert_eq!(connector.attempts().len(), 5);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn error_disconnects_but_only_close_redials() {
        let (client, connector, mut peers) = client();
        client.connect();
        let peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        peer.send_error("connection reset by peer");
        wait_for_state(&client, ConnectionState::Disconnected).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts().len(), 1);

        peer.close();
        let _peer = next_peer(&mut peers).await;
        assert_eq!(connector.attempts().len(), 2);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_reconnect() {
        let (client, connector, mut peers) = client();
        client.connect();
        let peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        peer.close();
        wait_for_state(&client, ConnectionState::Disconnected).await;
        client.shutdown().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_client_stops_reconnecting() {
        let (client, connector, mut peers) = client();
        client.connect();
        let peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        drop(client);
        peer.close();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_supersedes_previous_connection() {
        let (client, connector, mut peers) = client();
        client.connect();
        let mut first = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        client.connect();
        let mut second = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        // old link is hung up and its frames no longer count
        assert_eq!(first.recv().await, None);
        first.send_frame(TELEMETRY);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(client.view().telemetry.is_none());

        client.send_vehicle_command(VehicleCommand::Rtl);
        let frame = second.recv().await.expect("frame on new link");
        assert!(frame.contains("RTL"));
        assert_eq!(connector.attempts().len(), 2);

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn frames_flow_into_state_and_bad_ones_are_ignored() {
        let (client, _connector, mut peers) = client();
        client.connect();
        let peer = next_peer(&mut peers).await;
        wait_for_state(&client, ConnectionState::Connected).await;

        let rx = client.subscribe();
        peer.send_frame("{\"type\":\"telemetry\",\"data\":");
        peer.send_frame(r#"{"type":"unknown_type"}"#);
        peer.send_frame(TELEMETRY);
        wait_for_revision(rx).await;

        let view = client.view();
        assert_eq!(view.connection, ConnectionState::Connected);
        let snap = view.telemetry.expect("snapshot");
        assert_eq!(snap.battery.remaining, Some(90.0));
        assert_eq!(view.history.len(), 1);

        let rx = client.subscribe();
        peer.send_frame(
            TelemetryEnvelope::NetworkUpdate(gcs_shared::NetworkUpdate {
                network: gcs_shared::NetworkInfo {
                    kind: "Ethernet".into(),
                    latency_ms: 2.0,
                    bandwidth_mbps: 1000.0,
                    connected: true,
                },
            })
            .to_json()
            .unwrap(),
        );
        wait_for_revision(rx).await;
        let view = client.view();
        let snap = view.telemetry.expect("snapshot");
        assert_eq!(snap.network.map(|n| n.kind), Some("Ethernet".to_string()));
        assert_eq!(snap.battery.remaining, Some(90.0));
        assert_eq!(client.history().len(), 1);

        client.shutdown().await;
    }
}
