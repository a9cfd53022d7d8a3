// frontend/src/telemetry_client/transport.rs
//
// The socket sits behind `Connector` so the supervisor can be driven by a real
// WebSocket or by an in-memory peer in tests.

use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::error::ClientError;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// What the socket reports back. A closed `inbound` channel is the close event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Frame(String),
    Error(String),
}

/// One open connection: inbound events plus a sender for outbound text frames.
pub struct Link {
    inbound: mpsc::UnboundedReceiver<LinkEvent>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl Link {
    pub fn new(
        inbound: mpsc::UnboundedReceiver<LinkEvent>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            inbound,
            outbound: Some(outbound),
            writer: None,
            reader: None,
        }
    }

    fn with_tasks(mut self, writer: JoinHandle<()>, reader: JoinHandle<()>) -> Self {
        self.writer = Some(writer);
        self.reader = Some(reader);
        self
    }

    pub fn sender(&self) -> Option<mpsc::UnboundedSender<String>> {
        self.outbound.clone()
    }

    pub async fn recv(&mut self) -> Option<LinkEvent> {
        self.inbound.recv().await
    }

    /// Lets the writer flush and send a close frame, then tears the socket down.
    ///
    /// Other clones of the outbound sender must already be dropped for the
    /// writer to notice.
    pub async fn close(mut self) {
        self.outbound = None;
        if let Some(writer) = self.writer.take() {
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, writer).await;
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

pub trait Connector: Clone + Send + Sync + 'static {
    fn connect(&self, url: &str) -> impl Future<Output = Result<Link, ClientError>> + Send;
}

// ---------------------------------------------------------
// Real WebSocket (tokio-tungstenite)
// ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Link, ClientError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<LinkEvent>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(msg.into())).await {
                    debug!("[WS] write failed: {e}");
                    return;
                }
            }
            // sender side gone: say goodbye properly
            let _ = write.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(item) = read.next().await {
                match item {
                    Ok(Message::Text(text)) => {
                        let text: &str = &text;
                        if in_tx.send(LinkEvent::Frame(text.to_owned())).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("[WS] close frame: {frame:?}");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = in_tx.send(LinkEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Link::new(in_rx, out_tx).with_tasks(writer, reader))
    }
}

// ---------------------------------------------------------
// In-memory peer
// ---------------------------------------------------------

/// Connector whose "server side" is handed to the caller as a [`MemoryPeer`]
/// for every successful attempt. Records when each attempt was made.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    inner: Arc<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    attempts: Mutex<Vec<Instant>>,
    refuse: AtomicBool,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let connector = Self {
            inner: Arc::new(MemoryInner {
                peers,
                attempts: Mutex::new(Vec::new()),
                refuse: AtomicBool::new(false),
            }),
        };
        (connector, peers_rx)
    }

    /// Make subsequent attempts fail as if nothing were listening.
    pub fn set_refuse(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Link, ClientError> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());

        if self.inner.refuse.load(Ordering::SeqCst) {
            return Err(ClientError::Transport(format!("{url}: connection refused")));
        }

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let _ = self.inner.peers.send(MemoryPeer {
            tx: in_tx,
            rx: out_rx,
        });
        Ok(Link::new(in_rx, out_tx))
    }
}

/// Server end of an in-memory link. Dropping it closes the connection.
#[derive(Debug)]
pub struct MemoryPeer {
    tx: mpsc::UnboundedSender<LinkEvent>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    pub fn send_frame(&self, raw: impl Into<String>) -> bool {
        self.tx.send(LinkEvent::Frame(raw.into())).is_ok()
    }

    pub fn send_error(&self, message: impl Into<String>) -> bool {
        self.tx.send(LinkEvent::Error(message.into())).is_ok()
    }

    /// Next frame the client transmitted; `None` once the client hung up.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    pub fn close(self) {}
}
