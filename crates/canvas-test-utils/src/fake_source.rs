//! In-process fake of the command source.

use std::sync::Arc;

use async_trait::async_trait;
use canvas_bridge::protocol::{OutboundMessage, COMMAND};
use canvas_bridge::transport::{Channel, Frame, Transport};
use canvas_bridge::{BridgeError, BridgeResult};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct SourceState {
    refuse_next: usize,
    refuse_all: bool,
    accepted: usize,
}

#[derive(Debug)]
struct SourceInner {
    state: Mutex<SourceState>,
    attempts: watch::Sender<Vec<Instant>>,
    peers_tx: mpsc::UnboundedSender<FakePeer>,
    peers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<FakePeer>>,
}

/// Fake controller endpoint implementing [`Transport`]
#[derive(Debug, Clone)]
pub struct FakeCommandSource {
    inner: Arc<SourceInner>,
}

impl Default for FakeCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCommandSource {
    /// A source that accepts every connection
    pub fn new() -> Self {
        let (attempts, _) = watch::channel(Vec::new());
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(SourceInner {
                state: Mutex::new(SourceState::default()),
                attempts,
                peers_tx,
                peers_rx: tokio::sync::Mutex::new(peers_rx),
            }),
        }
    }

    /// Refuse the next `count` connection attempts
    pub fn refuse_next(&self, count: usize) {
        self.inner.state.lock().refuse_next = count;
    }

    /// Refuse every attempt until turned off
    pub fn refuse_all(&self, refuse: bool) {
        self.inner.state.lock().refuse_all = refuse;
    }

    /// Number of connections accepted so far
    pub fn accepted(&self) -> usize {
        self.inner.state.lock().accepted
    }

    /// Times of every connection attempt, refused or not
    pub fn attempts(&self) -> Vec<Instant> {
        self.inner.attempts.borrow().clone()
    }

    /// Wait until at least `count` attempts were made
    pub async fn wait_for_attempts(&self, count: usize) -> Vec<Instant> {
        let mut rx = self.inner.attempts.subscribe();
        let attempts = rx
            .wait_for(|attempts| attempts.len() >= count)
            .await
            .map(|attempts| attempts.clone());
        attempts.unwrap_or_default()
    }

    /// Wait for the next accepted connection
    pub async fn accept(&self) -> FakePeer {
        let mut peers = self.inner.peers_rx.lock().await;
        match peers.recv().await {
            Some(peer) => peer,
            // The source holds its own sender, so the stream never ends.
            None => unreachable!("peer channel closed while the source is alive"),
        }
    }

    /// An already accepted connection, if one is waiting
    pub fn try_accept(&self) -> Option<FakePeer> {
        self.inner.peers_rx.try_lock().ok()?.try_recv().ok()
    }
}

#[async_trait]
impl Transport for FakeCommandSource {
    async fn open(&self, url: &str) -> BridgeResult<Channel> {
        self.inner.attempts.send_modify(|attempts| attempts.push(Instant::now()));

        {
            let mut state = self.inner.state.lock();
            if state.refuse_all {
                return Err(BridgeError::Transport(format!("connection to {} refused", url)));
            }
            if state.refuse_next > 0 {
                state.refuse_next -= 1;
                return Err(BridgeError::Transport(format!("connection to {} refused", url)));
            }
            state.accepted += 1;
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let peer = FakePeer {
            from_bridge: outbound_rx,
            to_bridge: inbound_tx,
        };
        debug!("Fake source accepted connection to {}", url);
        let _ = self.inner.peers_tx.send(peer);

        Ok(Channel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// The controller's end of one accepted connection
#[derive(Debug)]
pub struct FakePeer {
    from_bridge: mpsc::UnboundedReceiver<String>,
    to_bridge: mpsc::UnboundedSender<Frame>,
}

impl FakePeer {
    /// Send a raw text frame
    pub fn send_raw(&self, text: impl Into<String>) {
        let _ = self.to_bridge.send(Frame::Text(text.into()));
    }

    /// Send a JSON document
    pub fn send_json(&self, value: Value) {
        self.send_raw(value.to_string());
    }

    /// Send a command envelope
    pub fn send_command(&self, request_id: i64, command: &str, params: Value) {
        self.send_json(json!({
            "type": COMMAND,
            "requestId": request_id,
            "command": command,
            "params": params,
        }));
    }

    /// Report a socket error to the bridge
    pub fn error(&self, message: impl Into<String>) {
        let _ = self.to_bridge.send(Frame::Error(message.into()));
    }

    /// Close the connection from the controller's side
    pub fn close(self) {}

    /// Next raw frame from the bridge; `None` once the bridge closed
    pub async fn recv_raw(&mut self) -> Option<String> {
        self.from_bridge.recv().await
    }

    /// Next message from the bridge; `None` once the bridge closed.
    ///
    /// Panics on frames that are not valid outbound messages.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        let text = self.from_bridge.recv().await?;
        match serde_json::from_str(&text) {
            Ok(message) => Some(message),
            Err(e) => panic!("bridge sent an invalid frame {}: {}", text, e),
        }
    }

    /// A message the bridge already sent, without waiting
    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        let text = self.from_bridge.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }
}
