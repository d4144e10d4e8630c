//! Connection registry: the one shared connection to the command source.
//!
//! The registry is built once per process and handed to every consumer.
//! Consumers [`attach`](ConnectionRegistry::attach) to observe connection
//! events; however many are attached, at most one socket is open or being
//! opened. Detaching never closes the socket. Closing drives reconnection
//! through [`ReconnectPolicy`], one pending timer at a time.
//!
//! The oldest attached observer is the primary: it alone receives `Opened`
//! and inbound frames, so each command is answered once. When the primary
//! detaches, the next oldest observer is promoted and inherits any frames
//! still queued for its predecessor.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::BridgeConfig;
use crate::protocol::OutboundMessage;
use crate::transport::{Frame, Transport};

mod backoff;

pub use backoff::ReconnectPolicy;

/// Lifecycle state of the shared connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No socket and no attempt underway
    Disconnected,
    /// An attempt to open a socket is underway
    Connecting,
    /// The socket is open
    Open,
}

/// Events delivered to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A socket opened and the frontend registration was sent (primary only)
    Opened,
    /// The socket closed or was reset (every observer)
    Closed,
    /// A text frame arrived (primary only)
    Message(Arc<str>),
    /// This observer became the primary after the previous one detached
    Promoted,
}

struct ObserverSlot {
    id: u64,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

struct RegistryState {
    status: ConnectionStatus,
    attempts: u32,
    reconnect_timer: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    // Attach order; the first slot is the primary.
    observers: Vec<ObserverSlot>,
    next_observer_id: u64,
    // Bumped whenever the current socket is abandoned so that late events
    // from it are ignored.
    generation: u64,
}

struct RegistryInner {
    url: String,
    transport: Arc<dyn Transport>,
    policy: ReconnectPolicy,
    manual_reconnect_delay: Duration,
    state: Mutex<RegistryState>,
    open_tx: watch::Sender<bool>,
}

/// Process-wide owner of the connection to the command source
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ConnectionRegistry")
            .field("url", &self.inner.url)
            .field("status", &state.status)
            .field("attempts", &state.attempts)
            .field("observers", &state.observers.len())
            .finish()
    }
}

impl ConnectionRegistry {
    /// Create a registry; nothing connects until the first observer attaches
    pub fn new(
        url: impl Into<String>,
        transport: Arc<dyn Transport>,
        policy: ReconnectPolicy,
        manual_reconnect_delay: Duration,
    ) -> Self {
        let (open_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(RegistryInner {
                url: url.into(),
                transport,
                policy,
                manual_reconnect_delay,
                state: Mutex::new(RegistryState {
                    status: ConnectionStatus::Disconnected,
                    attempts: 0,
                    reconnect_timer: None,
                    outbound: None,
                    observers: Vec::new(),
                    next_observer_id: 0,
                    generation: 0,
                }),
                open_tx,
            }),
        }
    }

    /// Create a registry from bridge configuration
    pub fn from_config(config: &BridgeConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            config.url.clone(),
            transport,
            ReconnectPolicy::from(config),
            config.manual_reconnect_delay(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // State stays consistent across a panicking holder: every update is
        // a plain field assignment.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start observing the connection.
    ///
    /// The observer is registered before any connection attempt so it sees
    /// the next `Opened` event if it is the primary; if the socket is
    /// already open it will not see one, which [`Observer::joined_open`]
    /// reports. Connects unless a socket is already open or being opened.
    pub fn attach(&self) -> Observer {
        let (tx, events) = mpsc::unbounded_channel();
        let (id, joined_open, count) = {
            let mut state = self.lock();
            let id = state.next_observer_id;
            state.next_observer_id += 1;
            // Registering under the lock orders this observer against the
            // Opened send in `run_connection`.
            state.observers.push(ObserverSlot { id, events: tx });
            (id, state.status == ConnectionStatus::Open, state.observers.len())
        };
        debug!("Observer {} attached ({} total)", id, count);
        self.connect();

        Observer {
            registry: self.clone(),
            id,
            events,
            joined_open,
        }
    }

    fn detach(&self, id: u64, pending: &mut mpsc::UnboundedReceiver<ConnectionEvent>) {
        let mut state = self.lock();
        let Some(index) = state.observers.iter().position(|slot| slot.id == id) else {
            return;
        };
        state.observers.remove(index);
        debug!("Observer {} detached ({} remaining)", id, state.observers.len());

        if state.observers.is_empty() {
            if let Some(timer) = state.reconnect_timer.take() {
                timer.abort();
                debug!("Cancelled pending reconnect, no observers left");
            }
            return;
        }

        if index == 0 {
            let primary = &state.observers[0];
            info!("Observer {} promoted to primary", primary.id);
            let _ = primary.events.send(ConnectionEvent::Promoted);
            let mut handed_over = 0;
            while let Ok(event) = pending.try_recv() {
                if let ConnectionEvent::Message(_) = event {
                    let _ = primary.events.send(event);
                    handed_over += 1;
                }
            }
            if handed_over > 0 {
                debug!("Handed {} queued frame(s) to observer {}", handed_over, primary.id);
            }
        }
    }

    fn is_primary(&self, id: u64) -> bool {
        self.lock().observers.first().map(|slot| slot.id) == Some(id)
    }

    fn send_to_primary(state: &RegistryState, event: ConnectionEvent) {
        if let Some(primary) = state.observers.first() {
            let _ = primary.events.send(event);
        }
    }

    fn send_to_all(state: &RegistryState, event: ConnectionEvent) {
        for slot in &state.observers {
            let _ = slot.events.send(event.clone());
        }
    }

    /// Number of attached observers
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Current lifecycle state
    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    /// Whether the socket is open
    pub fn is_open(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    /// Watch channel that flips with the open state
    pub fn watch_open(&self) -> watch::Receiver<bool> {
        self.inner.open_tx.subscribe()
    }

    /// Consecutive failed connections since the last successful open
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    /// Whether a reconnect timer is pending
    pub fn reconnect_pending(&self) -> bool {
        self.lock().reconnect_timer.is_some()
    }

    /// Delay the policy assigns to reconnect attempt `attempt`
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        self.inner.policy.delay(attempt)
    }

    /// Open a connection unless one is open or already being opened
    pub fn connect(&self) {
        let generation = {
            let mut state = self.lock();
            match state.status {
                ConnectionStatus::Open => {
                    trace!("Connection already open, reusing it");
                    return;
                }
                ConnectionStatus::Connecting => {
                    trace!("Connection attempt already underway");
                    return;
                }
                ConnectionStatus::Disconnected => {}
            }
            state.status = ConnectionStatus::Connecting;
            state.generation += 1;
            state.generation
        };

        let registry = self.clone();
        tokio::spawn(async move {
            registry.run_connection(generation).await;
        });
    }

    /// Send one message if the socket is open.
    ///
    /// Returns `false` when the message was skipped; nothing is queued.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode outbound message: {}", e);
                return false;
            }
        };

        let state = self.lock();
        match (&state.status, &state.outbound) {
            (ConnectionStatus::Open, Some(outbound)) => outbound.send(text).is_ok(),
            _ => {
                trace!("Connection not open, message skipped");
                false
            }
        }
    }

    /// Drop the current socket, clear timers and counters, and reconnect
    /// after the manual reconnect pause.
    pub fn force_reconnect(&self) {
        info!("Manual reconnect requested");
        let generation = self.reset();

        let registry = self.clone();
        let delay = self.inner.manual_reconnect_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.is_current(generation) {
                registry.connect();
            } else {
                debug!("Manual reconnect superseded");
            }
        });
    }

    /// Close the socket and cancel any pending reconnect without scheduling
    /// another one.
    pub fn shutdown(&self) {
        info!("Shutting down connection");
        self.reset();
    }

    fn reset(&self) -> u64 {
        let mut state = self.lock();
        if let Some(timer) = state.reconnect_timer.take() {
            timer.abort();
        }
        state.attempts = 0;
        state.generation += 1;
        // Dropping the sender asks the transport to close the socket.
        state.outbound = None;
        let was_open = state.status == ConnectionStatus::Open;
        state.status = ConnectionStatus::Disconnected;

        if was_open {
            self.inner.open_tx.send_replace(false);
            Self::send_to_all(&state, ConnectionEvent::Closed);
        }
        state.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    async fn run_connection(&self, generation: u64) {
        debug!("Connecting to {}", self.inner.url);
        let channel = match self.inner.transport.open(&self.inner.url).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!("Failed to connect to {}: {}", self.inner.url, e);
                self.handle_closed(generation);
                return;
            }
        };

        let mut inbound = channel.inbound;
        {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("Connection superseded before it opened, dropping it");
                return;
            }
            state.status = ConnectionStatus::Open;
            state.attempts = 0;
            if let Ok(text) = OutboundMessage::FrontendConnect.encode() {
                let _ = channel.outbound.send(text);
            }
            state.outbound = Some(channel.outbound);

            info!("Connected to {}", self.inner.url);
            self.inner.open_tx.send_replace(true);
            Self::send_to_primary(&state, ConnectionEvent::Opened);
        }

        while let Some(frame) = inbound.recv().await {
            match frame {
                Frame::Text(text) => {
                    let state = self.lock();
                    if state.generation != generation {
                        break;
                    }
                    if state.observers.is_empty() {
                        trace!("No observers attached, frame dropped");
                    }
                    Self::send_to_primary(&state, ConnectionEvent::Message(Arc::from(text)));
                }
                Frame::Error(e) => error!("Connection error: {}", e),
            }
        }

        self.handle_closed(generation);
    }

    fn handle_closed(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }

        let was_open = state.status == ConnectionStatus::Open;
        state.status = ConnectionStatus::Disconnected;
        state.outbound = None;

        if was_open {
            info!("Disconnected from {}", self.inner.url);
            self.inner.open_tx.send_replace(false);
            Self::send_to_all(&state, ConnectionEvent::Closed);
        }

        self.schedule_reconnect(&mut state);
    }

    fn schedule_reconnect(&self, state: &mut RegistryState) {
        if state.observers.is_empty() {
            debug!("No observers attached, not reconnecting");
            return;
        }
        if state.reconnect_timer.is_some() {
            return;
        }

        state.attempts += 1;
        let delay = self.inner.policy.delay(state.attempts);
        info!(
            "Reconnect attempt {} in {}ms",
            state.attempts,
            delay.as_millis()
        );

        let registry = self.clone();
        let generation = state.generation;
        state.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let due = {
                let mut state = registry.lock();
                // A reset between the sleep and this lock has already
                // taken the timer and bumped the generation.
                if state.generation != generation {
                    false
                } else {
                    state.reconnect_timer = None;
                    !state.observers.is_empty()
                }
            };
            if due {
                registry.connect();
            }
        }));
    }
}

/// One consumer's view of the shared connection.
///
/// Dropping the observer detaches it; the connection stays open.
#[derive(Debug)]
pub struct Observer {
    registry: ConnectionRegistry,
    id: u64,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    joined_open: bool,
}

impl Observer {
    /// The registry this observer is attached to
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Whether the socket was already open when this observer attached, in
    /// which case no `Opened` event precedes its first messages
    pub fn joined_open(&self) -> bool {
        self.joined_open
    }

    /// Whether this observer currently receives commands
    pub fn is_primary(&self) -> bool {
        self.registry.is_primary(self.id)
    }

    /// Next connection event; nothing is dropped while the observer lives
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        self.events.recv().await
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.registry.detach(self.id, &mut self.events);
    }
}
