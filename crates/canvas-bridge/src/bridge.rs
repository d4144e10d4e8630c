//! The bridge event loop and its host-facing handle.
//!
//! One [`Bridge`] task owns a [`GraphStore`] and processes, strictly one at
//! a time, connection events, inbound commands and host edits. Nothing else
//! touches the store, so no locking is needed around it. The host talks to
//! the task through a cloneable [`BridgeHandle`].
//!
//! Only the primary bridge on a registry answers commands and pushes on
//! open. Every bridge pushes its own local edits.

use std::sync::Arc;
use std::time::Duration;

use canvas_core::{
    AgentDocument, BuiltinTemplates, Edge, Graph, GraphStore, NewEdge, NewNode, Node, Position,
};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::BridgeConfig;
use crate::connection::{ConnectionEvent, ConnectionRegistry, Observer};
use crate::dispatcher::Dispatcher;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::synchronizer::{push_snapshot, Debouncer};

/// A boxed local edit
pub type Edit = Box<dyn FnOnce(&mut GraphStore) + Send>;

/// Requests from the host to the bridge task
pub enum HostRequest {
    /// Apply an edit; arms the debounced push
    Edit(Edit),
    /// Push the current snapshot now
    PushState,
    /// Reply with a copy of the graph
    Snapshot(oneshot::Sender<Graph>),
    /// Stop the task and detach from the connection
    Detach,
}

impl std::fmt::Debug for HostRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostRequest::Edit(_) => f.write_str("Edit"),
            HostRequest::PushState => f.write_str("PushState"),
            HostRequest::Snapshot(_) => f.write_str("Snapshot"),
            HostRequest::Detach => f.write_str("Detach"),
        }
    }
}

enum Step {
    Event(Option<ConnectionEvent>),
    Request(Option<HostRequest>),
    DebounceExpired,
}

/// One consumer of the shared connection, owning a graph
pub struct Bridge {
    observer: Observer,
    requests: mpsc::UnboundedReceiver<HostRequest>,
    store: GraphStore,
    dispatcher: Dispatcher,
    debouncer: Debouncer,
}

impl Bridge {
    /// Attach a new bridge to the registry.
    ///
    /// The returned bridge does nothing until [`run`](Self::run) is polled.
    pub fn attach(
        registry: &ConnectionRegistry,
        store: GraphStore,
        dispatcher: Dispatcher,
        debounce: Duration,
    ) -> (Self, BridgeHandle) {
        let observer = registry.attach();
        let (requests_tx, requests) = mpsc::unbounded_channel();

        let bridge = Self {
            observer,
            requests,
            store,
            dispatcher,
            debouncer: Debouncer::new(debounce),
        };
        let handle = BridgeHandle {
            requests: requests_tx,
            registry: registry.clone(),
        };
        (bridge, handle)
    }

    /// Attach and run a bridge over an empty graph configured from `config`
    pub fn spawn(registry: &ConnectionRegistry, config: &BridgeConfig) -> (BridgeHandle, JoinHandle<()>) {
        let store = GraphStore::with_policy(config.dangling_edges);
        let dispatcher = Dispatcher::new(Arc::new(BuiltinTemplates::new()));
        let (bridge, handle) = Self::attach(registry, store, dispatcher, config.debounce());
        (handle, tokio::spawn(bridge.run()))
    }

    /// Process events until detached or the handle side is dropped
    pub async fn run(mut self) {
        if self.observer.joined_open() && self.observer.is_primary() {
            self.push();
        }

        loop {
            let step = tokio::select! {
                event = self.observer.recv() => Step::Event(event),
                request = self.requests.recv() => Step::Request(request),
                _ = self.debouncer.expired() => Step::DebounceExpired,
            };

            match step {
                Step::Event(Some(ConnectionEvent::Opened)) => self.push(),
                Step::Event(Some(ConnectionEvent::Closed)) => debug!("Connection closed"),
                Step::Event(Some(ConnectionEvent::Message(text))) => self.handle_message(&text),
                Step::Event(Some(ConnectionEvent::Promoted)) => {
                    info!("Bridge now answers commands");
                    self.push();
                }
                Step::Event(None) => break,
                Step::Request(Some(HostRequest::Detach)) | Step::Request(None) => break,
                Step::Request(Some(request)) => self.handle_request(request),
                Step::DebounceExpired => {
                    trace!("Debounce expired");
                    self.push();
                }
            }
        }

        info!("Bridge detached");
    }

    fn registry(&self) -> &ConnectionRegistry {
        self.observer.registry()
    }

    fn push(&mut self) {
        self.debouncer.cancel();
        push_snapshot(self.observer.registry(), self.store.graph());
    }

    fn handle_message(&mut self, text: &str) {
        let message = match InboundMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping undecodable message: {}", e);
                return;
            }
        };

        match message {
            InboundMessage::Command(envelope) => {
                info!(
                    "Received command {} (request {})",
                    envelope.command, envelope.request_id
                );
                let outcome =
                    self.dispatcher
                        .dispatch(&mut self.store, &envelope.command, envelope.params);

                let response = OutboundMessage::Response {
                    request_id: envelope.request_id,
                    result: outcome.result,
                };
                if !self.registry().send(&response) {
                    warn!(
                        "Response to request {} dropped, not connected",
                        envelope.request_id
                    );
                }
                if outcome.mutating {
                    self.push();
                }
            }
            InboundMessage::StateRequest => {
                debug!("Controller requested canvas state");
                self.push();
            }
            InboundMessage::ControllerConnected => {
                debug!("Controller connected");
                self.push();
            }
            InboundMessage::Unrecognized(kind) => trace!("Ignoring message type {:?}", kind),
        }
    }

    fn handle_request(&mut self, request: HostRequest) {
        match request {
            HostRequest::Edit(edit) => {
                edit(&mut self.store);
                self.debouncer.trigger();
            }
            HostRequest::PushState => self.push(),
            HostRequest::Snapshot(reply) => {
                let _ = reply.send(self.store.snapshot());
            }
            HostRequest::Detach => {}
        }
    }
}

/// Host-side handle to a running bridge
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    requests: mpsc::UnboundedSender<HostRequest>,
    registry: ConnectionRegistry,
}

impl BridgeHandle {
    fn request(&self, request: HostRequest) -> BridgeResult<()> {
        self.requests
            .send(request)
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Whether the shared connection is open
    pub fn connection_status(&self) -> bool {
        self.registry.is_open()
    }

    /// The shared connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Drop the connection and reconnect shortly, resetting the backoff
    pub fn force_reconnect(&self) {
        self.registry.force_reconnect();
    }

    /// Push the current graph immediately
    pub fn push_state(&self) -> BridgeResult<()> {
        self.request(HostRequest::PushState)
    }

    /// Copy of the current graph
    pub async fn snapshot(&self) -> BridgeResult<Graph> {
        let (tx, rx) = oneshot::channel();
        self.request(HostRequest::Snapshot(tx))?;
        rx.await.map_err(|_| BridgeError::ChannelClosed)
    }

    /// Apply a local edit and return its result.
    ///
    /// The edit runs on the bridge task; a debounced push follows.
    pub async fn edit<R, F>(&self, edit: F) -> BridgeResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut GraphStore) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.request(HostRequest::Edit(Box::new(move |store| {
            let _ = tx.send(edit(store));
        })))?;
        rx.await.map_err(|_| BridgeError::ChannelClosed)
    }

    /// Add a node
    pub async fn add_node(&self, request: NewNode) -> BridgeResult<Node> {
        self.edit(move |store| store.create_node(request)).await
    }

    /// Move a node; `false` when the id is unknown
    pub async fn move_node(&self, node_id: impl Into<String>, position: Position) -> BridgeResult<bool> {
        let node_id = node_id.into();
        self.edit(move |store| store.move_node(&node_id, position)).await
    }

    /// Merge a label and config into a node; `false` when the id is unknown
    pub async fn update_node(
        &self,
        node_id: impl Into<String>,
        label: Option<String>,
        config: Option<Map<String, Value>>,
    ) -> BridgeResult<bool> {
        let node_id = node_id.into();
        self.edit(move |store| store.update_node(&node_id, label.as_deref(), config.as_ref()))
            .await
    }

    /// Remove a node and its edges
    pub async fn remove_node(&self, node_id: impl Into<String>) -> BridgeResult<bool> {
        let node_id = node_id.into();
        self.edit(move |store| store.delete_node(&node_id)).await
    }

    /// Connect two nodes
    pub async fn connect(&self, request: NewEdge) -> BridgeResult<Edge> {
        self.edit(move |store| store.connect(request))
            .await?
            .map_err(BridgeError::from)
    }

    /// Remove every edge from `source` to `target`
    pub async fn disconnect(
        &self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> BridgeResult<usize> {
        let (source, target) = (source.into(), target.into());
        self.edit(move |store| store.disconnect(&source, &target)).await
    }

    /// Remove everything
    pub async fn clear(&self) -> BridgeResult<()> {
        self.edit(GraphStore::clear).await
    }

    /// Replace the graph with an exported agent document
    pub async fn import_document(&self, json: &str) -> BridgeResult<()> {
        let graph = AgentDocument::parse(json)?.into_graph();
        self.edit(move |store| store.replace(graph)).await
    }

    /// Stop the bridge task; the shared connection stays up for others
    pub fn detach(&self) -> BridgeResult<()> {
        self.request(HostRequest::Detach)
    }
}
