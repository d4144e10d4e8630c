#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use canvas_bridge::{Bridge, BridgeHandle, ConnectionRegistry, Dispatcher, OutboundMessage, ReconnectPolicy};
use canvas_core::{BuiltinTemplates, Graph, GraphStore};
use canvas_test_utils::{approx_eq, FakeCommandSource, FakePeer};
use tokio::time::Instant;

pub const DEBOUNCE: Duration = Duration::from_millis(500);
pub const MANUAL_RECONNECT: Duration = Duration::from_millis(100);

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("canvas_bridge=debug")
        .with_test_writer()
        .try_init();
}

pub fn registry(source: &FakeCommandSource) -> ConnectionRegistry {
    ConnectionRegistry::new(
        "ws://controller.test:3001",
        Arc::new(source.clone()),
        ReconnectPolicy::default(),
        MANUAL_RECONNECT,
    )
}

pub fn attach_bridge(registry: &ConnectionRegistry, store: GraphStore) -> BridgeHandle {
    let dispatcher = Dispatcher::new(Arc::new(BuiltinTemplates::new()));
    let (bridge, handle) = Bridge::attach(registry, store, dispatcher, DEBOUNCE);
    tokio::spawn(bridge.run());
    handle
}

/// Wait for the next connection and consume its opening handshake
pub async fn accept_open(source: &FakeCommandSource) -> FakePeer {
    let mut peer = source.accept().await;
    assert_eq!(peer.recv().await, Some(OutboundMessage::FrontendConnect));
    peer
}

/// Start a bridge over an empty graph and return the controller's peer,
/// positioned after the initial snapshot
pub async fn start_bridge(source: &FakeCommandSource) -> (ConnectionRegistry, BridgeHandle, FakePeer) {
    let registry = registry(source);
    let handle = attach_bridge(&registry, GraphStore::new());
    let mut peer = accept_open(source).await;
    assert_eq!(peer.recv().await, Some(OutboundMessage::CanvasState(Graph::new())));
    (registry, handle, peer)
}

pub async fn wait_open(registry: &ConnectionRegistry, open: bool) {
    let mut rx = registry.watch_open();
    let _ = rx.wait_for(|is_open| *is_open == open).await;
}

/// Let spawned tasks settle without waiting on anything in particular
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn gaps(attempts: &[Instant]) -> Vec<Duration> {
    attempts.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn assert_gap(actual: Duration, expected_ms: u64) {
    assert!(
        approx_eq(actual, Duration::from_millis(expected_ms), Duration::from_millis(5)),
        "expected ~{}ms, got {:?}",
        expected_ms,
        actual
    );
}

pub fn canvas_state(message: Option<OutboundMessage>) -> Graph {
    match message {
        Some(OutboundMessage::CanvasState(graph)) => graph,
        other => panic!("expected canvas-state, got {:?}", other),
    }
}

pub fn response(message: Option<OutboundMessage>) -> (i64, serde_json::Value) {
    match message {
        Some(OutboundMessage::Response { request_id, result }) => (request_id, result),
        other => panic!("expected mcp-response, got {:?}", other),
    }
}
