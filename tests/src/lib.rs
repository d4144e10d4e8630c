//! Shared harness for the end-to-end tests: a fake controller on one side,
//! a bridge over the real graph store and template catalog on the other.

use std::sync::Arc;

use agent_canvas::bridge::{Bridge, BridgeConfig, BridgeHandle, ConnectionRegistry, OutboundMessage};
use agent_canvas::core::Graph;
use canvas_test_utils::{FakeCommandSource, FakePeer};
use serde_json::Value;

/// Configuration pointing at the fake controller
pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        url: "ws://controller.test:3001".to_string(),
        ..Default::default()
    }
}

/// Start a bridge; it runs for as long as the returned handle lives.
///
/// The peer is positioned after the registration and the initial empty
/// snapshot.
pub async fn connect(config: &BridgeConfig) -> (FakeCommandSource, BridgeHandle, FakePeer) {
    let source = FakeCommandSource::new();
    let registry = ConnectionRegistry::from_config(config, Arc::new(source.clone()));
    let (handle, _task) = Bridge::spawn(&registry, config);

    let mut peer = source.accept().await;
    assert_eq!(peer.recv().await, Some(OutboundMessage::FrontendConnect));
    assert_eq!(peer.recv().await, Some(OutboundMessage::CanvasState(Graph::new())));
    (source, handle, peer)
}

/// Send one command and return its result plus the state push, if any
pub async fn call(peer: &mut FakePeer, request_id: i64, command: &str, params: Value) -> (Value, Option<Graph>) {
    peer.send_command(request_id, command, params);

    let result = match peer.recv().await {
        Some(OutboundMessage::Response { request_id: id, result }) => {
            assert_eq!(id, request_id);
            result
        }
        other => panic!("expected response to {}, got {:?}", request_id, other),
    };

    let pushed = match peer.try_recv() {
        Some(OutboundMessage::CanvasState(graph)) => Some(graph),
        None => None,
        Some(other) => panic!("unexpected message after response: {:?}", other),
    };
    (result, pushed)
}
