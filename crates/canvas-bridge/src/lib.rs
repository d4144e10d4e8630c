//!
//! Canvas Bridge - remote control of an agent canvas graph
//!
//! This crate connects an in-memory agent workflow graph to an external
//! command source over a single persistent connection. Commands from the
//! source mutate the graph and are answered with correlated responses;
//! every change is mirrored back as a full snapshot.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use canvas_monitoring::LogExt;
use tracing::info;

/// Bridge task and host handle
pub mod bridge;

/// Configuration module
pub mod config;

/// Shared connection and reconnect policy
pub mod connection;

/// Command handler table
pub mod dispatcher;

/// Error module
pub mod error;

/// Wire envelopes
pub mod protocol;

/// Snapshot pushes and debounce
pub mod synchronizer;

/// Socket seam
pub mod transport;

// Re-export key types
pub use bridge::{Bridge, BridgeHandle, HostRequest};
pub use config::BridgeConfig;
pub use connection::{ConnectionEvent, ConnectionRegistry, ConnectionStatus, Observer, ReconnectPolicy};
pub use dispatcher::{CommandContext, Dispatcher, Handler, Outcome};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{CommandEnvelope, InboundMessage, OutboundMessage};
pub use synchronizer::Debouncer;
pub use transport::{Channel, Frame, Transport, WebSocketTransport};

/// Run one bridge over an empty graph until Ctrl-C
pub async fn run(config: BridgeConfig, transport: Arc<dyn Transport>) -> BridgeResult<()> {
    config.validate()?;

    let registry = ConnectionRegistry::from_config(&config, transport);
    let (handle, task) = Bridge::spawn(&registry, &config);
    info!("Bridging canvas to {}", config.url);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| BridgeError::Transport(format!("Failed to listen for shutdown signal: {}", e)))?;

    info!("Shutting down");
    if handle.detach().log_err("Bridge task already stopped").is_ok() {
        let _ = task.await;
    }
    registry.shutdown();
    Ok(())
}
