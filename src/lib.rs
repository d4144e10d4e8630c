//!
//! Agent Canvas - an agent workflow graph that an external controller can
//! drive over a persistent connection
//!
//! This crate re-exports the workspace crates:
//! - [`core`]: the graph store and its mutation primitives
//! - [`bridge`]: connection management, command dispatch and state sync
//! - [`monitoring`]: logging setup

#![forbid(unsafe_code)]

pub use canvas_bridge as bridge;
pub use canvas_core as core;
pub use canvas_monitoring as monitoring;

pub use canvas_bridge::{Bridge, BridgeConfig, BridgeHandle, ConnectionRegistry, WebSocketTransport};
pub use canvas_core::{Graph, GraphStore};
