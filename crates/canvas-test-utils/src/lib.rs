//! Testing utilities for the Agent Canvas bridge.
//!
//! The main piece is [`FakeCommandSource`], an in-process stand-in for the
//! controller's socket server. It implements the bridge's `Transport` seam,
//! so a `ConnectionRegistry` built on it behaves exactly as it would over a
//! real WebSocket, while tests script refusals, drops and inbound frames.

pub mod fake_source;

pub use fake_source::{FakeCommandSource, FakePeer};

use std::time::Duration;

/// Whether two durations are within `tolerance` of each other
pub fn approx_eq(actual: Duration, expected: Duration, tolerance: Duration) -> bool {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    diff <= tolerance
}
