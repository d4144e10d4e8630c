//! State synchronization: full snapshot pushes and the debounce that
//! coalesces local edits.

use std::time::Duration;

use canvas_core::Graph;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::connection::ConnectionRegistry;
use crate::protocol::OutboundMessage;

/// Send the whole graph as one `canvas-state` message.
///
/// Returns `false` when the connection is not open; the push is dropped, not
/// queued, since the next open pushes a fresh snapshot anyway.
pub fn push_snapshot(registry: &ConnectionRegistry, graph: &Graph) -> bool {
    let sent = registry.send(&OutboundMessage::CanvasState(graph.clone()));
    if sent {
        debug!(
            "Pushed canvas state ({} nodes, {} edges)",
            graph.nodes.len(),
            graph.edges.len()
        );
    } else {
        trace!("Canvas state push dropped, not connected");
    }
    sent
}

/// Trailing-edge debounce over tokio time.
///
/// Each [`trigger`](Self::trigger) pushes the deadline out to `delay` from
/// now; [`expired`](Self::expired) resolves once the deadline passes with no
/// further trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create an idle debouncer
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// The quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the debouncer, restarting the quiet period
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a fire is pending
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Wait for the pending deadline, then disarm.
    ///
    /// Never resolves while idle, so it can sit in a `select!` loop. Cancel
    /// safe: dropping the future leaves the deadline in place.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.trigger();

        debouncer.expired().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(900), "fired early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(910), "fired late: {:?}", elapsed);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_debouncer_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = tokio::time::timeout(Duration::from_secs(60), debouncer.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.trigger();
        assert!(debouncer.is_pending());
        debouncer.cancel();
        let fired = tokio::time::timeout(Duration::from_secs(5), debouncer.expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_wait_keeps_the_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        debouncer.trigger();
        let early = tokio::time::timeout(Duration::from_millis(100), debouncer.expired()).await;
        assert!(early.is_err());
        assert!(debouncer.is_pending());
        debouncer.expired().await;
        assert!(!debouncer.is_pending());
    }
}
