//! Seam between the connection registry and the socket library.
//!
//! A transport opens one full-duplex, message-oriented channel. The
//! registry writes text frames into [`Channel::outbound`] and reads
//! [`Frame`]s from [`Channel::inbound`]; the inbound stream ending means the
//! socket closed. Dropping every outbound sender asks the transport to close
//! the socket.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::BridgeResult;

pub mod websocket;

pub use websocket::WebSocketTransport;

/// An inbound event on an open channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One complete UTF-8 text message
    Text(String),
    /// The socket reported an error; a close follows
    Error(String),
}

/// Both halves of an open connection
#[derive(Debug)]
pub struct Channel {
    /// Text frames to send
    pub outbound: mpsc::UnboundedSender<String>,
    /// Frames received; ends when the socket closes
    pub inbound: mpsc::UnboundedReceiver<Frame>,
}

/// Opens connections to the command source
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new connection to `url`
    async fn open(&self, url: &str) -> BridgeResult<Channel>;
}
