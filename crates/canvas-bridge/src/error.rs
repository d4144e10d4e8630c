//! Error types for the canvas bridge

use canvas_core::CoreError;
use thiserror::Error;

/// Bridge error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Socket could not be opened or failed while open
    #[error("Transport error: {0}")]
    Transport(String),

    /// Inbound message could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The bridge task is gone
    #[error("Bridge channel closed")]
    ChannelClosed,

    /// Graph store error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BridgeError::Transport("refused".to_string()).to_string(),
            "Transport error: refused"
        );
        assert_eq!(BridgeError::ChannelClosed.to_string(), "Bridge channel closed");
        assert_eq!(
            BridgeError::from(CoreError::NodeNotFound("n1".to_string())).to_string(),
            "Node not found: n1"
        );
    }
}
