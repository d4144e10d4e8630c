//! WebSocket transport built on tokio-tungstenite.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use super::{Channel, Frame, Transport};
use crate::error::{BridgeError, BridgeResult};

/// Transport speaking WebSocket text frames
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &str) -> BridgeResult<Channel> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        debug!("WebSocket handshake with {} complete", url);

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<Frame>();

        // Writer: runs until every outbound sender is dropped, then closes.
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!("WebSocket send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: binary, ping and pong frames are not part of the protocol.
        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(Frame::Text(text.as_str().to_owned())).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = inbound_tx.send(Frame::Error(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Channel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
