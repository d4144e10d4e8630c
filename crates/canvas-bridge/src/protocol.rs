//! Wire envelopes exchanged with the command source.
//!
//! Every frame is one JSON document with a top-level `type` tag.

use canvas_core::Graph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, BridgeResult};

/// Tag of a command frame
pub const COMMAND: &str = "mcp-command";

/// Tag of a snapshot request frame
pub const STATE_REQUEST: &str = "get-canvas-state";

/// Tag the command source uses to announce itself
pub const CONTROLLER_CONNECT: &str = "mcp-connect";

/// A command issued by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    /// Correlation id chosen by the controller, echoed in the response
    pub request_id: i64,
    /// Command name
    #[serde(default)]
    pub command: String,
    /// Command parameters
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

impl CommandEnvelope {
    /// Build a command envelope
    pub fn new(request_id: i64, command: impl Into<String>, params: Value) -> Self {
        Self {
            request_id,
            command: command.into(),
            params,
        }
    }
}

/// Messages received from the command source
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A command to execute
    Command(CommandEnvelope),
    /// Explicit request for a fresh snapshot
    StateRequest,
    /// The controller (re)joined the channel
    ControllerConnected,
    /// Any other `type`; ignored
    Unrecognized(String),
}

impl InboundMessage {
    /// Decode one text frame.
    ///
    /// Frames that are not JSON objects, and command frames without a usable
    /// `requestId`, are decode errors. Unknown or missing `type` tags are not.
    pub fn decode(text: &str) -> BridgeResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(ref fields) = value else {
            return Err(BridgeError::Decode("message is not a JSON object".to_string()));
        };

        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            COMMAND => Ok(InboundMessage::Command(serde_json::from_value(value)?)),
            STATE_REQUEST => Ok(InboundMessage::StateRequest),
            CONTROLLER_CONNECT => Ok(InboundMessage::ControllerConnected),
            _ => Ok(InboundMessage::Unrecognized(kind)),
        }
    }
}

/// Messages sent to the command source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Identifies this process as a frontend endpoint
    #[serde(rename = "frontend-connect")]
    FrontendConnect,

    /// Full graph snapshot
    #[serde(rename = "canvas-state")]
    CanvasState(Graph),

    /// Result of one command
    #[serde(rename = "mcp-response")]
    Response {
        /// Echo of the command's correlation id
        #[serde(rename = "requestId")]
        request_id: i64,
        /// Command-specific result object
        result: Value,
    },
}

impl OutboundMessage {
    /// Serialize to the text frame sent on the wire
    pub fn encode(&self) -> BridgeResult<String> {
        serde_json::to_string(self).map_err(|e| BridgeError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{Edge, Graph};
    use serde_json::json;

    #[test]
    fn decodes_command_frames() {
        let msg = InboundMessage::decode(
            r#"{"type":"mcp-command","requestId":7,"command":"clear_canvas","params":{}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Command(CommandEnvelope::new(7, "clear_canvas", json!({})))
        );
    }

    #[test]
    fn command_params_default_to_empty_object() {
        let msg =
            InboundMessage::decode(r#"{"type":"mcp-command","requestId":1,"command":"x"}"#).unwrap();
        let InboundMessage::Command(cmd) = msg else {
            panic!("expected command");
        };
        assert_eq!(cmd.params, json!({}));
    }

    #[test]
    fn unknown_and_missing_types_are_not_errors() {
        assert_eq!(
            InboundMessage::decode(r#"{"type":"presence"}"#).unwrap(),
            InboundMessage::Unrecognized("presence".to_string())
        );
        assert_eq!(
            InboundMessage::decode(r#"{"hello":1}"#).unwrap(),
            InboundMessage::Unrecognized(String::new())
        );
        assert_eq!(
            InboundMessage::decode(r#"{"type":"get-canvas-state"}"#).unwrap(),
            InboundMessage::StateRequest
        );
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        assert!(matches!(InboundMessage::decode("{not json"), Err(BridgeError::Decode(_))));
        assert!(matches!(InboundMessage::decode("[1,2]"), Err(BridgeError::Decode(_))));
        assert!(matches!(
            InboundMessage::decode(r#"{"type":"mcp-command","command":"clear_canvas"}"#),
            Err(BridgeError::Decode(_))
        ));
    }

    #[test]
    fn encodes_outbound_shapes() {
        assert_eq!(
            OutboundMessage::FrontendConnect.encode().unwrap(),
            r#"{"type":"frontend-connect"}"#
        );

        let graph = Graph {
            nodes: vec![],
            edges: vec![Edge::new("e1", "a", "b")],
        };
        let value: Value =
            serde_json::from_str(&OutboundMessage::CanvasState(graph).encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type":"canvas-state","nodes":[],"edges":[{"id":"e1","source":"a","target":"b"}]})
        );

        let response = OutboundMessage::Response {
            request_id: 3,
            result: json!({"success": true}),
        };
        let value: Value = serde_json::from_str(&response.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type":"mcp-response","requestId":3,"result":{"success":true}}));
    }
}
