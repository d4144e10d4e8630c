//! Portable agent documents for exporting and importing a graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Edge, Graph, Node};
use crate::CoreError;

/// Document format version written on export
pub const DOCUMENT_VERSION: &str = "1.0";

/// Document type tag
pub const DOCUMENT_TYPE: &str = "agent";

/// Descriptive metadata stored alongside the graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Agent name
    #[serde(default)]
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// When the document was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// A serialized agent workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDocument {
    /// Format version
    #[serde(default)]
    pub version: String,
    /// Always `agent`
    #[serde(rename = "type")]
    pub kind: String,
    /// Name, description and export time
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Graph nodes
    pub nodes: Vec<Node>,
    /// Graph edges
    pub edges: Vec<Edge>,
}

impl AgentDocument {
    /// Capture the graph as a document stamped with the current time
    pub fn from_graph(graph: &Graph, name: &str, description: &str) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            kind: DOCUMENT_TYPE.to_string(),
            metadata: DocumentMetadata {
                name: name.to_string(),
                description: description.to_string(),
                exported_at: Some(Utc::now()),
            },
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
        }
    }

    /// Pretty-printed JSON text
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, rejecting anything that is not an agent document
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(json)?;

        if value.get("type").and_then(Value::as_str) != Some(DOCUMENT_TYPE) {
            return Err(CoreError::ImportError(
                "document type must be \"agent\"".to_string(),
            ));
        }
        for field in ["nodes", "edges"] {
            if !value.get(field).map(Value::is_array).unwrap_or(false) {
                return Err(CoreError::ImportError(format!(
                    "document field \"{}\" must be an array",
                    field
                )));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// The graph held by this document
    pub fn into_graph(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
