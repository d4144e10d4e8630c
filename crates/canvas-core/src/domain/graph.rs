//! Nodes, edges and the graph that owns them.
//!
//! Field names follow the wire format used by the canvas, so a [`Graph`]
//! serializes directly into the `nodes`/`edges` arrays of a state push.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node payload: a display label plus arbitrary configuration fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeData {
    /// Display label
    #[serde(default)]
    pub label: String,

    /// Every other configuration field, kept verbatim
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl NodeData {
    /// Create node data with only a label
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Map::new(),
        }
    }

    /// Shallow-merge configuration fields into this payload.
    ///
    /// A string `label` entry replaces the label; every other key overwrites
    /// the field of the same name.
    pub fn merge(&mut self, config: &Map<String, Value>) {
        for (key, value) in config {
            if key == "label" {
                if let Value::String(label) = value {
                    self.label = label.clone();
                    continue;
                }
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Look up a configuration field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// A node of the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the graph
    pub id: String,

    /// Opaque node type, interpreted by the renderer
    #[serde(rename = "type")]
    pub kind: String,

    /// Canvas position
    pub position: Position,

    /// Label and configuration
    pub data: NodeData,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique id within the graph
    pub id: String,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Output handle on the source node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,

    /// Input handle on the target node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Create an edge without handles
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Set the source handle
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Whether the edge touches the given node on either end
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The full node and edge sets, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes, unique by id
    pub nodes: Vec<Node>,
    /// Edges, unique by id
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the graph has neither nodes nor edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Find a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by id, mutably
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Whether a node with this id exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Whether an edge with this id exists
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_serializes_in_canvas_shape() {
        let mut data = NodeData::with_label("LLM");
        data.fields.insert("model".to_string(), json!("gpt-4-turbo"));
        let node = Node {
            id: "llm-1".to_string(),
            kind: "llm".to_string(),
            position: Position::new(100.0, 200.0),
            data,
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "llm-1",
                "type": "llm",
                "position": {"x": 100.0, "y": 200.0},
                "data": {"label": "LLM", "model": "gpt-4-turbo"}
            })
        );
    }

    #[test]
    fn edge_omits_missing_handles() {
        let edge = Edge::new("e1", "a", "b");
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value, json!({"id": "e1", "source": "a", "target": "b"}));

        let routed = Edge::new("e2", "a", "b").with_source_handle("x");
        let value = serde_json::to_value(&routed).unwrap();
        assert_eq!(value["sourceHandle"], "x");
    }

    #[test]
    fn merge_overwrites_label_and_fields() {
        let mut data = NodeData::with_label("old");
        data.fields.insert("temperature".to_string(), json!(0.7));

        let config = json!({"label": "new", "temperature": 0.2, "model": "m"});
        data.merge(config.as_object().unwrap());

        assert_eq!(data.label, "new");
        assert_eq!(data.get("temperature"), Some(&json!(0.2)));
        assert_eq!(data.get("model"), Some(&json!("m")));
        assert!(data.get("label").is_none());
    }
}
