//! The authoritative in-memory graph and its mutation primitives.
//!
//! Every mutation is synchronous and takes `&mut self`; the owner of the
//! store serializes access. None of these operations know about the network.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{default_node_data, ids, Edge, Graph, Node, Position};
use crate::layout::auto_position;
use crate::templates::Template;
use crate::CoreError;

/// How `connect` treats endpoints that do not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Insert the edge regardless of its endpoints
    #[default]
    Permissive,
    /// Refuse edges whose source or target is missing
    Reject,
}

/// Request to create a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNode {
    /// Node type, kept as an opaque string
    pub kind: String,
    /// Label overriding the type default
    pub label: Option<String>,
    /// Explicit position; auto-layout is used when absent
    pub position: Option<Position>,
    /// Fields merged into the node data
    pub config: Option<Map<String, Value>>,
}

impl NewNode {
    /// Request a node of the given type with default settings
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }
}

/// Request to create an edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEdge {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Output handle on the source
    pub source_handle: Option<String>,
    /// Input handle on the target
    pub target_handle: Option<String>,
}

impl NewEdge {
    /// Request an edge between two nodes without handles
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }
}

/// In-memory graph store
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: Graph,
    edge_policy: EdgePolicy,
}

impl GraphStore {
    /// Create an empty store with the permissive edge policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given edge policy
    pub fn with_policy(edge_policy: EdgePolicy) -> Self {
        Self {
            graph: Graph::new(),
            edge_policy,
        }
    }

    /// The active edge policy
    pub fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    /// Borrow the current graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Owned copy of the current graph
    pub fn snapshot(&self) -> Graph {
        self.graph.clone()
    }

    /// Position a new node would get from auto-layout
    pub fn next_position(&self) -> Position {
        auto_position(&self.graph.nodes)
    }

    /// Insert a new node and return a copy of it.
    ///
    /// Data starts from the type's defaults, then the label and config are
    /// applied on top.
    pub fn create_node(&mut self, request: NewNode) -> Node {
        let position = request.position.unwrap_or_else(|| self.next_position());

        let mut id = ids::node_id(&request.kind);
        while self.graph.contains_node(&id) {
            id = ids::node_id(&request.kind);
        }

        let mut data = default_node_data(&request.kind);
        if let Some(label) = request.label.filter(|l| !l.is_empty()) {
            data.label = label;
        }
        if let Some(config) = &request.config {
            data.merge(config);
        }

        let node = Node {
            id,
            kind: request.kind,
            position,
            data,
        };
        debug!("Created node {} ({}) at ({}, {})", node.id, node.kind, position.x, position.y);
        self.graph.nodes.push(node.clone());
        node
    }

    /// Insert a fully formed node, replacing any node with the same id
    pub fn insert_node(&mut self, node: Node) {
        match self.graph.node_mut(&node.id) {
            Some(existing) => *existing = node,
            None => self.graph.nodes.push(node),
        }
    }

    /// Merge a label and config into a node.
    ///
    /// Returns `false` and changes nothing when the id is unknown.
    pub fn update_node(
        &mut self,
        node_id: &str,
        label: Option<&str>,
        config: Option<&Map<String, Value>>,
    ) -> bool {
        let Some(node) = self.graph.node_mut(node_id) else {
            debug!("Update ignored, node {} not found", node_id);
            return false;
        };

        if let Some(label) = label.filter(|l| !l.is_empty()) {
            node.data.label = label.to_string();
        }
        if let Some(config) = config {
            node.data.merge(config);
        }
        true
    }

    /// Move a node; returns `false` when the id is unknown
    pub fn move_node(&mut self, node_id: &str, position: Position) -> bool {
        match self.graph.node_mut(node_id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a node and every edge that touches it.
    ///
    /// Returns `false` when the id is unknown; edges are cascaded either way
    /// so no edge can keep referencing the id afterwards.
    pub fn delete_node(&mut self, node_id: &str) -> bool {
        let before = self.graph.nodes.len();
        self.graph.nodes.retain(|n| n.id != node_id);
        let removed = self.graph.nodes.len() != before;

        let edges_before = self.graph.edges.len();
        self.graph.edges.retain(|e| !e.touches(node_id));
        debug!(
            "Deleted node {} (found: {}), cascaded {} edge(s)",
            node_id,
            removed,
            edges_before - self.graph.edges.len()
        );
        removed
    }

    /// Insert a new edge with a freshly generated id
    pub fn connect(&mut self, request: NewEdge) -> Result<Edge, CoreError> {
        if self.edge_policy == EdgePolicy::Reject {
            for endpoint in [&request.source, &request.target] {
                if !self.graph.contains_node(endpoint) {
                    return Err(CoreError::DanglingEdge(format!(
                        "node \"{}\" does not exist",
                        endpoint
                    )));
                }
            }
        }

        let base = ids::edge_id(&request.source, &request.target, ids::now_ms());
        let mut id = base.clone();
        let mut suffix = 1;
        while self.graph.contains_edge(&id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        let edge = Edge {
            id,
            source: request.source,
            target: request.target,
            source_handle: request.source_handle.filter(|h| !h.is_empty()),
            target_handle: request.target_handle.filter(|h| !h.is_empty()),
        };
        debug!("Connected {} -> {} as {}", edge.source, edge.target, edge.id);
        self.graph.edges.push(edge.clone());
        Ok(edge)
    }

    /// Remove every edge from `source` to `target`; returns how many went
    pub fn disconnect(&mut self, source: &str, target: &str) -> usize {
        let before = self.graph.edges.len();
        self.graph
            .edges
            .retain(|e| !(e.source == source && e.target == target));
        before - self.graph.edges.len()
    }

    /// Remove all nodes and edges
    pub fn clear(&mut self) {
        self.graph = Graph::new();
    }

    /// Replace the whole graph with a template's nodes and edges
    pub fn load_template(&mut self, template: &Template) {
        self.graph = Graph {
            nodes: template.nodes.clone(),
            edges: template.edges.clone(),
        };
        debug!(
            "Loaded template {} ({} nodes, {} edges)",
            template.id,
            template.nodes.len(),
            template.edges.len()
        );
    }

    /// Replace the whole graph
    pub fn replace(&mut self, graph: Graph) {
        self.graph = graph;
    }
}
