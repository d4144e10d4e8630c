//! Graph data model: nodes, edges, node kinds and identifiers.

pub mod graph;
pub mod ids;
pub mod node_kind;

pub use graph::{Edge, Graph, Node, NodeData, Position};
pub use node_kind::{default_node_data, NodeCategory, NodeKind, NodeKindInfo};
