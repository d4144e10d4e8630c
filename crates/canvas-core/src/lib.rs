//!
//! Canvas Core - graph store for the Agent Canvas bridge
//!
//! This crate owns the in-memory representation of an agent workflow
//! (nodes and edges) and the primitives that mutate it. It has no
//! networking knowledge; the bridge crate drives it from remote commands
//! and local edits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Graph data model
pub mod domain;

/// Error types
pub mod error;

/// Auto-layout heuristic
pub mod layout;

/// Graph store and mutation primitives
pub mod store;

/// Template catalog
pub mod templates;

/// Structural validation
pub mod validation;

/// Export and import documents
pub mod document;


// Re-export key types
pub use document::{AgentDocument, DocumentMetadata};
pub use domain::{Edge, Graph, Node, NodeData, NodeKind, Position};
pub use error::CoreError;
pub use store::{EdgePolicy, GraphStore, NewEdge, NewNode};
pub use templates::{BuiltinTemplates, Template, TemplateCatalog};
pub use validation::{validate, ValidationReport};
