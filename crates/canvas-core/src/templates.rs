//! Predefined graphs used to seed the canvas wholesale.
//!
//! The catalog is an external collaborator of the graph store: commands only
//! refer to templates by id, so anything implementing [`TemplateCatalog`] can
//! back `load_template`.

use serde::{Deserialize, Serialize};

use crate::domain::{default_node_data, Edge, Node, Position};

/// An immutable, predefined node and edge set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Catalog category
    pub category: String,
    /// Template nodes
    pub nodes: Vec<Node>,
    /// Template edges
    pub edges: Vec<Edge>,
}

/// Lookup of templates by id
pub trait TemplateCatalog: Send + Sync {
    /// Fetch a template; `None` when the id is unknown
    fn get(&self, id: &str) -> Option<Template>;

    /// Ids of every available template
    fn ids(&self) -> Vec<String>;
}

/// The templates shipped with the agent builder
#[derive(Debug, Clone)]
pub struct BuiltinTemplates {
    templates: Vec<Template>,
}

impl BuiltinTemplates {
    /// Build the built-in catalog
    pub fn new() -> Self {
        Self {
            templates: vec![chatbot_basic(), rag_assistant(), tool_agent(), multi_agent()],
        }
    }
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCatalog for BuiltinTemplates {
    fn get(&self, id: &str) -> Option<Template> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    fn ids(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.id.clone()).collect()
    }
}

fn node(id: &str, kind: &str, x: f64, y: f64) -> Node {
    Node {
        id: id.to_string(),
        kind: kind.to_string(),
        position: Position::new(x, y),
        data: default_node_data(kind),
    }
}

fn chatbot_basic() -> Template {
    Template {
        id: "chatbot-basic".to_string(),
        name: "Basic Chatbot".to_string(),
        description: "Simple conversational chatbot with memory".to_string(),
        category: "chatbot".to_string(),
        nodes: vec![
            node("input-1", "input", 100.0, 200.0),
            node("memory-1", "memory", 300.0, 100.0),
            node("llm-1", "llm", 300.0, 200.0),
            node("output-1", "output", 500.0, 200.0),
        ],
        edges: vec![
            Edge::new("e1", "input-1", "memory-1"),
            Edge::new("e2", "memory-1", "llm-1"),
            Edge::new("e3", "llm-1", "output-1"),
        ],
    }
}

fn rag_assistant() -> Template {
    Template {
        id: "rag-assistant".to_string(),
        name: "RAG Assistant".to_string(),
        description: "Knowledge-augmented assistant with vector search".to_string(),
        category: "assistant".to_string(),
        nodes: vec![
            node("input-1", "input", 100.0, 200.0),
            node("rag-1", "rag", 300.0, 100.0),
            node("llm-1", "llm", 300.0, 250.0),
            node("output-1", "output", 500.0, 200.0),
        ],
        edges: vec![
            Edge::new("e1", "input-1", "rag-1"),
            Edge::new("e2", "rag-1", "llm-1"),
            Edge::new("e3", "llm-1", "output-1"),
        ],
    }
}

fn tool_agent() -> Template {
    Template {
        id: "tool-agent".to_string(),
        name: "Tool-Augmented Agent".to_string(),
        description: "Agent with external tool capabilities".to_string(),
        category: "assistant".to_string(),
        nodes: vec![
            node("input-1", "input", 100.0, 200.0),
            node("router-1", "router", 300.0, 200.0),
            node("tool-1", "tool", 500.0, 100.0),
            node("llm-1", "llm", 500.0, 300.0),
            node("output-1", "output", 700.0, 200.0),
        ],
        edges: vec![
            Edge::new("e1", "input-1", "router-1"),
            Edge::new("e2", "router-1", "tool-1").with_source_handle("a"),
            Edge::new("e3", "router-1", "llm-1").with_source_handle("b"),
            Edge::new("e4", "tool-1", "output-1"),
            Edge::new("e5", "llm-1", "output-1"),
        ],
    }
}

fn multi_agent() -> Template {
    Template {
        id: "multi-agent".to_string(),
        name: "Multi-Agent System".to_string(),
        description: "Multiple specialized agents working together".to_string(),
        category: "custom".to_string(),
        nodes: vec![
            node("input-1", "input", 100.0, 250.0),
            node("router-1", "router", 300.0, 250.0),
            node("llm-1", "llm", 500.0, 100.0),
            node("llm-2", "llm", 500.0, 250.0),
            node("llm-3", "llm", 500.0, 400.0),
            node("evaluator-1", "evaluator", 700.0, 250.0),
            node("output-1", "output", 900.0, 250.0),
        ],
        edges: vec![
            Edge::new("e1", "input-1", "router-1"),
            Edge::new("e2", "router-1", "llm-1").with_source_handle("a"),
            Edge::new("e3", "router-1", "llm-2").with_source_handle("b"),
            Edge::new("e4", "router-1", "llm-3").with_source_handle("c"),
            Edge::new("e5", "llm-1", "evaluator-1"),
            Edge::new("e6", "llm-2", "evaluator-1"),
            Edge::new("e7", "llm-3", "evaluator-1"),
            Edge::new("e8", "evaluator-1", "output-1"),
        ],
    }
}
