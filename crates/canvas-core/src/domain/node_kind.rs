//! Catalog of the node types the agent builder knows about.
//!
//! Node types stay opaque strings on the graph itself; the catalog only
//! supplies default payloads when a node of a known type is created.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::graph::NodeData;

/// Node types with built-in defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Large language model
    Llm,
    /// Conditional routing
    Router,
    /// Conversation memory
    Memory,
    /// External tool or API
    Tool,
    /// Retrieval augmented generation
    Rag,
    /// Entry point
    Input,
    /// Final output
    Output,
    /// Sequential chain
    Chain,
    /// Output quality evaluation
    Evaluator,
    /// Custom function call
    Function,
}

/// Grouping used by the node palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Core model nodes
    Core,
    /// Control flow nodes
    Control,
    /// Memory and retrieval nodes
    Memory,
    /// Tool and function nodes
    Tools,
    /// Input and output nodes
    Io,
}

/// Static description of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKindInfo {
    /// Default display label
    pub label: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Palette category
    pub category: NodeCategory,
    /// Number of input handles
    pub inputs: u8,
    /// Number of output handles
    pub outputs: u8,
}

impl NodeKind {
    /// Every known kind, in palette order
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Llm,
        NodeKind::Router,
        NodeKind::Memory,
        NodeKind::Tool,
        NodeKind::Rag,
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Chain,
        NodeKind::Evaluator,
        NodeKind::Function,
    ];

    /// Resolve a type string; unknown types yield `None`
    pub fn parse(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Llm => "llm",
            NodeKind::Router => "router",
            NodeKind::Memory => "memory",
            NodeKind::Tool => "tool",
            NodeKind::Rag => "rag",
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Chain => "chain",
            NodeKind::Evaluator => "evaluator",
            NodeKind::Function => "function",
        }
    }

    /// Palette metadata
    pub fn info(&self) -> NodeKindInfo {
        use NodeCategory::*;
        let (label, description, category, inputs, outputs) = match self {
            NodeKind::Llm => ("LLM", "Large Language Model node for text generation", Core, 1, 1),
            NodeKind::Router => ("Router", "Route conversations to different paths", Control, 1, 3),
            NodeKind::Memory => ("Memory", "Store and retrieve conversation context", Memory, 1, 1),
            NodeKind::Tool => ("Tool", "External tool or API integration", Tools, 1, 1),
            NodeKind::Rag => ("RAG", "Retrieval Augmented Generation", Memory, 1, 1),
            NodeKind::Input => ("Input", "User or system input node", Io, 0, 1),
            NodeKind::Output => ("Output", "Final output node", Io, 1, 0),
            NodeKind::Chain => ("Chain", "Chain multiple operations together", Control, 1, 1),
            NodeKind::Evaluator => ("Evaluator", "Evaluate output quality", Control, 1, 2),
            NodeKind::Function => ("Function", "Custom function call", Tools, 1, 1),
        };
        NodeKindInfo {
            label,
            description,
            category,
            inputs,
            outputs,
        }
    }

    fn type_defaults(&self) -> Value {
        match self {
            NodeKind::Llm => json!({
                "model": "gpt-4-turbo",
                "temperature": 0.7,
                "maxTokens": 2048,
                "systemPrompt": "You are a helpful assistant.",
            }),
            NodeKind::Router => json!({ "routingLogic": "conditional", "routes": [] }),
            NodeKind::Memory => json!({ "memoryType": "buffer", "memoryLimit": 10 }),
            NodeKind::Tool => json!({ "tools": [] }),
            NodeKind::Rag => json!({
                "vectorStore": "supabase",
                "embeddingModel": "text-embedding-3-small",
                "retrievalCount": 5,
            }),
            NodeKind::Input => json!({ "inputType": "text" }),
            NodeKind::Output => json!({ "outputType": "text" }),
            NodeKind::Chain => json!({}),
            NodeKind::Evaluator => json!({ "evaluationType": "quality", "threshold": 0.8 }),
            NodeKind::Function => json!({ "functionName": "", "functionArgs": "{}" }),
        }
    }
}

/// Default payload for a node of the given type.
///
/// Known kinds get their label, description and type-specific settings.
/// Unknown kinds are labelled with the raw type string.
pub fn default_node_data(kind: &str) -> NodeData {
    match NodeKind::parse(kind) {
        Some(known) => {
            let info = known.info();
            let mut fields = Map::new();
            fields.insert("description".to_string(), json!(info.description));
            fields.insert("agentType".to_string(), json!(known.as_str()));
            if let Value::Object(defaults) = known.type_defaults() {
                fields.extend(defaults);
            }
            NodeData {
                label: info.label.to_string(),
                fields,
            }
        }
        None => {
            let mut data = NodeData::with_label(kind);
            data.fields.insert("agentType".to_string(), json!(kind));
            data
        }
    }
}
