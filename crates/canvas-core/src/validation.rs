//! Graph-wide structural checks for an agent workflow.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::Graph;

/// Outcome of validating a graph
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no errors were found
    pub valid: bool,
    /// Human-readable problems, in check order
    pub errors: Vec<String>,
}

/// Validate the workflow without mutating it.
///
/// A runnable agent needs an input node, an output node and at least one
/// `llm` node with a model; every non-input node must be wired to something
/// and every edge must point at existing nodes.
pub fn validate(graph: &Graph) -> ValidationReport {
    let mut errors = Vec::new();

    let has_kind = |kind: &str| graph.nodes.iter().any(|n| n.kind == kind);

    if !has_kind("input") {
        errors.push("An input node is required.".to_string());
    }
    if !has_kind("output") {
        errors.push("An output node is required.".to_string());
    }
    if !has_kind("llm") {
        errors.push("At least one LLM node is required.".to_string());
    }

    let connected: HashSet<&str> = graph
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    let disconnected: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|n| n.kind != "input" && !connected.contains(n.id.as_str()))
        .map(|n| n.data.label.as_str())
        .collect();
    if !disconnected.is_empty() {
        errors.push(format!("Disconnected nodes: {}", disconnected.join(", ")));
    }

    for node in graph.nodes.iter().filter(|n| n.kind == "llm") {
        let has_model = node
            .data
            .get("model")
            .and_then(|m| m.as_str())
            .map(|m| !m.is_empty())
            .unwrap_or(false);
        if !has_model {
            errors.push(format!("LLM node \"{}\" has no model configured.", node.data.label));
        }
    }

    for edge in &graph.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !graph.contains_node(endpoint) {
                errors.push(format!(
                    "Edge \"{}\" references missing node \"{}\".",
                    edge.id, endpoint
                ));
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
