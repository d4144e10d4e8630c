//! Placement heuristic for nodes created without an explicit position.

use crate::domain::{Node, Position};

/// Position used when the graph has no nodes
pub const ORIGIN: Position = Position { x: 100.0, y: 200.0 };

/// Horizontal distance from the rightmost node
pub const STEP_X: f64 = 200.0;

/// Place a new node to the right of the rightmost node, at the mean height.
///
/// Nodes may overlap; this is a placement hint, not a constraint.
pub fn auto_position(nodes: &[Node]) -> Position {
    if nodes.is_empty() {
        return ORIGIN;
    }

    let max_x = nodes
        .iter()
        .map(|n| n.position.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg_y = nodes.iter().map(|n| n.position.y).sum::<f64>() / nodes.len() as f64;

    Position::new(max_x + STEP_X, avg_y)
}
