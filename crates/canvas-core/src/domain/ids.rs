//! Identifier generation for nodes and edges.

use uuid::Uuid;

/// Fresh node id of the form `<type>-<8 hex chars>`
pub fn node_id(kind: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", kind, &suffix[..8])
}

/// Edge id derived from its endpoints and creation time in milliseconds
pub fn edge_id(source: &str, target: &str, created_at_ms: i64) -> String {
    format!("e-{}-{}-{}", source, target, created_at_ms)
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
