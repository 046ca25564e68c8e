//! Clipboard fragment encoding.
//!
//! Fragments travel as JSON arrays of nodes under a dedicated
//! clipboard MIME type so that pasting between editors keeps structure.

use crate::error::ModelError;
use crate::node::Node;

/// Clipboard MIME type carrying an encoded fragment.
pub const FRAGMENT_MIME: &str = "application/x-slate-fragment";

pub fn encode_fragment(nodes: &[Node]) -> Result<String, ModelError> {
    Ok(serde_json::to_string(nodes)?)
}

/// Decode a fragment, giving every node a fresh key.
pub fn decode_fragment(data: &str) -> Result<Vec<Node>, ModelError> {
    let nodes: Vec<Node> = serde_json::from_str(data)?;
    if nodes.is_empty() {
        return Err(ModelError::Fragment("empty fragment".into()));
    }
    Ok(nodes)
}
