//! Whole-tree pass: objects whose keys are all indices become lists.
//!
//! The builder can only guess a node's kind from the keys it has seen so far;
//! by the time this runs every key is in, so the guess can be settled.
use indexmap::IndexMap;

use crate::key;
use crate::tree::Node;

pub fn normalize(node: Node) -> Node {
    match node {
        Node::Object(map) if !map.is_empty() && map.keys().all(|k| key::is_index(k)) => {
            Node::Array(indexed_to_list(map))
        }
        Node::Object(map) => Node::Object(
            map.into_iter().map(|(k, v)| (k, normalize(v))).collect(),
        ),
        Node::Array(items) => Node::Array(items.into_iter().map(normalize).collect()),
        leaf => leaf,
    }
}

/// Place each child at its numeric position. Deferred objects were never
/// padded, so gaps are filled here the same way the builder pads lists.
fn indexed_to_list(map: IndexMap<String, Node>) -> Vec<Node> {
    let mut entries: Vec<(usize, Node)> = map
        .into_iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
        .collect();
    entries.sort_by_key(|(i, _)| *i);

    let len = entries.last().map(|(i, _)| i + 1).unwrap_or(0);
    let mut out: Vec<Node> = Vec::with_capacity(len);
    for (i, v) in entries {
        out.resize_with(i, || Node::Unresolved);
        out.push(normalize(v));
    }
    out
}
