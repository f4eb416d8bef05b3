use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::schema::{GraphFragment, GraphNode, GraphRelationship};

pub const UNKNOWN_NODE_TYPE: &str = "Unknown";
const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATED_TO";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

#[derive(Deserialize)]
struct RawExtraction {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default, alias = "edges")]
    relationships: Vec<RawRelationship>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
}

/// Models emit endpoints either as a bare id or as a full node object
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeRef {
    Id(String),
    Node { id: String },
}

impl NodeRef {
    fn id(&self) -> &str {
        match self {
            NodeRef::Id(id) => id,
            NodeRef::Node { id } => id,
        }
    }
}

#[derive(Deserialize)]
struct RawRelationship {
    source: NodeRef,
    target: NodeRef,
    #[serde(rename = "type", default)]
    rel_type: Option<String>,
}

/// Remove a surrounding Markdown code fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

pub fn is_valid_json(raw: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(strip_code_fence(raw)).is_ok()
}

/// Parse a model response into a fragment.
///
/// Ids and labels are trimmed; nodes with an empty id and relationships with
/// an empty endpoint are dropped. Dangling endpoints are kept as-is.
pub fn parse_fragment(raw: &str) -> Result<GraphFragment> {
    let extraction: RawExtraction = serde_json::from_str(strip_code_fence(raw))
        .context("Failed to parse extraction result")?;

    let nodes = extraction
        .nodes
        .into_iter()
        .filter_map(|node| {
            let id = node.id.trim();
            if id.is_empty() {
                return None;
            }
            let node_type = label_or(node.node_type.as_deref(), UNKNOWN_NODE_TYPE);
            Some(GraphNode::new(id, node_type))
        })
        .collect();

    let relationships = extraction
        .relationships
        .into_iter()
        .filter_map(|rel| {
            let source = rel.source.id().trim();
            let target = rel.target.id().trim();
            if source.is_empty() || target.is_empty() {
                return None;
            }
            let rel_type = label_or(rel.rel_type.as_deref(), DEFAULT_RELATIONSHIP_TYPE);
            Some(GraphRelationship::new(source, target, rel_type))
        })
        .collect();

    Ok(GraphFragment::new(nodes, relationships))
}

fn label_or(label: Option<&str>, fallback: &str) -> String {
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => fallback.to_string(),
    }
}
