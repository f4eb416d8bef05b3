use extract::{GraphNode, GraphRelationship, UNKNOWN_NODE_TYPE};
use serde::{Deserialize, Serialize};

/// A client-chosen subset of a graph, echoed back in the `{nodes, edges}` shape.
/// Unlike [`crate::ConsolidatedGraph`] nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSelection {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphRelationship>,
}

/// Reshape selected node ids and edges; node types are not known here
pub fn reshape_selection(node_ids: Vec<String>, edges: Vec<GraphRelationship>) -> GraphSelection {
    let nodes = node_ids
        .into_iter()
        .map(|id| GraphNode::new(id, UNKNOWN_NODE_TYPE))
        .collect();

    GraphSelection { nodes, edges }
}
