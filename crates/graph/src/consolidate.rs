use extract::{GraphFragment, GraphNode, GraphRelationship};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// The merged graph handed to clients.
///
/// Every edge endpoint is a node id in `nodes`, every node is an endpoint of
/// at least one edge, and node ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphRelationship>,
}

impl ConsolidatedGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSource,
    MissingTarget,
    MissingBoth,
}

/// A relationship rejected because an endpoint is not a node of its own fragment
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRelationship {
    pub fragment: usize,
    pub relationship: GraphRelationship,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    pub graph: ConsolidatedGraph,
    pub skipped: Vec<SkippedRelationship>,
}

/// Accumulates fragments one at a time
#[derive(Default)]
struct GraphBuilder {
    /// Latest node seen for each id, across all fragments
    nodes_by_id: HashMap<String, GraphNode>,
    edges: Vec<GraphRelationship>,
    seen_edges: HashSet<GraphRelationship>,
    /// Ids referenced by accepted edges, in first-reference order
    referenced: Vec<String>,
    referenced_set: HashSet<String>,
    skipped: Vec<SkippedRelationship>,
}

impl GraphBuilder {
    fn add_fragment(&mut self, fragment_idx: usize, fragment: &GraphFragment) {
        let local_ids: HashSet<&str> = fragment.nodes.iter().map(|n| n.id.as_str()).collect();

        for node in &fragment.nodes {
            self.nodes_by_id.insert(node.id.clone(), node.clone());
        }

        for relationship in &fragment.relationships {
            let has_source = local_ids.contains(relationship.source.as_str());
            let has_target = local_ids.contains(relationship.target.as_str());

            let reason = match (has_source, has_target) {
                (true, true) => None,
                (false, true) => Some(SkipReason::MissingSource),
                (true, false) => Some(SkipReason::MissingTarget),
                (false, false) => Some(SkipReason::MissingBoth),
            };

            if let Some(reason) = reason {
                debug!(
                    fragment = fragment_idx,
                    source = %relationship.source,
                    target = %relationship.target,
                    rel_type = %relationship.rel_type,
                    ?reason,
                    "Skipping relationship with unknown endpoint"
                );
                self.skipped.push(SkippedRelationship {
                    fragment: fragment_idx,
                    relationship: relationship.clone(),
                    reason,
                });
                continue;
            }

            self.reference(&relationship.source);
            self.reference(&relationship.target);

            if self.seen_edges.insert(relationship.clone()) {
                self.edges.push(relationship.clone());
            }
        }
    }

    fn reference(&mut self, id: &str) {
        if self.referenced_set.insert(id.to_string()) {
            self.referenced.push(id.to_string());
        }
    }

    fn finish(self) -> ConsolidationReport {
        let nodes = self
            .referenced
            .iter()
            .filter_map(|id| self.nodes_by_id.get(id).cloned())
            .collect();

        ConsolidationReport {
            graph: ConsolidatedGraph {
                nodes,
                edges: self.edges,
            },
            skipped: self.skipped,
        }
    }
}

/// Merge fragments into one graph, dropping dangling edges and isolated nodes
pub fn consolidate(fragments: &[GraphFragment]) -> ConsolidatedGraph {
    consolidate_with_report(fragments).graph
}

/// Same as [`consolidate`], also returning every rejected relationship
pub fn consolidate_with_report(fragments: &[GraphFragment]) -> ConsolidationReport {
    let mut builder = GraphBuilder::default();

    for (idx, fragment) in fragments.iter().enumerate() {
        builder.add_fragment(idx, fragment);
    }

    let report = builder.finish();

    info!(
        fragments = fragments.len(),
        nodes = report.graph.nodes.len(),
        edges = report.graph.edges.len(),
        skipped = report.skipped.len(),
        "Consolidated graph"
    );

    report
}
