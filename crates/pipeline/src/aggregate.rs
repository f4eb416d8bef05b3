use extract::GraphFragment;

/// Raw extraction output of one run, before consolidation
#[derive(Debug, Clone)]
pub enum ExtractionRun {
    Single(GraphFragment),
    Chunked(Vec<GraphFragment>),
}

/// Flatten a run into fragments in chunk order. No nodes are merged here.
pub fn aggregate(run: ExtractionRun) -> Vec<GraphFragment> {
    match run {
        ExtractionRun::Single(fragment) => vec![fragment],
        ExtractionRun::Chunked(fragments) => fragments,
    }
}

/// True when no fragment carries any node or relationship
pub fn is_empty_extraction(fragments: &[GraphFragment]) -> bool {
    fragments.iter().all(GraphFragment::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{GraphNode, GraphRelationship};

    #[test]
    fn test_aggregate_preserves_chunk_order() {
        let first = GraphFragment::new(vec![GraphNode::new("A", "Person")], vec![]);
        let second = GraphFragment::new(vec![], vec![GraphRelationship::new("A", "B", "KNOWS")]);

        let fragments = aggregate(ExtractionRun::Chunked(vec![first.clone(), second.clone()]));

        assert_eq!(fragments, vec![first, second]);
    }

    #[test]
    fn test_aggregate_single() {
        let fragment = GraphFragment::new(vec![GraphNode::new("A", "Person")], vec![]);
        assert_eq!(aggregate(ExtractionRun::Single(fragment.clone())), vec![fragment]);
    }

    #[test]
    fn test_empty_extraction() {
        assert!(is_empty_extraction(&[]));
        assert!(is_empty_extraction(&[GraphFragment::default(), GraphFragment::default()]));
        assert!(!is_empty_extraction(&[
            GraphFragment::default(),
            GraphFragment::new(vec![GraphNode::new("A", "Person")], vec![]),
        ]));
    }
}
