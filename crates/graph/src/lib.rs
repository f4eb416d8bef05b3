pub mod consolidate;
pub mod filter;

pub use consolidate::{
    ConsolidatedGraph, ConsolidationReport, SkipReason, SkippedRelationship, consolidate,
    consolidate_with_report,
};
pub use filter::{GraphSelection, reshape_selection};
