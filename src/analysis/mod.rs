//! Tier analysis
//!
//! Classifies objects against filter criteria and folds them into per-tier
//! statistics for every analysed source.

pub mod aggregator;
pub mod classifier;
pub mod models;

pub use aggregator::{aggregate, aggregate_source, aggregate_sources, Aggregation, TierAggregator};
pub use classifier::matches;
pub use models::*;
