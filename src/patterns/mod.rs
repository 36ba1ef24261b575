//! Error Pattern Analyzer
//!
//! Groups recurring failures into named patterns and matches new failures
//! against them.
//!
//! Components:
//! - Analyzer: incremental clustering with snapshot reads
//! - Similarity: cluster cohesion and pattern match scoring
//! - Types: ErrorPattern and analyzer configuration

pub mod analyzer;
pub mod similarity;
pub mod types;

pub use analyzer::{ErrorPatternAnalyzer, IngestOutcome};
pub use similarity::{calculate_cluster_similarity, most_common, score_pattern_match};
pub use types::{AnalyzerConfig, ErrorPattern};
