//! Tool Selector
//!
//! Recommends a tool for a new request by balancing exploitation of proven
//! performers against exploration of untried ones.
//!
//! Components:
//! - Bandit: epsilon-greedy recommender over the experience log
//! - Stats: per-tool aggregation and composite scoring
//! - Fallback: intent heuristics for when the log is silent

pub mod bandit;
pub mod fallback;
pub mod stats;
pub mod types;

pub use bandit::ToolSelector;
pub use fallback::FallbackRule;
pub use stats::ToolStats;
pub use types::{DecisionStrategy, SelectorConfig, ToolRecommendation};
