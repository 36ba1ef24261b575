//! Tool selector type definitions

use crate::selector::fallback::{default_rules, FallbackRule};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a recommendation was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStrategy {
    /// Backed by recorded statistics
    Learned,
    /// Random pick to discover untried tools
    Exploration,
    /// Static intent heuristic
    Fallback,
}

impl DecisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStrategy::Learned => "learned",
            DecisionStrategy::Exploration => "exploration",
            DecisionStrategy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DecisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool recommendation with supporting evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecommendation {
    /// Recommended tool name
    pub tool_name: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f64,
    /// Human-readable justification
    pub reasoning: String,
    /// Success rate from experience
    pub success_rate: f64,
    /// Number of observations behind the recommendation
    pub sample_size: usize,
    pub avg_latency_ms: f64,
    /// Up to three runner-up tools
    pub alternatives: Vec<String>,
    pub exploration: bool,
    pub strategy: DecisionStrategy,
}

/// Tool selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Probability of taking the exploration path (0.0-1.0)
    pub exploration_rate: f64,
    /// Learned score below which the fallback heuristic is used (0.0-1.0)
    pub min_confidence: f64,
    /// Observations a tool needs before it can be recommended as learned
    pub min_sample_size: usize,
    /// Seed for the exploration generator; entropy when absent
    pub seed: Option<u64>,
    /// Intent to tool-name heuristics, checked in order
    pub fallback_rules: Vec<FallbackRule>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            exploration_rate: 0.1,
            min_confidence: 0.6,
            min_sample_size: 3,
            seed: None,
            fallback_rules: default_rules(),
        }
    }
}

impl SelectorConfig {
    /// Clamp every field into its valid range
    pub fn normalized(mut self) -> Self {
        self.exploration_rate = clamp_unit(self.exploration_rate);
        self.min_confidence = clamp_unit(self.min_confidence);
        self.min_sample_size = self.min_sample_size.max(1);
        self
    }
}

/// Clamp to 0.0-1.0, mapping NaN to 0.0
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
