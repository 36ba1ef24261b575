//! toolsage - Adaptive tool selection for LLM agents
//!
//! Learns from an agent's own history which tools work for which kinds of
//! requests, and which failures keep recurring.
//!
//! # Architecture
//!
//! - **Experience Log**: append-mostly record of interactions over a semantic store
//! - **Tool Selector**: epsilon-greedy recommender with intent fallbacks
//! - **Error Pattern Analyzer**: incremental clustering of recurring failures

pub mod errors;
pub mod text;

// Learning components
pub mod experience;
pub mod patterns;
pub mod selector;
pub mod tools;

// Re-export commonly used types
pub use errors::{LearningError, Result};
pub use experience::{Experience, ExperienceFilters, ExperienceStore, InMemorySemanticStore};
pub use patterns::{ErrorPattern, ErrorPatternAnalyzer};
pub use selector::{ToolRecommendation, ToolSelector};

// Interface layer
pub mod cli;
pub mod config;
pub mod telemetry;
