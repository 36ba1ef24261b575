//! Intent heuristics used when no learned recommendation is available

use crate::tools::ToolSchema;
use serde::{Deserialize, Serialize};

/// Maps an intent label to a substring expected in the tool name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    pub intent: String,
    pub tool_substring: String,
}

impl FallbackRule {
    pub fn new(intent: impl Into<String>, tool_substring: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            tool_substring: tool_substring.into(),
        }
    }
}

/// Built-in intent table
pub fn default_rules() -> Vec<FallbackRule> {
    vec![
        FallbackRule::new("calculation", "math_calculate"),
        FallbackRule::new("information_retrieval", "web_search"),
        FallbackRule::new("file_operation", "file_read"),
    ]
}

/// Resolve a tool for `intent`.
///
/// The first rule for the intent whose substring appears in a catalog tool
/// name wins; otherwise the first catalog entry. `None` only for an empty
/// catalog.
pub fn resolve<'a>(
    tools: &'a [ToolSchema],
    intent: &str,
    rules: &[FallbackRule],
) -> Option<&'a ToolSchema> {
    rules
        .iter()
        .filter(|rule| rule.intent == intent)
        .find_map(|rule| tools.iter().find(|t| t.name.contains(&rule.tool_substring)))
        .or_else(|| tools.first())
}
