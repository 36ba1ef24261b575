//! Tool catalog types

use serde::{Deserialize, Serialize};

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Parameter schema (JSON Schema)
    #[serde(default)]
    pub parameters: serde_json::Value,

    /// Whether tool is read-only
    #[serde(default)]
    pub read_only: bool,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        read_only: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            read_only,
        }
    }

    /// Schema with no declared parameters
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "", serde_json::json!({"type": "object"}), true)
    }
}

/// Read-only tool lookup used for exploration and fallback.
///
/// `list_all` must return tools in a stable order; the first entry is the
/// fallback of last resort.
pub trait ToolCatalog: Send + Sync {
    /// Enumerate every registered tool
    fn list_all(&self) -> Vec<ToolSchema>;

    /// Look up a tool by name
    fn get(&self, name: &str) -> Option<ToolSchema>;
}
