//! Tool registry
//!
//! Reference [`ToolCatalog`] guarded by a `RwLock`, preserving registration
//! order so the "first catalog entry" fallback is deterministic.
//!
//! Built-in tools:
//! - math_calculate: Evaluate an arithmetic expression
//! - web_search: Search the web
//! - file_read: Read file contents
//! - file_write: Write content to a file
//! - run_command: Execute a system command

use crate::tools::types::{ToolCatalog, ToolSchema};
use serde_json::json;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Tool registry
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Registered tools in registration order
    tools: RwLock<Vec<ToolSchema>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in agent tools
    pub fn with_builtin_tools() -> Self {
        let registry = Self::new();
        for schema in builtin_tools() {
            registry.register(schema);
        }
        registry
    }

    /// Create a registry from tool names only
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for name in names {
            registry.register(ToolSchema::named(name));
        }
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ToolSchema>> {
        self.tools.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ToolSchema>> {
        self.tools.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a tool, replacing any tool with the same name in place
    pub fn register(&self, schema: ToolSchema) {
        let mut tools = self.write();
        match tools.iter_mut().find(|t| t.name == schema.name) {
            Some(existing) => *existing = schema,
            None => tools.push(schema),
        }
    }

    /// Remove a tool, returning it if present
    pub fn unregister(&self, name: &str) -> Option<ToolSchema> {
        let mut tools = self.write();
        let index = tools.iter().position(|t| t.name == name)?;
        Some(tools.remove(index))
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|t| t.name == name)
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.read().iter().map(|t| t.name.clone()).collect()
    }

    /// Get total number of tools
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ToolCatalog for ToolRegistry {
    fn list_all(&self) -> Vec<ToolSchema> {
        self.read().clone()
    }

    fn get(&self, name: &str) -> Option<ToolSchema> {
        self.read().iter().find(|t| t.name == name).cloned()
    }
}

fn builtin_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema::new(
            "math_calculate",
            "Evaluate an arithmetic expression",
            json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "Expression to evaluate, e.g. \"2 + 2\""
                    }
                },
                "required": ["expression"]
            }),
            true,
        ),
        ToolSchema::new(
            "web_search",
            "Search the web",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search terms"
                    },
                    "max_results": {
                        "type": "integer",
                        "default": 5,
                        "minimum": 1,
                        "maximum": 20
                    }
                },
                "required": ["query"]
            }),
            true,
        ),
        ToolSchema::new(
            "file_read",
            "Read contents of a file",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "File path to read"
                    }
                },
                "required": ["path"]
            }),
            true,
        ),
        ToolSchema::new(
            "file_write",
            "Write content to a file",
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" },
                    "append": { "type": "boolean", "default": false }
                },
                "required": ["path", "content"]
            }),
            false,
        ),
        ToolSchema::new(
            "run_command",
            "Execute a system command",
            json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string" },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "default": []
                    }
                },
                "required": ["command"]
            }),
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = ToolRegistry::with_builtin_tools();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("math_calculate"));
        assert!(registry.contains("web_search"));
        assert!(registry.contains("file_read"));
    }

    #[test]
    fn test_list_all_preserves_order() {
        let registry = ToolRegistry::from_names(["zeta", "alpha", "mid"]);
        let names: Vec<String> = registry.list_all().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = ToolRegistry::from_names(["a", "b"]);
        registry.register(ToolSchema::new("a", "updated", json!({}), false));

        assert_eq!(registry.tool_names(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().description, "updated");
    }

    #[test]
    fn test_unregister() {
        let registry = ToolRegistry::from_names(["a", "b"]);
        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert_eq!(registry.tool_names(), vec!["b"]);
    }

    #[test]
    fn test_nonexistent_tool() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("nonexistent_tool").is_none());
        assert!(registry.list_all().is_empty());
    }
}
