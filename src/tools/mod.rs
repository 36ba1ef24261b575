//! Tool catalog
//!
//! Read-only name lookup plus enumeration, consumed by the selector for
//! exploration and fallback.

pub mod registry;
pub mod types;

// Re-export commonly used types
pub use registry::ToolRegistry;
pub use types::{ToolCatalog, ToolSchema};
