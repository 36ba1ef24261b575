//! Error types for toolsage
//!
//! Two classes of failure exist in the engine: recoverable store problems,
//! which are absorbed and degrade to a documented fallback, and configuration
//! problems (an empty tool catalog), which are surfaced to the caller.

use thiserror::Error;

/// Main error type for the learning engine
#[derive(Error, Debug)]
pub enum LearningError {
    /// Record failed validation before reaching the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Query shape the experience log cannot serve
    #[error("Unsupported filter combination: {0}")]
    UnsupportedFilter(String),

    /// Semantic store errors
    #[error("Semantic store error: {0}")]
    Store(String),

    /// No tool could be resolved from the catalog
    #[error("No tool available: the tool catalog is empty")]
    NoToolAvailable,

    /// Store call exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Learning error: {0}")]
    Generic(String),
}

impl LearningError {
    /// Whether the error is absorbed internally rather than surfaced
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LearningError::NoToolAvailable | LearningError::ConfigError(_))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, LearningError>;

/// Convert anyhow errors to LearningError
impl From<anyhow::Error> for LearningError {
    fn from(err: anyhow::Error) -> Self {
        LearningError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LearningError::Timeout { duration_ms: 1500 };
        assert!(err.to_string().contains("1500"));

        let err = LearningError::UnsupportedFilter("structured-only query".to_string());
        assert!(err.to_string().contains("structured-only"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(LearningError::Store("down".to_string()).is_recoverable());
        assert!(LearningError::Timeout { duration_ms: 10 }.is_recoverable());
        assert!(!LearningError::NoToolAvailable.is_recoverable());
    }

    #[test]
    fn test_from_serde_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: LearningError = parse.unwrap_err().into();
        assert!(matches!(err, LearningError::SerializationError(_)));
    }
}
