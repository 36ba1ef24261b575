//! Core data types for the experience log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key linking a correction to the experience it supersedes
pub const CORRECTS_KEY: &str = "corrects";

/// User rating attached to feedback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Negative,
    Neutral,
    Positive,
}

/// Feedback left on an experience after the fact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feedback {
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub helpful: bool,
    #[serde(default)]
    pub accurate: bool,
    #[serde(default)]
    pub complete: bool,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Create feedback with a rating and no comment
    pub fn new(rating: Rating) -> Self {
        Self {
            rating,
            comment: String::new(),
            helpful: rating == Rating::Positive,
            accurate: rating == Rating::Positive,
            complete: rating == Rating::Positive,
            timestamp: Utc::now(),
        }
    }
}

/// Experience: one finished agent interaction and its outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
    /// Unique identifier, required and immutable once recorded
    pub id: String,
    pub timestamp: DateTime<Utc>,

    // Context
    /// Original query text
    pub query: String,
    /// Detected intent label
    #[serde(default)]
    pub intent: String,
    /// Reasoning mode (react, cot, planner, ...)
    #[serde(default)]
    pub reasoning_mode: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    // Action
    /// Tool invoked, if any
    #[serde(default)]
    pub tool_called: Option<String>,
    #[serde(default)]
    pub tool_args: serde_json::Value,
    #[serde(default)]
    pub response: String,

    // Outcome
    pub success: bool,
    /// Error message when the interaction failed
    #[serde(default)]
    pub error: Option<String>,
    /// Error category when the interaction failed
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub tool_result: serde_json::Value,
    /// Self-assessed confidence (0.0-1.0)
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reflected: bool,
    #[serde(default)]
    pub corrected: bool,

    #[serde(default)]
    pub feedback: Option<Feedback>,

    // Metrics
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub tokens_used: u64,
}

impl Experience {
    /// Create a new successful experience for a query with a fresh id
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            query: query.into(),
            intent: String::new(),
            reasoning_mode: String::new(),
            conversation_id: String::new(),
            metadata: HashMap::new(),
            tool_called: None,
            tool_args: serde_json::Value::Null,
            response: String::new(),
            success: true,
            error: None,
            error_type: None,
            tool_result: serde_json::Value::Null,
            confidence: 1.0,
            reflected: false,
            corrected: false,
            feedback: None,
            latency_ms: 0,
            tokens_used: 0,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_called = Some(tool.into());
        self
    }

    pub fn with_reasoning_mode(mut self, mode: impl Into<String>) -> Self {
        self.reasoning_mode = mode.into();
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Confidence is clamped to 0.0-1.0
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Mark the experience successful with a response
    pub fn succeeded(mut self, response: impl Into<String>) -> Self {
        self.success = true;
        self.response = response.into();
        self.error = None;
        self.error_type = None;
        self
    }

    /// Mark the experience failed with an error category and message
    pub fn failed(mut self, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_type = Some(error_type.into());
        self.error = Some(message.into());
        self
    }

    /// Id of the experience this one corrects, if any
    pub fn corrects(&self) -> Option<&str> {
        self.metadata.get(CORRECTS_KEY).and_then(|v| v.as_str())
    }

    /// Tool name or empty string
    pub fn tool_name(&self) -> &str {
        self.tool_called.as_deref().unwrap_or("")
    }

    /// Error category or empty string
    pub fn error_kind(&self) -> &str {
        self.error_type.as_deref().unwrap_or("")
    }

    /// Error message or empty string
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}
