//! Query descriptor for the experience log

use crate::experience::types::Experience;
use chrono::{DateTime, Utc};

/// Default number of results when no limit is given
pub const DEFAULT_LIMIT: usize = 10;

/// Filters applied to a semantic query over the experience log.
///
/// `query` anchors the semantic search; every other field narrows the
/// returned hits in memory. All conditions are combined as a conjunction.
#[derive(Debug, Clone, Default)]
pub struct ExperienceFilters {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Search text, required
    pub query: String,
    pub intent: Option<String>,
    pub reasoning_mode: Option<String>,
    pub conversation_id: Option<String>,
    /// Minimum semantic similarity of a hit (0.0-1.0)
    pub min_similarity: f64,
    /// `Some(true)` successes only, `Some(false)` failures only, `None` either
    pub success: Option<bool>,
    pub tool_used: Option<String>,
    pub error_type: Option<String>,
    pub min_confidence: Option<f64>,
    pub has_feedback: bool,
    /// Maximum results; 0 means [`DEFAULT_LIMIT`]
    pub limit: usize,
    pub offset: usize,
}

impl ExperienceFilters {
    /// Filters anchored on a search text
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_used = Some(tool.into());
        self
    }

    pub fn min_similarity(mut self, similarity: f64) -> Self {
        self.min_similarity = similarity;
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Limit with the default applied
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// Whether an experience passes every structured filter.
    ///
    /// Similarity is checked separately since it belongs to the search hit,
    /// not the experience.
    pub fn matches(&self, exp: &Experience) -> bool {
        if let Some(start) = self.start_time {
            if exp.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if exp.timestamp > end {
                return false;
            }
        }
        if let Some(intent) = &self.intent {
            if &exp.intent != intent {
                return false;
            }
        }
        if let Some(mode) = &self.reasoning_mode {
            if &exp.reasoning_mode != mode {
                return false;
            }
        }
        if let Some(conversation) = &self.conversation_id {
            if &exp.conversation_id != conversation {
                return false;
            }
        }
        if let Some(success) = self.success {
            if exp.success != success {
                return false;
            }
        }
        if let Some(tool) = &self.tool_used {
            if exp.tool_called.as_ref() != Some(tool) {
                return false;
            }
        }
        if let Some(error_type) = &self.error_type {
            if exp.error_type.as_ref() != Some(error_type) {
                return false;
            }
        }
        if let Some(min_confidence) = self.min_confidence {
            if exp.confidence < min_confidence {
                return false;
            }
        }
        if self.has_feedback && exp.feedback.is_none() {
            return false;
        }
        true
    }
}
