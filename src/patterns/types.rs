//! Error pattern type definitions

use crate::experience::Experience;
use crate::patterns::similarity::{agreement, count_by, most_common, top_n};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Label used when a cluster carries no error type
const UNKNOWN_ERROR: &str = "unknown_error";

/// Distinct member queries kept per pattern for matching
pub const MAX_PATTERN_QUERIES: usize = 64;

/// Error pattern analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Failures needed to mint a new pattern
    pub min_cluster_size: usize,
    /// Minimum score to attach a failure to a pattern or cluster (0.0-1.0)
    pub similarity_threshold: f64,
    /// Patterns below this confidence are not surfaced (0.0-1.0)
    pub min_confidence: f64,
    /// Soft cap on retained patterns
    pub max_patterns: usize,
    /// Maximum unclustered failures held while waiting for a cluster
    pub max_pending: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            similarity_threshold: 0.75,
            min_confidence: 0.6,
            max_patterns: 100,
            max_pending: 500,
        }
    }
}

impl AnalyzerConfig {
    /// Clamp every field into its valid range
    pub fn normalized(mut self) -> Self {
        self.min_cluster_size = self.min_cluster_size.max(1);
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
        self.min_confidence = self.min_confidence.clamp(0.0, 1.0);
        self.max_patterns = self.max_patterns.max(1);
        self.max_pending = self.max_pending.max(self.min_cluster_size);
        self
    }
}

/// Named cluster of similar past failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    /// Stable identifier, never changes once minted
    pub id: String,
    pub label: String,
    /// Representative query of the cluster
    pub common_query: String,
    /// Distinct member queries, bounded by [`MAX_PATTERN_QUERIES`]
    #[serde(default)]
    pub queries: BTreeSet<String>,
    /// Distinct error messages observed
    pub error_messages: BTreeSet<String>,
    pub error_type: String,
    /// Dominant tool among members
    pub tool_name: String,
    /// Cluster cohesion (0.0-1.0)
    pub confidence: f64,
    pub occurrences: usize,
    pub member_ids: Vec<String>,
    pub error_type_counts: HashMap<String, usize>,
    pub tool_counts: HashMap<String, usize>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl ErrorPattern {
    /// Mint a pattern from a cluster of failures
    pub fn from_cluster(members: &[Experience]) -> Self {
        let error_type_counts = count_by(members, |e| e.error_kind());
        let tool_counts = count_by(members, |e| e.tool_name());
        let query_counts = count_by(members, |e| e.query.as_str());

        let error_type = most_common(&error_type_counts);
        let label = if error_type.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error_type.clone()
        };

        let error_messages = members
            .iter()
            .map(|e| e.error_message())
            .filter(|m| !m.is_empty())
            .map(|m| m.to_string())
            .collect();

        let queries = members
            .iter()
            .map(|e| e.query.trim())
            .filter(|q| !q.is_empty())
            .map(|q| q.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(MAX_PATTERN_QUERIES)
            .collect();

        let now = Utc::now();
        let first_seen = members.iter().map(|e| e.timestamp).min().unwrap_or(now);
        let last_seen = members.iter().map(|e| e.timestamp).max().unwrap_or(now);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label,
            common_query: most_common(&query_counts),
            queries,
            error_messages,
            error_type,
            tool_name: most_common(&tool_counts),
            confidence: agreement(&error_type_counts, &tool_counts, members.len()),
            occurrences: members.len(),
            member_ids: members.iter().map(|e| e.id.clone()).collect(),
            error_type_counts,
            tool_counts,
            first_seen,
            last_seen,
        }
    }

    /// Fold a matching failure in and recompute confidence.
    ///
    /// Returns whether the error message was new to the pattern.
    pub fn absorb(&mut self, failure: &Experience) -> bool {
        *self
            .error_type_counts
            .entry(failure.error_kind().to_string())
            .or_insert(0) += 1;
        *self
            .tool_counts
            .entry(failure.tool_name().to_string())
            .or_insert(0) += 1;

        self.occurrences += 1;
        self.member_ids.push(failure.id.clone());
        if failure.timestamp > self.last_seen {
            self.last_seen = failure.timestamp;
        }

        self.confidence = agreement(&self.error_type_counts, &self.tool_counts, self.occurrences);

        let query = failure.query.trim();
        if !query.is_empty() && self.queries.len() < MAX_PATTERN_QUERIES {
            self.queries.insert(query.to_string());
        }

        let message = failure.error_message();
        !message.is_empty() && self.error_messages.insert(message.to_string())
    }

    /// Every query the pattern is matched against
    pub fn known_queries(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.common_query.as_str()).chain(self.queries.iter().map(|q| q.as_str()))
    }

    /// Most frequent tools involved, best first
    pub fn common_tools(&self, n: usize) -> Vec<String> {
        top_n(&self.tool_counts, n)
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect()
    }
}
