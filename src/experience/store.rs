//! Experience Store: durable log and queryable index of experiences
//!
//! Writes go straight to the semantic store. Queries are always anchored on
//! a search text; the structured filters run in memory over the hits.

use crate::errors::{LearningError, Result};
use crate::experience::filters::{ExperienceFilters, DEFAULT_LIMIT};
use crate::experience::semantic::{SemanticMatch, SemanticRecord, SemanticStore};
use crate::experience::types::{Experience, CORRECTS_KEY};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Category tag attached to every stored experience
pub const EXPERIENCE_CATEGORY: &str = "experience";

/// Similarity floor used by success-rate lookups
const SUCCESS_RATE_MIN_SIMILARITY: f64 = 0.7;

/// Most recent matches counted by success-rate lookups
const SUCCESS_RATE_SAMPLE_CAP: usize = 100;

/// Search hits scanned before success-rate lookups pick the most recent
const SUCCESS_RATE_SCAN_LIMIT: usize = 1000;

/// Experience store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Result limit applied when filters leave it at zero
    pub default_limit: usize,
    /// Deadline for a single semantic search, none by default
    pub query_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            query_timeout_ms: None,
        }
    }
}

/// Experience log backed by a semantic store
pub struct ExperienceStore {
    backend: Arc<dyn SemanticStore>,
    config: StoreConfig,
    telemetry: Option<TelemetryCollector>,
}

impl ExperienceStore {
    /// Create a store over a semantic backend with default configuration
    pub fn new(backend: Arc<dyn SemanticStore>) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    /// Create a store with custom configuration
    pub fn with_config(backend: Arc<dyn SemanticStore>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            telemetry: None,
        }
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Record a finished experience
    pub async fn record(&self, experience: &Experience) -> Result<()> {
        if experience.id.trim().is_empty() {
            return Err(LearningError::Validation(
                "experience id must not be empty".to_string(),
            ));
        }

        let payload = serde_json::to_string(experience)?;

        let mut tags = HashMap::new();
        tags.insert("category".to_string(), json!(EXPERIENCE_CATEGORY));
        tags.insert("id".to_string(), json!(experience.id));
        tags.insert("intent".to_string(), json!(experience.intent));
        tags.insert("success".to_string(), json!(experience.success));

        self.backend
            .add(SemanticRecord {
                id: experience.id.clone(),
                text: experience.query.clone(),
                payload,
                tags,
            })
            .await?;

        debug!(
            id = %experience.id,
            tool = experience.tool_name(),
            success = experience.success,
            "recorded experience"
        );

        if let Some(telemetry) = &self.telemetry {
            telemetry.record(TelemetryEvent::ExperienceRecorded {
                id: experience.id.clone(),
                success: experience.success,
                timestamp: Instant::now(),
            });
        }

        Ok(())
    }

    /// Record a correction of an earlier experience.
    ///
    /// The original is left untouched; the correction is stored as a new
    /// experience carrying the original id under the `corrects` metadata key.
    pub async fn record_correction(
        &self,
        original_id: &str,
        mut corrected: Experience,
    ) -> Result<Experience> {
        if original_id.trim().is_empty() {
            return Err(LearningError::Validation(
                "original experience id must not be empty".to_string(),
            ));
        }
        if corrected.id == original_id {
            corrected.id = uuid::Uuid::new_v4().to_string();
        }

        corrected
            .metadata
            .insert(CORRECTS_KEY.to_string(), json!(original_id));
        corrected.corrected = true;

        self.record(&corrected).await?;
        Ok(corrected)
    }

    /// Query experiences by semantic similarity plus structured filters
    pub async fn query(&self, filters: &ExperienceFilters) -> Result<Vec<Experience>> {
        if filters.query.trim().is_empty() {
            return Err(LearningError::UnsupportedFilter(
                "a search text is required; structured-only queries need an indexed store"
                    .to_string(),
            ));
        }

        let limit = if filters.limit == 0 {
            self.config.default_limit
        } else {
            filters.limit
        };

        let hits = self
            .search(&filters.query, limit.saturating_add(filters.offset))
            .await?;

        let results: Vec<Experience> = hits
            .into_iter()
            .filter(|hit| hit.score >= filters.min_similarity)
            .filter_map(decode_hit)
            .filter(|exp| filters.matches(exp))
            .skip(filters.offset)
            .take(limit)
            .collect();

        Ok(results)
    }

    /// Success rate of a tool over its most recent calls for requests
    /// resembling `intent_pattern`.
    ///
    /// Returns `(rate, sample_size)`, `(0.0, 0)` when nothing matches.
    pub async fn get_tool_success_rate(
        &self,
        tool: &str,
        intent_pattern: &str,
    ) -> Result<(f64, usize)> {
        let filters = ExperienceFilters::new(intent_pattern)
            .tool(tool)
            .min_similarity(SUCCESS_RATE_MIN_SIMILARITY)
            .limit(SUCCESS_RATE_SCAN_LIMIT);

        let mut experiences = self.query(&filters).await?;
        if experiences.is_empty() {
            return Ok((0.0, 0));
        }

        experiences.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        experiences.truncate(SUCCESS_RATE_SAMPLE_CAP);

        let successes = experiences.iter().filter(|e| e.success).count();
        Ok((successes as f64 / experiences.len() as f64, experiences.len()))
    }

    /// Run a semantic search, bounded by the configured deadline
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SemanticMatch>> {
        match self.config.query_timeout_ms {
            Some(ms) => {
                tokio::time::timeout(
                    Duration::from_millis(ms),
                    self.backend.search_semantic(text, limit),
                )
                .await
                .map_err(|_| LearningError::Timeout { duration_ms: ms })?
            }
            None => self.backend.search_semantic(text, limit).await,
        }
    }
}

/// Decode a search hit, discarding malformed or foreign records
fn decode_hit(hit: SemanticMatch) -> Option<Experience> {
    if let Some(category) = hit.tags.get("category") {
        if category.as_str() != Some(EXPERIENCE_CATEGORY) {
            return None;
        }
    }

    match serde_json::from_str::<Experience>(&hit.payload) {
        Ok(exp) => Some(exp),
        Err(e) => {
            warn!(id = %hit.id, error = %e, "discarding malformed experience record");
            None
        }
    }
}
