//! Tool Selector: epsilon-greedy tool recommendation
//!
//! Exploits tools with a proven record for similar requests, explores a
//! random catalog tool with probability `exploration_rate`, and falls back
//! to a static intent heuristic whenever the log has nothing useful to say.

use crate::errors::{LearningError, Result};
use crate::experience::{ExperienceFilters, ExperienceStore};
use crate::selector::fallback;
use crate::selector::stats::{self, ScoredTool, ToolStats};
use crate::selector::types::{clamp_unit, DecisionStrategy, SelectorConfig, ToolRecommendation};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::tools::ToolCatalog;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, warn};

/// Similarity floor for experiences considered by the exploitation path
const EXPLOIT_MIN_SIMILARITY: f64 = 0.7;

/// Experiences considered by the exploitation path
const EXPLOIT_QUERY_LIMIT: usize = 100;

/// Search hits scanned by statistics introspection before the intent and
/// tool filters run
const STATS_QUERY_LIMIT: usize = 1000;

/// Maximum alternatives attached to a learned recommendation
const MAX_ALTERNATIVES: usize = 3;

const EXPLORATION_CONFIDENCE: f64 = 0.5;
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Why the fallback heuristic was used
#[derive(Debug, Clone)]
enum FallbackReason {
    NoData,
    StoreUnavailable(String),
    InsufficientSamples,
    LowConfidence { tool: String, score: f64 },
}

impl FallbackReason {
    fn describe(&self) -> String {
        match self {
            FallbackReason::NoData => "no similar past experiences".to_string(),
            FallbackReason::StoreUnavailable(error) => {
                format!("experience log unavailable ({})", error)
            }
            FallbackReason::InsufficientSamples => {
                "no tool has enough observations yet".to_string()
            }
            FallbackReason::LowConfidence { tool, score } => {
                format!("best learned candidate '{}' scored only {:.2}", tool, score)
            }
        }
    }
}

/// Adaptive tool selector
pub struct ToolSelector {
    store: Arc<ExperienceStore>,
    catalog: Arc<dyn ToolCatalog>,
    config: SelectorConfig,
    rng: Mutex<StdRng>,
    telemetry: Option<TelemetryCollector>,
}

impl ToolSelector {
    /// Create a selector with default configuration
    pub fn new(store: Arc<ExperienceStore>, catalog: Arc<dyn ToolCatalog>) -> Self {
        Self::with_config(store, catalog, SelectorConfig::default())
    }

    /// Create a selector with custom configuration.
    ///
    /// Out-of-range values are clamped. The generator is seeded from
    /// `config.seed` when present.
    pub fn with_config(
        store: Arc<ExperienceStore>,
        catalog: Arc<dyn ToolCatalog>,
        config: SelectorConfig,
    ) -> Self {
        let config = config.normalized();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            store,
            catalog,
            config,
            rng: Mutex::new(rng),
            telemetry: None,
        }
    }

    /// Replace the random generator
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Set exploration rate, clamped to 0.0-1.0
    pub fn set_exploration_rate(&mut self, rate: f64) {
        self.config.exploration_rate = clamp_unit(rate);
    }

    /// Set minimum learned confidence, clamped to 0.0-1.0
    pub fn set_min_confidence(&mut self, confidence: f64) {
        self.config.min_confidence = clamp_unit(confidence);
    }

    /// Set minimum sample size, at least 1
    pub fn set_min_sample_size(&mut self, size: usize) {
        self.config.min_sample_size = size.max(1);
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Recommend a tool for `query` classified as `intent`.
    ///
    /// Only fails with [`LearningError::NoToolAvailable`] when the catalog
    /// is empty; store problems degrade to the fallback heuristic.
    pub async fn recommend_tool(&self, query: &str, intent: &str) -> Result<ToolRecommendation> {
        let roll: f64 = self.rng().gen();
        let recommendation = if roll < self.config.exploration_rate {
            self.explore()?
        } else {
            self.exploit(query, intent).await?
        };

        debug!(
            tool = %recommendation.tool_name,
            strategy = %recommendation.strategy,
            confidence = recommendation.confidence,
            "tool recommended"
        );

        if let Some(telemetry) = &self.telemetry {
            telemetry.record(TelemetryEvent::RecommendationIssued {
                tool: recommendation.tool_name.clone(),
                strategy: recommendation.strategy,
                confidence: recommendation.confidence,
                timestamp: Instant::now(),
            });
        }

        Ok(recommendation)
    }

    /// Raw statistics for a tool under an intent, without recommending.
    ///
    /// The search text rarely resembles stored queries, so hits arrive in
    /// store order and only the first `STATS_QUERY_LIMIT` are filtered. A log
    /// larger than that may undercount. Store failures yield empty statistics.
    pub async fn get_tool_stats(&self, tool: &str, intent: &str) -> ToolStats {
        let filters = ExperienceFilters::new(format!("{} {}", intent, tool))
            .intent(intent)
            .tool(tool)
            .limit(STATS_QUERY_LIMIT);

        match self.store.query(&filters).await {
            Ok(experiences) => stats::aggregate(&experiences)
                .remove(tool)
                .unwrap_or_else(|| ToolStats::new(tool)),
            Err(e) => {
                self.note_store_failure("get_tool_stats", &e);
                ToolStats::new(tool)
            }
        }
    }

    /// Uniform random pick from the catalog
    fn explore(&self) -> Result<ToolRecommendation> {
        let tools = self.catalog.list_all();
        if tools.is_empty() {
            return Err(LearningError::NoToolAvailable);
        }

        let index = self.rng().gen_range(0..tools.len());
        let tool = &tools[index];

        Ok(ToolRecommendation {
            tool_name: tool.name.clone(),
            confidence: EXPLORATION_CONFIDENCE,
            reasoning: format!(
                "Exploring '{}' to gather evidence beyond the best-known tools",
                tool.name
            ),
            success_rate: 0.0,
            sample_size: 0,
            avg_latency_ms: 0.0,
            alternatives: Vec::new(),
            exploration: true,
            strategy: DecisionStrategy::Exploration,
        })
    }

    /// Recommend from recorded statistics, falling back when they are weak
    async fn exploit(&self, query: &str, intent: &str) -> Result<ToolRecommendation> {
        let filters = ExperienceFilters::new(query)
            .intent(intent)
            .min_similarity(EXPLOIT_MIN_SIMILARITY)
            .limit(EXPLOIT_QUERY_LIMIT);

        let experiences = match self.store.query(&filters).await {
            Ok(experiences) => experiences,
            Err(e) => {
                self.note_store_failure("recommend_tool", &e);
                return self.fallback(intent, FallbackReason::StoreUnavailable(e.to_string()));
            }
        };

        if experiences.is_empty() {
            return self.fallback(intent, FallbackReason::NoData);
        }

        let ranked = stats::rank(&experiences, self.config.min_sample_size);
        let Some(best) = ranked.first() else {
            return self.fallback(intent, FallbackReason::InsufficientSamples);
        };

        if best.score < self.config.min_confidence {
            return self.fallback(
                intent,
                FallbackReason::LowConfidence {
                    tool: best.stats.tool.clone(),
                    score: best.score,
                },
            );
        }

        Ok(learned(best, &ranked[1..], intent))
    }

    /// Static intent heuristic
    fn fallback(&self, intent: &str, reason: FallbackReason) -> Result<ToolRecommendation> {
        let tools = self.catalog.list_all();
        let tool = fallback::resolve(&tools, intent, &self.config.fallback_rules)
            .ok_or(LearningError::NoToolAvailable)?;

        Ok(ToolRecommendation {
            tool_name: tool.name.clone(),
            confidence: FALLBACK_CONFIDENCE,
            reasoning: format!(
                "Using default tool '{}' for intent '{}': {}",
                tool.name,
                intent,
                reason.describe()
            ),
            success_rate: 0.0,
            sample_size: 0,
            avg_latency_ms: 0.0,
            alternatives: Vec::new(),
            exploration: false,
            strategy: DecisionStrategy::Fallback,
        })
    }

    fn note_store_failure(&self, operation: &str, error: &LearningError) {
        warn!(operation, error = %error, "experience query failed, degrading");
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(TelemetryEvent::StoreQueryFailed {
                operation: operation.to_string(),
                error: error.to_string(),
                timestamp: Instant::now(),
            });
        }
    }
}

fn learned(best: &ScoredTool, runners_up: &[ScoredTool], intent: &str) -> ToolRecommendation {
    let stats = &best.stats;
    let success_rate = stats.success_rate();
    let avg_latency_ms = stats.avg_latency_ms();

    ToolRecommendation {
        tool_name: stats.tool.clone(),
        confidence: clamp_unit(best.score),
        reasoning: format!(
            "'{}' succeeded {} of {} times ({:.0}%) on similar '{}' requests, averaging {:.0}ms",
            stats.tool,
            stats.successes,
            stats.total_calls,
            success_rate * 100.0,
            intent,
            avg_latency_ms
        ),
        success_rate,
        sample_size: stats.total_calls,
        avg_latency_ms,
        alternatives: runners_up
            .iter()
            .take(MAX_ALTERNATIVES)
            .map(|s| s.stats.tool.clone())
            .collect(),
        exploration: false,
        strategy: DecisionStrategy::Learned,
    }
}
