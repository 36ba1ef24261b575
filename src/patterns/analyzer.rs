//! Error Pattern Analyzer: clusters recurring failures into named patterns
//!
//! Readers match against an immutable snapshot of the pattern list. All
//! mutation (minting, folding, eviction) runs under a single writer lock and
//! publishes a fresh snapshot when done, so matching never waits on
//! clustering work.

use crate::experience::{Experience, ExperienceFilters, ExperienceStore};
use crate::patterns::similarity::{
    calculate_cluster_similarity, failure_similarity, score_pattern_match,
};
use crate::patterns::types::{AnalyzerConfig, ErrorPattern};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Failure ids remembered to avoid ingesting the same experience twice
const SEEN_CAPACITY: usize = 10_000;

/// Default number of failures pulled per store scan
const DEFAULT_LEARN_LIMIT: usize = 50;

/// Result of ingesting one experience
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// Success, or an experience already ingested
    Ignored,
    /// Held until enough similar failures arrive
    Buffered,
    /// A new pattern was minted
    Minted(ErrorPattern),
    /// An existing pattern absorbed the failure
    Updated(ErrorPattern),
}

/// State owned by the single writer
#[derive(Default)]
struct WriterState {
    pending: VecDeque<Experience>,
    seen: HashSet<String>,
    seen_order: VecDeque<String>,
}

impl WriterState {
    /// Remember an id; false if it was already seen
    fn mark_seen(&mut self, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        self.seen_order.push_back(id.to_string());
        while self.seen_order.len() > SEEN_CAPACITY {
            if let Some(old) = self.seen_order.pop_front() {
                self.seen.remove(&old);
            }
        }
        true
    }
}

/// Error pattern analyzer
pub struct ErrorPatternAnalyzer {
    config: AnalyzerConfig,
    snapshot: RwLock<Arc<Vec<ErrorPattern>>>,
    writer: Mutex<WriterState>,
    store: Option<Arc<ExperienceStore>>,
    telemetry: Option<TelemetryCollector>,
}

impl ErrorPatternAnalyzer {
    /// Create analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create analyzer with custom configuration
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config: config.normalized(),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(WriterState::default()),
            store: None,
            telemetry: None,
        }
    }

    /// Attach the experience log used by [`learn_from_store`](Self::learn_from_store)
    pub fn with_store(mut self, store: Arc<ExperienceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Consistent view of every retained pattern
    pub fn snapshot(&self) -> Arc<Vec<ErrorPattern>> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn publish(&self, patterns: Vec<ErrorPattern>) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(patterns);
    }

    fn writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Patterns confident enough to surface to callers
    pub fn patterns(&self) -> Vec<ErrorPattern> {
        self.snapshot()
            .iter()
            .filter(|p| p.confidence >= self.config.min_confidence)
            .cloned()
            .collect()
    }

    /// Every retained pattern regardless of confidence
    pub fn all_patterns(&self) -> Vec<ErrorPattern> {
        self.snapshot().as_ref().clone()
    }

    /// Failures waiting to form a cluster
    pub fn pending_count(&self) -> usize {
        self.writer().pending.len()
    }

    /// Best surfaced pattern for a failure, if it clears the threshold
    pub fn find_best_matching_pattern(
        &self,
        query: &str,
        error_message: &str,
    ) -> Option<ErrorPattern> {
        let snapshot = self.snapshot();
        best_match(&snapshot, query, error_message, self.config.similarity_threshold)
            .filter(|(index, _)| snapshot[*index].confidence >= self.config.min_confidence)
            .map(|(index, _)| snapshot[index].clone())
    }

    /// Ingest one experience; successes are ignored
    pub fn ingest(&self, experience: &Experience) -> IngestOutcome {
        if experience.success {
            return IngestOutcome::Ignored;
        }

        let mut state = self.writer();
        if !state.mark_seen(&experience.id) {
            return IngestOutcome::Ignored;
        }

        // Fold into an existing pattern when one matches
        let current = self.snapshot();
        if let Some((index, score)) = best_match(
            &current,
            &experience.query,
            experience.error_message(),
            self.config.similarity_threshold,
        ) {
            debug!(score, "failure matches existing pattern");
            let updated = self.fold_into(&current, index, std::slice::from_ref(experience));
            return IngestOutcome::Updated(updated);
        }

        // Otherwise look for a cluster among buffered failures
        let related: Vec<usize> = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| self.related(experience, p))
            .map(|(i, _)| i)
            .collect();

        if related.len() + 1 >= self.config.min_cluster_size {
            let mut cluster: Vec<Experience> =
                related.iter().map(|&i| state.pending[i].clone()).collect();
            cluster.push(experience.clone());

            let similarity = calculate_cluster_similarity(&cluster);
            if similarity > self.config.similarity_threshold {
                for &i in related.iter().rev() {
                    state.pending.remove(i);
                }
                // Same error type and tool as a known pattern: grow it instead
                let candidate = ErrorPattern::from_cluster(&cluster);
                if let Some(index) = same_category_index(&current, &candidate) {
                    let updated = self.fold_into(&current, index, &cluster);
                    return IngestOutcome::Updated(updated);
                }
                let minted = self.mint(&current, candidate, cluster.len());
                return IngestOutcome::Minted(minted);
            }
        }

        state.pending.push_back(experience.clone());
        while state.pending.len() > self.config.max_pending {
            state.pending.pop_front();
        }
        IngestOutcome::Buffered
    }

    /// Ingest many experiences in order
    pub fn ingest_batch(&self, experiences: &[Experience]) -> Vec<IngestOutcome> {
        experiences.iter().map(|e| self.ingest(e)).collect()
    }

    /// Pull failed experiences resembling `query` from the log and ingest them.
    ///
    /// Returns the number of failures ingested. Without a store, or when the
    /// store query fails, nothing is learned.
    pub async fn learn_from_store(&self, query: &str, limit: usize) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        let limit = if limit == 0 { DEFAULT_LEARN_LIMIT } else { limit };
        let filters = ExperienceFilters::new(query).success(false).limit(limit);

        let failures = match store.query(&filters).await {
            Ok(failures) => failures,
            Err(e) => {
                warn!(error = %e, "failure scan skipped, store query failed");
                self.emit(TelemetryEvent::StoreQueryFailed {
                    operation: "learn_from_store".to_string(),
                    error: e.to_string(),
                    timestamp: Instant::now(),
                });
                return 0;
            }
        };

        self.ingest_batch(&failures)
            .iter()
            .filter(|o| !matches!(o, IngestOutcome::Ignored))
            .count()
    }

    /// Match a failure, learning from the log once on a miss.
    ///
    /// "Nothing found" and "could not search" are indistinguishable here.
    pub async fn diagnose(&self, query: &str, error_message: &str) -> Option<ErrorPattern> {
        if let Some(pattern) = self.find_best_matching_pattern(query, error_message) {
            return Some(pattern);
        }
        if self.learn_from_store(query, DEFAULT_LEARN_LIMIT).await == 0 {
            return None;
        }
        self.find_best_matching_pattern(query, error_message)
    }

    /// Whether a buffered failure belongs with a new one
    fn related(&self, a: &Experience, b: &Experience) -> bool {
        let same_category = !a.error_kind().is_empty()
            && a.error_kind() == b.error_kind()
            && a.tool_name() == b.tool_name();
        same_category || failure_similarity(a, b) >= self.config.similarity_threshold
    }

    /// Fold failures into the pattern at `index` and publish the result
    fn fold_into(
        &self,
        current: &[ErrorPattern],
        index: usize,
        failures: &[Experience],
    ) -> ErrorPattern {
        let mut patterns = current.to_vec();
        let pattern = &mut patterns[index];
        let mut new_messages = 0;
        for failure in failures {
            if pattern.absorb(failure) {
                new_messages += 1;
            }
        }
        let updated = pattern.clone();
        self.publish(patterns);

        debug!(
            pattern = %updated.id,
            folded = failures.len(),
            new_messages,
            confidence = updated.confidence,
            "failures folded into pattern"
        );
        self.emit(TelemetryEvent::PatternUpdated {
            pattern_id: updated.id.clone(),
            occurrences: updated.occurrences,
            timestamp: Instant::now(),
        });
        updated
    }

    /// Publish a new pattern, evicting the weakest beyond the cap
    fn mint(&self, current: &[ErrorPattern], pattern: ErrorPattern, size: usize) -> ErrorPattern {
        let mut patterns = current.to_vec();
        patterns.push(pattern.clone());

        info!(
            pattern = %pattern.id,
            label = %pattern.label,
            size,
            confidence = pattern.confidence,
            "error pattern minted"
        );
        self.emit(TelemetryEvent::PatternMinted {
            pattern_id: pattern.id.clone(),
            label: pattern.label.clone(),
            cluster_size: size,
            timestamp: Instant::now(),
        });

        while patterns.len() > self.config.max_patterns {
            let Some(weakest) = weakest_index(&patterns) else {
                break;
            };
            let evicted = patterns.remove(weakest);
            debug!(pattern = %evicted.id, confidence = evicted.confidence, "error pattern evicted");
            self.emit(TelemetryEvent::PatternEvicted {
                pattern_id: evicted.id,
                timestamp: Instant::now(),
            });
        }

        self.publish(patterns);
        pattern
    }

    fn emit(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }
}

impl Default for ErrorPatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Index and score of the best pattern scoring at least `threshold`
fn best_match(
    patterns: &[ErrorPattern],
    query: &str,
    error_message: &str,
    threshold: f64,
) -> Option<(usize, f64)> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (i, score_pattern_match(p, query, error_message)))
        .filter(|(_, score)| *score >= threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

/// Pattern sharing the candidate's error type and dominant tool
fn same_category_index(patterns: &[ErrorPattern], candidate: &ErrorPattern) -> Option<usize> {
    if candidate.error_type.is_empty() {
        return None;
    }
    patterns.iter().position(|p| {
        p.error_type == candidate.error_type && p.tool_name == candidate.tool_name
    })
}

/// Lowest confidence, oldest last-seen on ties
fn weakest_index(patterns: &[ErrorPattern]) -> Option<usize> {
    patterns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.last_seen.cmp(&b.last_seen))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::InMemorySemanticStore;

    fn failure(query: &str, tool: &str, error_type: &str, message: &str) -> Experience {
        Experience::new(query).with_tool(tool).failed(error_type, message)
    }

    fn division_failure() -> Experience {
        failure("divide 10 by 0", "calc", "math_error", "division by zero")
    }

    #[test]
    fn test_successes_ignored() {
        let analyzer = ErrorPatternAnalyzer::new();
        let outcome = analyzer.ingest(&Experience::new("compute 2+2"));
        assert!(matches!(outcome, IngestOutcome::Ignored));
        assert_eq!(analyzer.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_ids_ignored() {
        let analyzer = ErrorPatternAnalyzer::new();
        let exp = division_failure();
        assert!(matches!(analyzer.ingest(&exp), IngestOutcome::Buffered));
        assert!(matches!(analyzer.ingest(&exp), IngestOutcome::Ignored));
        assert_eq!(analyzer.pending_count(), 1);
    }

    #[test]
    fn test_cluster_minted_at_min_size() {
        let analyzer = ErrorPatternAnalyzer::new();

        assert!(matches!(analyzer.ingest(&division_failure()), IngestOutcome::Buffered));
        assert!(matches!(analyzer.ingest(&division_failure()), IngestOutcome::Buffered));

        let IngestOutcome::Minted(pattern) = analyzer.ingest(&division_failure()) else {
            panic!("expected a pattern on the third failure");
        };
        assert_eq!(pattern.label, "math_error");
        assert_eq!(pattern.common_query, "divide 10 by 0");
        assert!(pattern.confidence > 0.5);
        assert_eq!(analyzer.pending_count(), 0);
        assert_eq!(analyzer.patterns().len(), 1);
    }

    #[test]
    fn test_near_repeat_matches_pattern() {
        let analyzer = ErrorPatternAnalyzer::new();
        analyzer.ingest_batch(&[division_failure(), division_failure(), division_failure()]);

        let found = analyzer.find_best_matching_pattern("divide 10 by 0", "division by zero");
        assert!(found.is_some());

        let pattern = found.unwrap();
        let score = score_pattern_match(&pattern, "divide 10 by 0", "division by zero");
        assert!(score >= analyzer.config().similarity_threshold);
    }

    #[test]
    fn test_unrelated_failure_has_no_match() {
        let analyzer = ErrorPatternAnalyzer::new();
        analyzer.ingest_batch(&[division_failure(), division_failure(), division_failure()]);

        assert!(analyzer
            .find_best_matching_pattern("fetch weather in oslo", "connection refused")
            .is_none());
    }

    #[test]
    fn test_matching_failure_folds_in() {
        let analyzer = ErrorPatternAnalyzer::new();
        let outcomes =
            analyzer.ingest_batch(&[division_failure(), division_failure(), division_failure()]);
        let IngestOutcome::Minted(minted) = &outcomes[2] else {
            panic!("expected mint");
        };

        let repeat = failure("divide 12 by 0", "calc", "math_error", "division by zero!");
        let IngestOutcome::Updated(updated) = analyzer.ingest(&repeat) else {
            panic!("expected fold-in");
        };

        assert_eq!(updated.id, minted.id);
        assert_eq!(updated.occurrences, 4);
        assert_eq!(updated.error_messages.len(), 2);
        assert_eq!(analyzer.all_patterns().len(), 1);
    }

    #[test]
    fn test_repeat_of_any_member_folds_in() {
        let analyzer = ErrorPatternAnalyzer::new();
        let queries = ["divide 10 by 0", "compute 7 / 0", "what is 5 divided by zero"];
        let outcomes = analyzer.ingest_batch(
            &queries
                .iter()
                .map(|q| failure(q, "calc", "math_error", "division by zero"))
                .collect::<Vec<_>>(),
        );
        let IngestOutcome::Minted(minted) = &outcomes[2] else {
            panic!("expected mint");
        };

        for query in queries {
            let found = analyzer.find_best_matching_pattern(query, "division by zero");
            assert_eq!(found.map(|p| p.id), Some(minted.id.clone()), "{}", query);
        }

        let repeat = failure("what is 6 divided by zero", "calc", "math_error", "division by zero");
        let IngestOutcome::Updated(updated) = analyzer.ingest(&repeat) else {
            panic!("expected fold-in");
        };
        assert_eq!(updated.id, minted.id);
        assert_eq!(analyzer.pending_count(), 0);
    }

    #[test]
    fn test_same_category_cluster_grows_existing_pattern() {
        let config = AnalyzerConfig {
            similarity_threshold: 0.95,
            ..AnalyzerConfig::default()
        };
        let analyzer = ErrorPatternAnalyzer::with_config(config);
        let outcomes =
            analyzer.ingest_batch(&[division_failure(), division_failure(), division_failure()]);
        let IngestOutcome::Minted(minted) = &outcomes[2] else {
            panic!("expected mint");
        };

        // Too far from the pattern text to match, but the same error type and tool
        let other = || failure("average of an empty list", "calc", "math_error", "no values given");
        let outcomes = analyzer.ingest_batch(&[other(), other(), other()]);
        let IngestOutcome::Updated(updated) = &outcomes[2] else {
            panic!("expected the cluster to fold into the existing pattern");
        };

        assert_eq!(updated.id, minted.id);
        assert_eq!(updated.occurrences, 6);
        assert_eq!(updated.error_messages.len(), 2);
        assert_eq!(analyzer.all_patterns().len(), 1);
        assert_eq!(analyzer.pending_count(), 0);
    }

    #[test]
    fn test_mixed_failures_stay_buffered() {
        let analyzer = ErrorPatternAnalyzer::new();
        analyzer.ingest(&failure("read a.txt", "file_read", "io_error", "file not found"));
        analyzer.ingest(&failure("search rust", "web_search", "net_error", "timeout"));
        analyzer.ingest(&failure("divide 1 by 0", "calc", "math_error", "division by zero"));

        assert!(analyzer.all_patterns().is_empty());
        assert_eq!(analyzer.pending_count(), 3);
    }

    #[test]
    fn test_pending_is_bounded() {
        let config = AnalyzerConfig {
            max_pending: 4,
            ..AnalyzerConfig::default()
        };
        let analyzer = ErrorPatternAnalyzer::with_config(config);
        for i in 0..10 {
            analyzer.ingest(&failure(
                &format!("unique query {}", i),
                &format!("tool{}", i),
                &format!("type{}", i),
                &format!("message {}", i * 7919),
            ));
        }
        assert_eq!(analyzer.pending_count(), 4);
    }

    #[test]
    fn test_eviction_drops_lowest_confidence() {
        let config = AnalyzerConfig {
            max_patterns: 1,
            min_cluster_size: 3,
            ..AnalyzerConfig::default()
        };
        let analyzer = ErrorPatternAnalyzer::with_config(config);
        let telemetry = TelemetryCollector::new();
        let analyzer = analyzer.with_telemetry(telemetry.clone());

        analyzer.ingest_batch(&[division_failure(), division_failure(), division_failure()]);
        let first = analyzer.all_patterns()[0].id.clone();

        let io = || failure("read config.toml", "file_read", "io_error", "file not found");
        analyzer.ingest_batch(&[io(), io(), io()]);

        let remaining = analyzer.all_patterns();
        assert_eq!(remaining.len(), 1);
        // Equal confidence: the older pattern goes
        assert_ne!(remaining[0].id, first);
        assert_eq!(telemetry.get_stats().patterns_evicted, 1);
        assert_eq!(telemetry.get_stats().patterns_minted, 2);
    }

    #[test]
    fn test_low_confidence_patterns_not_surfaced() {
        let config = AnalyzerConfig {
            min_confidence: 0.95,
            similarity_threshold: 0.5,
            ..AnalyzerConfig::default()
        };
        let analyzer = ErrorPatternAnalyzer::with_config(config);
        analyzer.ingest_batch(&[
            failure("divide 10 by 0", "calc", "math_error", "division by zero"),
            failure("divide 10 by 0", "calc", "math_error", "division by zero"),
            failure("divide 10 by 0", "calc2", "math_error", "division by zero"),
        ]);

        assert_eq!(analyzer.all_patterns().len(), 1);
        assert!(analyzer.patterns().is_empty());
        assert!(analyzer
            .find_best_matching_pattern("divide 10 by 0", "division by zero")
            .is_none());
    }

    #[tokio::test]
    async fn test_diagnose_learns_from_store() {
        let backend = Arc::new(InMemorySemanticStore::new());
        let store = Arc::new(ExperienceStore::new(backend));
        for _ in 0..3 {
            store.record(&division_failure()).await.unwrap();
        }
        store.record(&Experience::new("divide 10 by 2")).await.unwrap();

        let analyzer = ErrorPatternAnalyzer::new().with_store(store);
        let pattern = analyzer.diagnose("divide 10 by 0", "division by zero").await;
        assert!(pattern.is_some());
        assert_eq!(pattern.unwrap().occurrences, 3);

        // Already ingested: a second scan learns nothing new
        assert_eq!(analyzer.learn_from_store("divide 10 by 0", 10).await, 0);
    }

    #[tokio::test]
    async fn test_diagnose_with_store_down_is_none() {
        let backend = Arc::new(InMemorySemanticStore::new());
        let store = Arc::new(ExperienceStore::new(backend.clone()));
        backend.set_unavailable(true);

        let analyzer = ErrorPatternAnalyzer::new().with_store(store);
        assert!(analyzer.diagnose("divide 10 by 0", "division by zero").await.is_none());
    }
}
