//! Per-tool statistics and composite scoring
//!
//! Statistics are derived from experiences on demand and never persisted.

use crate::experience::Experience;
use std::collections::HashMap;

/// Weight of success rate in the composite score
pub const SUCCESS_WEIGHT: f64 = 0.7;

/// Weight of latency in the composite score
pub const LATENCY_WEIGHT: f64 = 0.3;

/// Latency treated as worst case; anything slower scores the same
pub const LATENCY_CEILING_MS: f64 = 5000.0;

/// Aggregated outcomes for one tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolStats {
    pub tool: String,
    pub total_calls: usize,
    pub successes: usize,
    pub failures: usize,
    pub latency_samples: Vec<u64>,
}

impl ToolStats {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Default::default()
        }
    }

    /// Fold one experience in
    pub fn observe(&mut self, experience: &Experience) {
        self.total_calls += 1;
        if experience.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.latency_samples.push(experience.latency_ms);
    }

    /// Calculate success rate
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_calls as f64
        }
    }

    /// Calculate average latency
    pub fn avg_latency_ms(&self) -> f64 {
        if self.latency_samples.is_empty() {
            0.0
        } else {
            self.latency_samples.iter().sum::<u64>() as f64 / self.latency_samples.len() as f64
        }
    }

    /// Composite score of this tool (0.0-1.0)
    pub fn score(&self) -> f64 {
        composite_score(self.success_rate(), self.avg_latency_ms())
    }
}

/// 1.0 at 0ms falling linearly to 0.0 at the ceiling
pub fn latency_score(avg_latency_ms: f64) -> f64 {
    (1.0 - avg_latency_ms / LATENCY_CEILING_MS).clamp(0.0, 1.0)
}

/// Weighted blend of success rate and latency (0.0-1.0)
pub fn composite_score(success_rate: f64, avg_latency_ms: f64) -> f64 {
    let score = success_rate * SUCCESS_WEIGHT + latency_score(avg_latency_ms) * LATENCY_WEIGHT;
    score.clamp(0.0, 1.0)
}

/// Group experiences by tool; experiences without a tool are skipped
pub fn aggregate(experiences: &[Experience]) -> HashMap<String, ToolStats> {
    let mut stats: HashMap<String, ToolStats> = HashMap::new();
    for exp in experiences {
        if let Some(tool) = &exp.tool_called {
            stats
                .entry(tool.clone())
                .or_insert_with(|| ToolStats::new(tool.clone()))
                .observe(exp);
        }
    }
    stats
}

/// Tool with its composite score
#[derive(Debug, Clone)]
pub struct ScoredTool {
    pub stats: ToolStats,
    pub score: f64,
}

/// Rank tools with at least `min_sample_size` observations, best first.
///
/// Ties are broken by tool name so ranking is deterministic.
pub fn rank(experiences: &[Experience], min_sample_size: usize) -> Vec<ScoredTool> {
    let mut ranked: Vec<ScoredTool> = aggregate(experiences)
        .into_values()
        .filter(|stats| stats.total_calls >= min_sample_size)
        .map(|stats| {
            let score = stats.score();
            ScoredTool { stats, score }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.stats.tool.cmp(&b.stats.tool))
    });

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn exp(tool: &str, success: bool, latency: u64) -> Experience {
        let e = Experience::new("q").with_tool(tool).with_latency(latency);
        if success {
            e
        } else {
            e.failed("tool_error", "failed")
        }
    }

    #[test]
    fn test_tool_stats_tracking() {
        let mut stats = ToolStats::new("math_calculate");
        stats.observe(&exp("math_calculate", true, 100));
        stats.observe(&exp("math_calculate", true, 200));
        stats.observe(&exp("math_calculate", false, 150));

        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.successes, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.avg_latency_ms(), 150.0);
        assert!((stats.success_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_stats() {
        let stats = ToolStats::new("x");
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.avg_latency_ms(), 0.0);
    }

    #[test]
    fn test_latency_score_bounds() {
        assert_eq!(latency_score(0.0), 1.0);
        assert_eq!(latency_score(2500.0), 0.5);
        assert_eq!(latency_score(5000.0), 0.0);
        assert_eq!(latency_score(12000.0), 0.0);
    }

    #[test]
    fn test_composite_score() {
        // 4/5 at 50ms
        let score = composite_score(0.8, 50.0);
        assert!((score - (0.56 + 0.3 * 0.99)).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_skips_toolless() {
        let experiences = vec![exp("a", true, 10), Experience::new("no tool"), exp("b", false, 5)];
        let stats = aggregate(&experiences);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["a"].successes, 1);
        assert_eq!(stats["b"].failures, 1);
    }

    #[test]
    fn test_rank_filters_small_samples() {
        let mut experiences = Vec::new();
        for _ in 0..3 {
            experiences.push(exp("steady", true, 100));
        }
        for _ in 0..2 {
            experiences.push(exp("rare", true, 1));
        }

        let ranked = rank(&experiences, 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].stats.tool, "steady");
    }

    #[test]
    fn test_rank_orders_by_score_then_name() {
        let mut experiences = Vec::new();
        for tool in ["b", "a", "c"] {
            for _ in 0..3 {
                experiences.push(exp(tool, tool != "c", 100));
            }
        }

        let names: Vec<String> = rank(&experiences, 3)
            .into_iter()
            .map(|s| s.stats.tool)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[quickcheck]
    fn prop_score_non_increasing_in_latency(rate: u8, a: u16, b: u16) -> bool {
        let success_rate = rate as f64 / u8::MAX as f64;
        let (fast, slow) = if a <= b { (a, b) } else { (b, a) };
        composite_score(success_rate, fast as f64) >= composite_score(success_rate, slow as f64)
    }

    #[quickcheck]
    fn prop_score_in_unit_interval(successes: u8, failures: u8, latency: u32) -> bool {
        let total = successes as f64 + failures as f64;
        let rate = if total == 0.0 { 0.0 } else { successes as f64 / total };
        let score = composite_score(rate, latency as f64);
        (0.0..=1.0).contains(&score)
    }
}
