//! Similarity functions for failure clustering
//!
//! Weights here are tunable; the properties that matter are that identical
//! clusters and near-duplicate text score close to 1.0 while unrelated input
//! scores close to 0.0.

use crate::experience::Experience;
use crate::patterns::types::ErrorPattern;
use crate::text::trigram_similarity;
use std::collections::HashMap;

/// Weight of query closeness in a pattern match
pub const QUERY_WEIGHT: f64 = 0.5;

/// Weight of error-message overlap in a pattern match
pub const MESSAGE_WEIGHT: f64 = 0.5;

/// Key with the highest count; ties go to the lexicographically smallest key.
/// Empty input yields an empty string.
pub fn most_common(counts: &HashMap<String, usize>) -> String {
    counts
        .iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
        .map(|(k, _)| k.clone())
        .unwrap_or_default()
}

/// Up to `n` keys by descending count, ties by key
pub fn top_n(counts: &HashMap<String, usize>, n: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
    entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

/// Count experiences by a string key
pub fn count_by<F>(experiences: &[Experience], key: F) -> HashMap<String, usize>
where
    F: Fn(&Experience) -> &str,
{
    let mut counts = HashMap::new();
    for exp in experiences {
        *counts.entry(key(exp).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Mean share of members agreeing with the dominant error type and tool
pub fn agreement(
    error_type_counts: &HashMap<String, usize>,
    tool_counts: &HashMap<String, usize>,
    total: usize,
) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let dominant_type = error_type_counts.values().copied().max().unwrap_or(0);
    let dominant_tool = tool_counts.values().copied().max().unwrap_or(0);

    let type_share = dominant_type as f64 / total as f64;
    let tool_share = dominant_tool as f64 / total as f64;
    ((type_share + tool_share) / 2.0).clamp(0.0, 1.0)
}

/// Cohesion of a failure cluster.
///
/// 1.0 for a single member; otherwise the agreement of error types and tools.
/// A cluster split across n distinct types and tools bottoms out at 1/n.
pub fn calculate_cluster_similarity(experiences: &[Experience]) -> f64 {
    match experiences.len() {
        0 => 0.0,
        1 => 1.0,
        total => agreement(
            &count_by(experiences, |e| e.error_kind()),
            &count_by(experiences, |e| e.tool_name()),
            total,
        ),
    }
}

/// How well a failure matches a known pattern (0.0-1.0).
///
/// Query closeness is taken against the closest member query, so a repeat
/// of any clustered failure scores as well as a repeat of the representative.
pub fn score_pattern_match(pattern: &ErrorPattern, query: &str, error_message: &str) -> f64 {
    let query_score = pattern
        .known_queries()
        .map(|known| trigram_similarity(query, known))
        .fold(0.0, f64::max);

    if error_message.trim().is_empty() || pattern.error_messages.is_empty() {
        return query_score;
    }

    let message_score = pattern
        .error_messages
        .iter()
        .map(|known| trigram_similarity(error_message, known))
        .fold(0.0, f64::max);

    QUERY_WEIGHT * query_score + MESSAGE_WEIGHT * message_score
}

/// Textual closeness of two failures, used to group buffered failures
pub fn failure_similarity(a: &Experience, b: &Experience) -> f64 {
    let query_score = trigram_similarity(&a.query, &b.query);
    if a.error_message().is_empty() && b.error_message().is_empty() {
        return query_score;
    }
    QUERY_WEIGHT * query_score + MESSAGE_WEIGHT * trigram_similarity(a.error_message(), b.error_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(query: &str, tool: &str, error_type: &str, message: &str) -> Experience {
        Experience::new(query).with_tool(tool).failed(error_type, message)
    }

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_most_common() {
        assert_eq!(most_common(&counts(&[("a", 1), ("b", 3), ("c", 2)])), "b");
        assert_eq!(most_common(&counts(&[("z", 2), ("y", 2)])), "y");
        assert_eq!(most_common(&HashMap::new()), "");
    }

    #[test]
    fn test_top_n() {
        let c = counts(&[("a", 1), ("b", 3), ("c", 2)]);
        assert_eq!(top_n(&c, 2), vec!["b", "c"]);
        assert_eq!(top_n(&c, 10), vec!["b", "c", "a"]);
        assert!(top_n(&c, 0).is_empty());
    }

    #[test]
    fn test_single_member_cluster_is_one() {
        let cluster = vec![failure("q", "calc", "math_error", "m")];
        assert_eq!(calculate_cluster_similarity(&cluster), 1.0);
        assert_eq!(calculate_cluster_similarity(&[]), 0.0);
    }

    #[test]
    fn test_identical_cluster_near_one() {
        let cluster: Vec<_> = (0..4)
            .map(|i| failure(&format!("divide {} by 0", i), "calc", "math_error", "division by zero"))
            .collect();
        assert!((calculate_cluster_similarity(&cluster) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scattered_cluster_low_but_positive() {
        let cluster: Vec<_> = (0..5)
            .map(|i| failure("q", &format!("tool{}", i), &format!("type{}", i), "m"))
            .collect();
        let sim = calculate_cluster_similarity(&cluster);
        assert!(sim > 0.0);
        assert!((sim - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_cluster() {
        let cluster = vec![
            failure("q", "calc", "math_error", "m"),
            failure("q", "calc", "math_error", "m"),
            failure("q", "calc", "parse_error", "m"),
            failure("q", "other", "math_error", "m"),
        ];
        // types 3/4, tools 3/4
        assert!((calculate_cluster_similarity(&cluster) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_score_pattern_match_monotonic() {
        let members = vec![
            failure("divide 10 by 0", "calc", "math_error", "division by zero"),
            failure("divide 10 by 0", "calc", "math_error", "division by zero"),
        ];
        let pattern = ErrorPattern::from_cluster(&members);

        let exact = score_pattern_match(&pattern, "divide 10 by 0", "division by zero");
        let near = score_pattern_match(&pattern, "divide 12 by 0", "division by zero");
        let unrelated = score_pattern_match(&pattern, "fetch weather in oslo", "connection refused");

        assert!((exact - 1.0).abs() < 1e-9);
        assert!(near < exact && near > 0.75);
        assert!(unrelated < 0.2);
    }

    #[test]
    fn test_score_uses_closest_member_query() {
        let members = vec![
            failure("divide 10 by 0", "calc", "math_error", "division by zero"),
            failure("compute 7 / 0", "calc", "math_error", "division by zero"),
            failure("what is 5 divided by zero", "calc", "math_error", "division by zero"),
        ];
        let pattern = ErrorPattern::from_cluster(&members);

        for member in &members {
            let score = score_pattern_match(&pattern, &member.query, "division by zero");
            assert!((score - 1.0).abs() < 1e-9, "{} scored {}", member.query, score);
        }

        let near = score_pattern_match(&pattern, "what is 6 divided by zero", "division by zero");
        assert!(near > 0.75);
    }

    #[test]
    fn test_failure_similarity() {
        let a = failure("read config.toml", "file_read", "io_error", "file not found");
        let b = failure("read config.toml", "file_read", "io_error", "file not found");
        let c = failure("search rust news", "web_search", "net_error", "timeout");
        assert!((failure_similarity(&a, &b) - 1.0).abs() < 1e-9);
        assert!(failure_similarity(&a, &c) < 0.3);
    }
}
