//! Lightweight text similarity helpers
//!
//! Used by the in-memory semantic store and by error pattern matching.
//! Neither is a substitute for real embeddings; they only need to rank
//! near-duplicate text above unrelated text.

use std::collections::{HashMap, HashSet};

/// Split text into lowercase alphanumeric tokens, dropping stopwords
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| !word.is_empty())
        .filter(|word| !is_stopword(word))
        .map(|s| s.to_string())
        .collect()
}

/// Check if word is a stopword
fn is_stopword(word: &str) -> bool {
    matches!(
        word,
        "a" | "an" | "the" | "of" | "to" | "in" | "on" | "for" | "and" | "or" | "is" | "this"
            | "that" | "with" | "from" | "please"
    )
}

/// Cosine similarity between term-frequency vectors of two texts (0.0-1.0)
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let ta = term_frequencies(a);
    let tb = term_frequencies(b);

    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let dot: f64 = ta
        .iter()
        .filter_map(|(term, &ca)| tb.get(term).map(|&cb| ca * cb))
        .sum();
    let norm_a = ta.values().map(|c| c * c).sum::<f64>().sqrt();
    let norm_b = tb.values().map(|c| c * c).sum::<f64>().sqrt();

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

/// Dice coefficient over character trigrams (0.0-1.0).
///
/// Two empty strings are identical; one empty string matches nothing.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);

    if na.is_empty() && nb.is_empty() {
        return 1.0;
    }
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }

    let ga = trigrams(&na);
    let gb = trigrams(&nb);
    let shared = ga.intersection(&gb).count();

    (2.0 * shared as f64) / (ga.len() + gb.len()) as f64
}

/// Lowercase and collapse whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn trigrams(text: &str) -> HashSet<String> {
    let padded: Vec<char> = format!("  {} ", text).chars().collect();
    padded
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}
