//! Telemetry for the learning engine
//!
//! Collects decision events from the store, selector and analyzer so callers
//! can see how often recommendations are learned versus guessed, and how
//! often the store had to be routed around.

use crate::selector::DecisionStrategy;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Events retained for inspection; older ones survive only in the stats
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Log events
    ExperienceRecorded {
        id: String,
        success: bool,
        timestamp: Instant,
    },
    StoreQueryFailed {
        operation: String,
        error: String,
        timestamp: Instant,
    },

    // Selector events
    RecommendationIssued {
        tool: String,
        strategy: DecisionStrategy,
        confidence: f64,
        timestamp: Instant,
    },

    // Analyzer events
    PatternMinted {
        pattern_id: String,
        label: String,
        cluster_size: usize,
        timestamp: Instant,
    },
    PatternUpdated {
        pattern_id: String,
        occurrences: usize,
        timestamp: Instant,
    },
    PatternEvicted {
        pattern_id: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub experiences_recorded: usize,
    pub failures_recorded: usize,
    pub store_failures: usize,
    pub recommendations: usize,
    pub learned: usize,
    pub explored: usize,
    pub fallbacks: usize,
    pub patterns_minted: usize,
    pub patterns_updated: usize,
    pub patterns_evicted: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    capacity: usize,
    start_time: Instant,
}

/// Lock ignoring poisoning; telemetry must never take the engine down
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a collector keeping at most `capacity` recent events
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            capacity,
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        // Update stats
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::ExperienceRecorded { success, .. } => {
                    stats.experiences_recorded += 1;
                    if !*success {
                        stats.failures_recorded += 1;
                    }
                }
                TelemetryEvent::StoreQueryFailed { .. } => {
                    stats.store_failures += 1;
                }
                TelemetryEvent::RecommendationIssued { strategy, .. } => {
                    stats.recommendations += 1;
                    match strategy {
                        DecisionStrategy::Learned => stats.learned += 1,
                        DecisionStrategy::Exploration => stats.explored += 1,
                        DecisionStrategy::Fallback => stats.fallbacks += 1,
                    }
                }
                TelemetryEvent::PatternMinted { .. } => {
                    stats.patterns_minted += 1;
                }
                TelemetryEvent::PatternUpdated { .. } => {
                    stats.patterns_updated += 1;
                }
                TelemetryEvent::PatternEvicted { .. } => {
                    stats.patterns_evicted += 1;
                }
            }
        }

        // Store event, dropping the oldest past capacity
        let mut events = lock(&self.events);
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get count of retained events
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events.iter().skip(start).cloned().collect()
    }

    /// Share of recommendations backed by learned statistics
    pub fn learned_ratio(&self) -> f64 {
        let stats = lock(&self.stats);
        if stats.recommendations == 0 {
            0.0
        } else {
            stats.learned as f64 / stats.recommendations as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain-text summary of collected telemetry
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector) -> Self {
        Self { collector }
    }

    /// Render summary statistics
    pub fn render_summary(&self) -> String {
        let stats = self.collector.get_stats();
        let mut out = String::new();

        out.push_str("Learning Summary\n");
        out.push_str("─────────────────────────────────────\n");
        out.push_str(&format!("Duration:          {:?}\n", self.collector.elapsed()));
        out.push_str(&format!("Experiences:       {}\n", stats.experiences_recorded));
        out.push_str(&format!(
            "Recommendations:   {} (learned {}, explored {}, fallback {})\n",
            stats.recommendations, stats.learned, stats.explored, stats.fallbacks
        ));
        out.push_str(&format!(
            "Learned ratio:     {:.1}%\n",
            self.collector.learned_ratio() * 100.0
        ));
        out.push_str(&format!("Store failures:    {}\n", stats.store_failures));
        out.push_str(&format!(
            "Patterns:          {} minted, {} updated, {} evicted\n",
            stats.patterns_minted, stats.patterns_updated, stats.patterns_evicted
        ));
        out
    }
}
