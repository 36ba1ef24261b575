//! Semantic store seam and an in-process reference implementation
//!
//! The experience log never owns persistence or embeddings; it talks to a
//! [`SemanticStore`] that supplies both. [`InMemorySemanticStore`] ranks by
//! token cosine similarity and is meant for tests, demos and small logs.

use crate::errors::{LearningError, Result};
use crate::text::cosine_similarity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Record handed to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticRecord {
    pub id: String,
    /// Text the similarity search runs against
    pub text: String,
    /// Self-describing serialized payload
    pub payload: String,
    /// Indexable tags for cheap exact filtering
    pub tags: HashMap<String, JsonValue>,
}

/// Hit returned from a semantic search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticMatch {
    pub id: String,
    /// Similarity to the search text (0.0-1.0)
    pub score: f64,
    pub payload: String,
    pub tags: HashMap<String, JsonValue>,
}

/// Persistence plus similarity search.
///
/// Implementations must be safe for concurrent reads. Calls may block on
/// I/O; callers cancel by dropping the returned future.
#[async_trait]
pub trait SemanticStore: Send + Sync {
    /// Store a record
    async fn add(&self, record: SemanticRecord) -> Result<()>;

    /// Return up to `limit` records ranked by similarity to `text`
    async fn search_semantic(&self, text: &str, limit: usize) -> Result<Vec<SemanticMatch>>;
}

/// In-memory semantic store
#[derive(Debug, Default)]
pub struct InMemorySemanticStore {
    records: RwLock<Vec<SemanticRecord>>,
    unavailable: AtomicBool,
}

impl InMemorySemanticStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate an outage: every call fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LearningError::Store("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SemanticStore for InMemorySemanticStore {
    async fn add(&self, record: SemanticRecord) -> Result<()> {
        self.check_available()?;
        let mut records = self
            .records
            .write()
            .map_err(|_| LearningError::Store("record lock poisoned".to_string()))?;

        // Records are immutable once stored
        if records.iter().any(|r| r.id == record.id) {
            return Err(LearningError::Store(format!(
                "record '{}' already exists",
                record.id
            )));
        }
        records.push(record);
        Ok(())
    }

    async fn search_semantic(&self, text: &str, limit: usize) -> Result<Vec<SemanticMatch>> {
        self.check_available()?;
        let records = self
            .records
            .read()
            .map_err(|_| LearningError::Store("record lock poisoned".to_string()))?;

        let mut matches: Vec<SemanticMatch> = records
            .iter()
            .map(|record| SemanticMatch {
                id: record.id.clone(),
                score: cosine_similarity(text, &record.text),
                payload: record.payload.clone(),
                tags: record.tags.clone(),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }
}
