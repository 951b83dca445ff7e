//! Vector engine contract and the in-memory reference implementation.
//!
//! The engine only ever sees derived data: id, vector, document text, and a
//! flat metadata object. Records are never removed; soft deletion is a
//! metadata update.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use recall_types::MemoryId;
use serde_json::Value;

use crate::error::{IndexError, IndexResult};

/// One indexed record.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: MemoryId,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: Value,
}

/// Query result: the record id and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineHit {
    pub id: MemoryId,
    pub score: f32,
}

/// Exact-match metadata constraints; every listed key must match.
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    equals: BTreeMap<String, Value>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }

    pub fn matches(&self, metadata: &Value) -> bool {
        self.equals
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected))
    }
}

/// Contract every backing vector engine implements.
#[async_trait]
pub trait VectorEngine: Send + Sync {
    /// Insert or replace the record with the same id.
    async fn upsert(&self, record: VectorRecord) -> IndexResult<()>;

    /// Top `top_k` records by similarity, best first. Ties keep whatever
    /// order the engine produced.
    async fn query(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> IndexResult<Vec<EngineHit>>;

    /// Merge the given keys into a record's metadata. Returns false when the
    /// id is not indexed.
    async fn update_metadata(&self, id: MemoryId, patch: Value) -> IndexResult<bool>;

    /// Whether the id is present in the engine.
    async fn has(&self, id: MemoryId) -> IndexResult<bool>;
}

/// In-memory vector engine.
///
/// Deterministic and test-friendly; production deployments point the same
/// trait at an external engine.
#[derive(Default)]
pub struct InMemoryVectorEngine {
    records: RwLock<HashMap<MemoryId, VectorRecord>>,
}

impl InMemoryVectorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorEngine for InMemoryVectorEngine {
    async fn upsert(&self, record: VectorRecord) -> IndexResult<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::engine_permanent("records lock poisoned"))?;
        guard.insert(record.id, record);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> IndexResult<Vec<EngineHit>> {
        if embedding.is_empty() {
            return Err(IndexError::engine_permanent(
                "query embedding must not be empty",
            ));
        }

        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::engine_permanent("records lock poisoned"))?;

        let mut hits = guard
            .values()
            .filter(|record| filter.matches(&record.metadata))
            .filter_map(|record| {
                cosine_similarity(embedding, &record.embedding).map(|score| EngineHit {
                    id: record.id,
                    score,
                })
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn update_metadata(&self, id: MemoryId, patch: Value) -> IndexResult<bool> {
        let mut guard = self
            .records
            .write()
            .map_err(|_| IndexError::engine_permanent("records lock poisoned"))?;
        let Some(record) = guard.get_mut(&id) else {
            return Ok(false);
        };
        match (&mut record.metadata, patch) {
            (Value::Object(existing), Value::Object(patch)) => {
                for (key, value) in patch {
                    existing.insert(key, value);
                }
            }
            (metadata, patch) => *metadata = patch,
        }
        Ok(true)
    }

    async fn has(&self, id: MemoryId) -> IndexResult<bool> {
        let guard = self
            .records
            .read()
            .map_err(|_| IndexError::engine_permanent("records lock poisoned"))?;
        Ok(guard.contains_key(&id))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
