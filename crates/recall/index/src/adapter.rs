use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use recall_types::{Deadline, MemoryEntry, MemoryId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::embedder::Embedder;
use crate::engine::{EngineHit, MetadataFilter, VectorEngine, VectorRecord};
use crate::error::{IndexError, IndexResult};

/// Index adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Pause before the single retry of a transient collaborator failure.
    pub retry_backoff_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ms: 50,
        }
    }
}

/// Write/query front for the semantic index.
///
/// Owns the policy around its two collaborators: deadline-bounded calls, one
/// retry after a short backoff for transient failures, and soft deletion via
/// metadata only. Upserts are idempotent, so replaying a write is always
/// safe.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    engine: Arc<dyn VectorEngine>,
    config: IndexConfig,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>, engine: Arc<dyn VectorEngine>) -> Self {
        Self::with_config(embedder, engine, IndexConfig::default())
    }

    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        engine: Arc<dyn VectorEngine>,
        config: IndexConfig,
    ) -> Self {
        Self {
            embedder,
            engine,
            config,
        }
    }

    /// Index one entry; replaces any previous record with the same id.
    pub async fn upsert(&self, entry: &MemoryEntry, deadline: &Deadline) -> IndexResult<()> {
        let text = embedding_text(entry);
        let vector = self
            .with_retry("embed", deadline, || self.embedder.embed(&text))
            .await?;
        if vector.len() != self.embedder.dimension() {
            return Err(IndexError::Dimension {
                expected: self.embedder.dimension(),
                got: vector.len(),
            });
        }

        let record = VectorRecord {
            id: entry.id,
            embedding: vector,
            document: text,
            metadata: metadata_for(entry),
        };
        self.with_retry("upsert", deadline, || self.engine.upsert(record.clone()))
            .await?;
        debug!(id = %entry.id, project = %entry.project, "indexed memory");
        Ok(())
    }

    /// Similarity search: scores descending, engine tie order preserved.
    pub async fn query(
        &self,
        text: &str,
        filter: &MetadataFilter,
        top_k: usize,
        deadline: &Deadline,
    ) -> IndexResult<Vec<EngineHit>> {
        let vector = self
            .with_retry("embed", deadline, || self.embedder.embed(text))
            .await?;
        self.with_retry("query", deadline, || {
            self.engine.query(&vector, filter, top_k)
        })
        .await
    }

    /// Flip the outdated flag on the engine side. The record is never
    /// removed. An id the engine does not know is left for reconciliation.
    pub async fn mark_outdated(
        &self,
        id: MemoryId,
        outdated: bool,
        deadline: &Deadline,
    ) -> IndexResult<()> {
        let found = self
            .with_retry("update_metadata", deadline, || {
                self.engine.update_metadata(id, json!({ "outdated": outdated }))
            })
            .await?;
        if found {
            debug!(id = %id, outdated, "updated index metadata");
        } else {
            debug!(id = %id, "id not indexed yet; reconciliation will repair it");
        }
        Ok(())
    }

    /// Existence probe used by reconciliation.
    pub async fn is_indexed(&self, id: MemoryId, deadline: &Deadline) -> IndexResult<bool> {
        self.with_retry("has", deadline, || self.engine.has(id))
            .await
    }

    /// Run one collaborator call under the deadline; retry exactly once on a
    /// transient failure.
    async fn with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        deadline: &Deadline,
        mut call: F,
    ) -> IndexResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = IndexResult<T>>,
    {
        if deadline.expired() {
            return Err(IndexError::Timeout(op));
        }

        let first = match tokio::time::timeout(deadline.remaining(), call()).await {
            Err(_) => return Err(IndexError::Timeout(op)),
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
        };

        if !first.is_transient() || deadline.expired() {
            return Err(first);
        }

        warn!(op, error = %first, "transient index failure; retrying once");
        let backoff = Duration::from_millis(self.config.retry_backoff_ms).min(deadline.remaining());
        tokio::time::sleep(backoff).await;

        match tokio::time::timeout(deadline.remaining(), call()).await {
            Err(_) => Err(IndexError::Timeout(op)),
            Ok(result) => result,
        }
    }
}

/// Text handed to the embedder: content enriched with tags and category so
/// their vocabulary influences similarity.
pub(crate) fn embedding_text(entry: &MemoryEntry) -> String {
    let mut text = entry.content.clone();
    for tag in &entry.tags {
        text.push(' ');
        text.push_str(tag);
    }
    text.push(' ');
    text.push_str(entry.category.as_str());
    text
}

/// Metadata mirrored into the engine for filtering and inspection.
pub(crate) fn metadata_for(entry: &MemoryEntry) -> Value {
    json!({
        "project": entry.project,
        "category": entry.category.as_str(),
        "tags": entry.tags.join(","),
        "created_at": entry.created_at.to_rfc3339(),
        "outdated": entry.outdated,
    })
}
