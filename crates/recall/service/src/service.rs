use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use recall_index::{Embedder, HashEmbedder, HttpEmbedder, InMemoryVectorEngine, VectorIndex};
use recall_store::{FileStore, MemoryStore};
use recall_types::{Deadline, MemoryEntry, MemoryId, NewMemory};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::ServiceResult;

/// Outcome of [`MemoryService::save`].
#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    /// Identity of the stored memory.
    pub id: MemoryId,
    /// File the memory was written to.
    pub path: PathBuf,
    /// False when the index write failed and the entry awaits reconciliation.
    pub indexed: bool,
    /// Caveat attached to degraded saves.
    pub advisory: Option<String>,
}

/// Snapshot of what the store holds.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub total_entries: usize,
    pub outdated_entries: usize,
    pub entries_by_project: BTreeMap<String, usize>,
    /// Entries whose index state is known to lag the store.
    pub pending_repairs: usize,
}

/// Facade that keeps the file store and the semantic index in step.
///
/// The store is the system of record: writes land there first and the index
/// follows. When an index write fails the operation still succeeds, the
/// receipt says so, and the id is queued for [`reconcile`](Self::reconcile).
pub struct MemoryService {
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) index: VectorIndex,
    pub(crate) config: ServiceConfig,
    pending: Mutex<HashSet<MemoryId>>,
}

impl MemoryService {
    /// Service over explicit collaborators.
    pub fn new(store: Arc<dyn MemoryStore>, index: VectorIndex, config: ServiceConfig) -> Self {
        Self {
            store,
            index,
            config,
            pending: Mutex::new(HashSet::new()),
        }
    }

    /// Self-contained service from config alone: file store plus in-memory
    /// engine, with the hash embedder unless `embedder.base_url` points at a
    /// remote endpoint.
    pub fn from_config(config: ServiceConfig) -> ServiceResult<Self> {
        let store = Arc::new(FileStore::new(config.store.clone()));
        let embedder: Arc<dyn Embedder> = if config.embedder.base_url.is_some() {
            Arc::new(HttpEmbedder::new(config.embedder.clone())?)
        } else {
            Arc::new(HashEmbedder::new(config.embedder.dimension))
        };
        let engine = Arc::new(InMemoryVectorEngine::new());
        let index = VectorIndex::with_config(embedder, engine, config.index.clone());
        Ok(Self::new(store, index, config))
    }

    /// Persist a new memory, then index it.
    ///
    /// A store failure aborts the call; nothing half-written survives. An
    /// index failure does not: the memory is durable, `indexed` is false on
    /// the receipt, and the id is queued for the next reconcile pass.
    pub async fn save(&self, input: NewMemory) -> ServiceResult<SaveReceipt> {
        let entry = MemoryEntry::new(input)?;
        let deadline = self.op_deadline();
        let saved = self.store.save(&entry, &deadline).await?;

        match self.index.upsert(&entry, &deadline).await {
            Ok(()) => {
                info!(id = %entry.id, project = %entry.project, "memory saved and indexed");
                Ok(SaveReceipt {
                    id: entry.id,
                    path: saved.path,
                    indexed: true,
                    advisory: None,
                })
            }
            Err(err) => {
                warn!(id = %entry.id, error = %err, "index write failed; memory saved unindexed");
                self.pending_lock().insert(entry.id);
                Ok(SaveReceipt {
                    id: entry.id,
                    path: saved.path,
                    indexed: false,
                    advisory: Some(
                        "saved to file storage; semantic search will miss this memory until \
                         reconciliation runs"
                            .to_string(),
                    ),
                })
            }
        }
    }

    /// Fetch one memory by id.
    pub async fn load(&self, id: MemoryId) -> ServiceResult<MemoryEntry> {
        let deadline = self.op_deadline();
        Ok(self.store.load(id, &deadline).await?)
    }

    /// Recent memories, newest first, optionally scoped to one project.
    pub async fn list(
        &self,
        project: Option<&str>,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<MemoryEntry>> {
        let limit = limit.unwrap_or(self.config.default_list_limit);
        let deadline = self.op_deadline();
        Ok(self.store.list(project, limit, &deadline).await?)
    }

    /// Flip the outdated flag: store first, index best-effort.
    ///
    /// The store always reflects the flip on success. If the index cannot be
    /// told, the id is queued and search stays correct anyway because hits
    /// are re-read from the store before they are returned.
    pub async fn update_status(&self, id: MemoryId, outdated: bool) -> ServiceResult<MemoryEntry> {
        let deadline = self.op_deadline();
        let entry = self.store.update_status(id, outdated, &deadline).await?;
        if let Err(err) = self.index.mark_outdated(id, outdated, &deadline).await {
            warn!(id = %id, error = %err, "index metadata update failed; queued for reconciliation");
            self.pending_lock().insert(id);
        }
        Ok(entry)
    }

    /// Bring the index back in step with the store.
    ///
    /// Re-upserts every stored entry the engine does not hold, plus every
    /// entry queued by an earlier degraded write (those may be present but
    /// stale). Returns the number of repaired entries. Idempotent: a second
    /// pass right after a successful one repairs nothing.
    pub async fn reconcile(&self) -> ServiceResult<usize> {
        let entries = self
            .store
            .list(None, usize::MAX, &self.op_deadline())
            .await?;
        let queued: HashSet<MemoryId> = self.pending_lock().clone();

        let mut repaired = 0usize;
        for entry in entries {
            let deadline = self.op_deadline();
            let needs_repair = queued.contains(&entry.id)
                || !self.index.is_indexed(entry.id, &deadline).await?;
            if needs_repair {
                self.index.upsert(&entry, &deadline).await?;
                repaired += 1;
            }
            self.pending_lock().remove(&entry.id);
        }

        info!(repaired, "reconcile complete");
        Ok(repaired)
    }

    /// Storage-level totals plus the pending repair count.
    pub async fn stats(&self) -> ServiceResult<ServiceStats> {
        let entries = self
            .store
            .list(None, usize::MAX, &self.op_deadline())
            .await?;

        let mut entries_by_project: BTreeMap<String, usize> = BTreeMap::new();
        let mut outdated_entries = 0usize;
        for entry in &entries {
            *entries_by_project.entry(entry.project.clone()).or_insert(0) += 1;
            if entry.outdated {
                outdated_entries += 1;
            }
        }

        Ok(ServiceStats {
            total_entries: entries.len(),
            outdated_entries,
            entries_by_project,
            pending_repairs: self.pending_lock().len(),
        })
    }

    /// Ids currently queued for reconciliation.
    pub fn pending_repairs(&self) -> usize {
        self.pending_lock().len()
    }

    pub(crate) fn op_deadline(&self) -> Deadline {
        Deadline::after(self.config.op_budget())
    }

    /// The pending set is plain bookkeeping; a poisoned lock still holds a
    /// coherent set, so recover the guard instead of propagating the panic.
    fn pending_lock(&self) -> MutexGuard<'_, HashSet<MemoryId>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
