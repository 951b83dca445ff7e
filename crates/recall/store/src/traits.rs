use std::path::PathBuf;

use async_trait::async_trait;
use recall_types::{Deadline, MemoryEntry, MemoryId};

use crate::error::StoreResult;

/// Receipt for a persisted memory: the minted id and where the file landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMemory {
    pub id: MemoryId,
    pub path: PathBuf,
}

/// Storage interface for the memory system of record.
///
/// All operations take a deadline; expiry yields a retryable timeout error
/// instead of blocking indefinitely.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a validated entry. Readers never observe a partial file, and
    /// an existing file is never overwritten by a save.
    async fn save(&self, entry: &MemoryEntry, deadline: &Deadline) -> StoreResult<SavedMemory>;

    /// Fetch one entry by id.
    async fn load(&self, id: MemoryId, deadline: &Deadline) -> StoreResult<MemoryEntry>;

    /// List entries newest-first, optionally scoped to one project.
    async fn list(
        &self,
        project: Option<&str>,
        limit: usize,
        deadline: &Deadline,
    ) -> StoreResult<Vec<MemoryEntry>>;

    /// Flip the outdated flag in place; no other field changes.
    async fn update_status(
        &self,
        id: MemoryId,
        outdated: bool,
        deadline: &Deadline,
    ) -> StoreResult<MemoryEntry>;
}
