use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use recall_types::{Deadline, MemoryEntry, MemoryId};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::document;
use crate::error::{StoreError, StoreResult};
use crate::naming;
use crate::traits::{MemoryStore, SavedMemory};

/// File store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory; one subdirectory per project.
    pub root_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./memory"),
        }
    }
}

/// Markdown-file memory store.
///
/// Writers serialize per project; readers go straight to disk and rely on
/// atomic renames to never observe a partial file. Files that fail to parse
/// are skipped with a warning during scans so one corrupt file cannot take
/// down unrelated reads.
pub struct FileStore {
    config: StoreConfig,
    project_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            project_locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    async fn project_lock(&self, project: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.project_locks.read().await;
            if let Some(lock) = locks.get(project) {
                return lock.clone();
            }
        }
        let mut locks = self.project_locks.write().await;
        locks.entry(project.to_string()).or_default().clone()
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.config.root_dir.join(project)
    }

    /// Project subdirectories currently on disk.
    fn project_dirs(&self) -> StoreResult<Vec<PathBuf>> {
        let root = &self.config.root_dir;
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut dirs = Vec::new();
        for dir_entry in std::fs::read_dir(root).map_err(|e| StoreError::io(root, e))? {
            let dir_entry = dir_entry.map_err(|e| StoreError::io(root, e))?;
            let path = dir_entry.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Parse every readable memory file in one project directory.
    fn read_project(&self, dir: &Path) -> StoreResult<Vec<(PathBuf, MemoryEntry)>> {
        let mut entries = Vec::new();
        if !dir.exists() {
            return Ok(entries);
        }
        for dir_entry in std::fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))? {
            let dir_entry = dir_entry.map_err(|e| StoreError::io(dir, e))?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            match document::parse(&path, &text) {
                Ok(entry) => entries.push((path, entry)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable memory file");
                }
            }
        }
        Ok(entries)
    }

    /// Scan for an entry by id across project directories.
    fn find_by_id(&self, id: MemoryId, deadline: &Deadline) -> StoreResult<(PathBuf, MemoryEntry)> {
        for dir in self.project_dirs()? {
            if deadline.expired() {
                return Err(StoreError::Timeout("scan"));
            }
            for (path, entry) in self.read_project(&dir)? {
                if entry.id == id {
                    return Ok((path, entry));
                }
            }
        }
        Err(StoreError::NotFound(id))
    }

    /// First free path for the entry's stem; never reuses an existing file.
    fn next_free_path(&self, dir: &Path, entry: &MemoryEntry) -> PathBuf {
        let stem = naming::file_stem(entry);
        let mut candidate = dir.join(format!("{stem}.md"));
        let mut n = 2;
        while candidate.exists() {
            candidate = dir.join(format!("{stem}-{n}.md"));
            n += 1;
        }
        candidate
    }

    /// Write via temp file + atomic rename: readers see old-or-new, never a
    /// partial document. Once the rename starts the write is not
    /// interruptible.
    fn write_document(&self, path: &Path, entry: &MemoryEntry) -> StoreResult<()> {
        let rendered = document::render(path, entry)?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, rendered).map_err(|e| StoreError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for FileStore {
    async fn save(&self, entry: &MemoryEntry, deadline: &Deadline) -> StoreResult<SavedMemory> {
        let lock = self.project_lock(&entry.project).await;
        let _guard = tokio::time::timeout(deadline.remaining(), lock.lock())
            .await
            .map_err(|_| StoreError::Timeout("save"))?;
        if deadline.expired() {
            return Err(StoreError::Timeout("save"));
        }

        let dir = self.project_dir(&entry.project);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let path = self.next_free_path(&dir, entry);
        self.write_document(&path, entry)?;

        debug!(id = %entry.id, path = %path.display(), "saved memory file");
        Ok(SavedMemory {
            id: entry.id,
            path,
        })
    }

    async fn load(&self, id: MemoryId, deadline: &Deadline) -> StoreResult<MemoryEntry> {
        if deadline.expired() {
            return Err(StoreError::Timeout("load"));
        }
        let (_, entry) = self.find_by_id(id, deadline)?;
        Ok(entry)
    }

    async fn list(
        &self,
        project: Option<&str>,
        limit: usize,
        deadline: &Deadline,
    ) -> StoreResult<Vec<MemoryEntry>> {
        if deadline.expired() {
            return Err(StoreError::Timeout("list"));
        }

        let dirs = match project {
            Some(project) => vec![self.project_dir(project)],
            None => self.project_dirs()?,
        };

        let mut entries = Vec::new();
        for dir in dirs {
            if deadline.expired() {
                return Err(StoreError::Timeout("list"));
            }
            for (_, entry) in self.read_project(&dir)? {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn update_status(
        &self,
        id: MemoryId,
        outdated: bool,
        deadline: &Deadline,
    ) -> StoreResult<MemoryEntry> {
        // Locate first to learn the project, then re-find under its lock so
        // a concurrent writer cannot slip in between.
        let (_, found) = self.find_by_id(id, deadline)?;

        let lock = self.project_lock(&found.project).await;
        let _guard = tokio::time::timeout(deadline.remaining(), lock.lock())
            .await
            .map_err(|_| StoreError::Timeout("update_status"))?;
        if deadline.expired() {
            return Err(StoreError::Timeout("update_status"));
        }

        let dir = self.project_dir(&found.project);
        let (path, mut entry) = self
            .read_project(&dir)?
            .into_iter()
            .find(|(_, e)| e.id == id)
            .ok_or(StoreError::NotFound(id))?;

        entry.outdated = outdated;
        self.write_document(&path, &entry)?;

        debug!(id = %id, outdated, "updated memory status");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use recall_types::Category;
    use std::time::Duration;

    fn temp_store() -> (FileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("recall_store_{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(StoreConfig {
            root_dir: dir.clone(),
        });
        (store, dir)
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    fn entry_at(project: &str, title: &str, secs: u32) -> MemoryEntry {
        MemoryEntry::builder(project, title, format!("content of {title}"))
            .category(Category::Implementation)
            .tag("test")
            .created_at(chrono::Utc.with_ymd_and_hms(2026, 8, 22, 10, 0, secs).unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "JWT rotation", 1);

        let saved = store.save(&entry, &deadline()).await.unwrap();
        assert_eq!(saved.id, entry.id);
        assert!(saved.path.starts_with(dir.join("acme")));

        let loaded = store.load(entry.id, &deadline()).await.unwrap();
        assert_eq!(loaded, entry);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn load_unknown_id_is_not_found() {
        let (store, dir) = temp_store();
        let err = store.load(MemoryId::new(), &deadline()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn colliding_names_get_suffixes_and_both_survive() {
        let (store, dir) = temp_store();
        // Same project, title, and timestamp: identical file stem.
        let first = entry_at("acme", "Deploy checklist", 3);
        let second = entry_at("acme", "Deploy checklist", 3);

        let a = store.save(&first, &deadline()).await.unwrap();
        let b = store.save(&second, &deadline()).await.unwrap();
        assert_ne!(a.path, b.path);
        assert!(b.path.to_string_lossy().ends_with("-2.md"));

        assert_eq!(store.load(first.id, &deadline()).await.unwrap(), first);
        assert_eq!(store.load(second.id, &deadline()).await.unwrap(), second);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_capped() {
        let (store, dir) = temp_store();
        for (i, title) in ["one", "two", "three"].iter().enumerate() {
            let entry = entry_at("acme", title, i as u32);
            store.save(&entry, &deadline()).await.unwrap();
        }

        let listed = store.list(Some("acme"), 2, &deadline()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "three");
        assert_eq!(listed[1].title, "two");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn list_without_project_spans_all_projects() {
        let (store, dir) = temp_store();
        store
            .save(&entry_at("acme", "one", 1), &deadline())
            .await
            .unwrap();
        store
            .save(&entry_at("zen", "two", 2), &deadline())
            .await
            .unwrap();

        let listed = store.list(None, 10, &deadline()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].project, "zen");

        let scoped = store.list(Some("acme"), 10, &deadline()).await.unwrap();
        assert_eq!(scoped.len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn update_status_rewrites_in_place() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "Retry storm", 4);
        let saved = store.save(&entry, &deadline()).await.unwrap();

        let updated = store.update_status(entry.id, true, &deadline()).await.unwrap();
        assert!(updated.outdated);
        assert_eq!(updated.content, entry.content);

        // Same file, no new file.
        let reloaded = store.load(entry.id, &deadline()).await.unwrap();
        assert!(reloaded.outdated);
        let files: Vec<_> = std::fs::read_dir(dir.join("acme"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files, vec![saved.path]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn update_status_unknown_id_is_not_found() {
        let (store, dir) = temp_store();
        let err = store
            .update_status(MemoryId::new(), true, &deadline())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn leftover_temp_file_never_surfaces() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "Stable state", 5);
        store.save(&entry, &deadline()).await.unwrap();

        // Simulate a crash between temp write and rename.
        std::fs::write(dir.join("acme/interrupted.tmp"), "garbage").unwrap();

        let listed = store.list(Some("acme"), 10, &deadline()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.load(entry.id, &deadline()).await.unwrap(), entry);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn corrupt_file_is_skipped_not_fatal() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "Good entry", 6);
        store.save(&entry, &deadline()).await.unwrap();
        std::fs::write(dir.join("acme/stray.md"), "no frontmatter here").unwrap();

        let listed = store.list(Some("acme"), 10, &deadline()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, entry.id);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn renamed_file_keeps_identity() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "Original name", 7);
        let saved = store.save(&entry, &deadline()).await.unwrap();

        let moved = dir.join("acme/renamed-by-hand.md");
        std::fs::rename(&saved.path, &moved).unwrap();

        let loaded = store.load(entry.id, &deadline()).await.unwrap();
        assert_eq!(loaded, entry);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn expired_deadline_times_out() {
        let (store, dir) = temp_store();
        let entry = entry_at("acme", "Too late", 8);
        let expired = Deadline::after(Duration::ZERO);

        let err = store.save(&entry, &expired).await.unwrap_err();
        assert!(err.is_retryable());
        let err = store.load(entry.id, &expired).await.unwrap_err();
        assert!(err.is_retryable());
        let err = store.list(None, 10, &expired).await.unwrap_err();
        assert!(err.is_retryable());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
