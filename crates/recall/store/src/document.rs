//! Frontmatter document codec.
//!
//! A memory file is a YAML metadata block between `---` fences, one blank
//! line, then the markdown body verbatim. The id lives in the metadata, so
//! renaming a file never changes identity.

use std::path::Path;

use chrono::{DateTime, Utc};
use recall_types::{Category, MemoryEntry, MemoryId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

const FENCE: &str = "---";

/// Every entry field except the content body.
#[derive(Debug, Serialize, Deserialize)]
struct FrontMatter {
    id: MemoryId,
    project: String,
    category: Category,
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    references: Vec<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    outdated: bool,
}

impl From<&MemoryEntry> for FrontMatter {
    fn from(entry: &MemoryEntry) -> Self {
        Self {
            id: entry.id,
            project: entry.project.clone(),
            category: entry.category,
            title: entry.title.clone(),
            tags: entry.tags.clone(),
            references: entry.references.clone(),
            created_at: entry.created_at,
            outdated: entry.outdated,
        }
    }
}

pub(crate) fn render(path: &Path, entry: &MemoryEntry) -> StoreResult<String> {
    let front = FrontMatter::from(entry);
    let yaml = serde_yaml::to_string(&front).map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        reason: format!("frontmatter serialization failed: {e}"),
    })?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n\n{}", entry.content))
}

pub(crate) fn parse(path: &Path, text: &str) -> StoreResult<MemoryEntry> {
    let malformed = |reason: String| StoreError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let rest = text
        .strip_prefix("---\n")
        .ok_or_else(|| malformed("missing opening frontmatter fence".to_string()))?;

    // First bare fence line closes the block; serde_yaml never emits one
    // inside the metadata, so a `---` rule in the body cannot be mistaken
    // for it.
    let (front, body) = match rest.split_once("\n---\n") {
        Some((front, body)) => (front, body.strip_prefix('\n').unwrap_or(body)),
        // Hand-edited file ending right at the fence.
        None => match rest.strip_suffix("\n---") {
            Some(front) => (front, ""),
            None => return Err(malformed("missing closing frontmatter fence".to_string())),
        },
    };

    let front: FrontMatter = serde_yaml::from_str(front)
        .map_err(|e| malformed(format!("invalid frontmatter: {e}")))?;

    Ok(MemoryEntry {
        id: front.id,
        project: front.project,
        category: front.category,
        title: front.title,
        tags: front.tags,
        references: front.references,
        content: body.to_string(),
        created_at: front.created_at,
        outdated: front.outdated,
    })
}
