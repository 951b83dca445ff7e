use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unique identifier for a memory entry.
///
/// Assigned once at creation and never derived from file contents or
/// location; renaming a file on disk does not change identity. The id is the
/// join key between the file store and the semantic index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub uuid::Uuid);

impl MemoryId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MemoryId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Closed classification for memory entries.
///
/// Unknown category strings are rejected at validation rather than coerced
/// into a catch-all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Architecture,
    Implementation,
    Debugging,
    Documentation,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Architecture,
        Category::Implementation,
        Category::Debugging,
        Category::Documentation,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Implementation => "implementation",
            Self::Debugging => "debugging",
            Self::Documentation => "documentation",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "architecture" => Ok(Self::Architecture),
            "implementation" => Ok(Self::Implementation),
            "debugging" => Ok(Self::Debugging),
            "documentation" => Ok(Self::Documentation),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller input for a new memory, validated before any side effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMemory {
    pub project: String,
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    pub content: String,
}

impl NewMemory {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !is_valid_project_slug(&self.project) {
            return Err(ValidationError::InvalidProject(self.project.clone()));
        }
        Ok(())
    }
}

/// A validated, durable memory record.
///
/// Everything except `outdated` is fixed at creation. Outdated records stay
/// on disk and in the index; default retrieval skips them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: MemoryId,
    pub project: String,
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub outdated: bool,
}

impl MemoryEntry {
    /// Validate caller input and mint a new record with a fresh id.
    pub fn new(input: NewMemory) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            id: MemoryId::new(),
            project: input.project,
            category: input.category,
            title: input.title.trim().to_string(),
            tags: normalize_tags(input.tags),
            references: input.references,
            content: input.content,
            created_at: Utc::now(),
            outdated: false,
        })
    }

    /// Builder for ergonomic construction, mainly in tests.
    pub fn builder(
        project: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> MemoryEntryBuilder {
        MemoryEntryBuilder {
            project: project.into(),
            category: Category::Other,
            title: title.into(),
            tags: Vec::new(),
            references: Vec::new(),
            content: content.into(),
            created_at: None,
        }
    }

    /// True when the entry carries every requested tag.
    pub fn has_all_tags(&self, wanted: &[String]) -> bool {
        wanted.iter().all(|t| self.tags.iter().any(|have| have == t))
    }
}

/// Builder for constructing `MemoryEntry` values.
pub struct MemoryEntryBuilder {
    project: String,
    category: Category,
    title: String,
    tags: Vec<String>,
    references: Vec<String>,
    content: String,
    created_at: Option<DateTime<Utc>>,
}

impl MemoryEntryBuilder {
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn build(self) -> Result<MemoryEntry, ValidationError> {
        let mut entry = MemoryEntry::new(NewMemory {
            project: self.project,
            category: self.category,
            title: self.title,
            tags: self.tags,
            references: self.references,
            content: self.content,
        })?;
        if let Some(at) = self.created_at {
            entry.created_at = at;
        }
        Ok(entry)
    }
}

/// Lowercase alphanumerics plus `-` and `_`, non-empty.
fn is_valid_project_slug(project: &str) -> bool {
    !project.is_empty()
        && project
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Trim, drop empties, dedupe keeping first occurrence.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> NewMemory {
        NewMemory {
            project: "acme-api".to_string(),
            category: Category::Debugging,
            title: "Retry storm in the webhook consumer".to_string(),
            tags: vec!["webhooks".to_string(), "retries".to_string()],
            references: vec!["docs/runbooks/webhooks.md".to_string()],
            content: "Exponential backoff was missing a jitter term.".to_string(),
        }
    }

    #[test]
    fn new_entry_mints_id_and_defaults() {
        let entry = MemoryEntry::new(sample_input()).unwrap();
        assert!(!entry.outdated);
        assert_eq!(entry.category, Category::Debugging);
        assert_eq!(entry.tags, vec!["webhooks", "retries"]);
    }

    #[test]
    fn ids_are_unique_per_entry() {
        let a = MemoryEntry::new(sample_input()).unwrap();
        let b = MemoryEntry::new(sample_input()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn empty_content_rejected() {
        let mut input = sample_input();
        input.content = "   \n".to_string();
        assert_eq!(
            MemoryEntry::new(input).unwrap_err(),
            ValidationError::EmptyContent
        );
    }

    #[test]
    fn empty_title_rejected() {
        let mut input = sample_input();
        input.title = String::new();
        assert_eq!(
            MemoryEntry::new(input).unwrap_err(),
            ValidationError::EmptyTitle
        );
    }

    #[test]
    fn uppercase_project_rejected() {
        let mut input = sample_input();
        input.project = "Acme".to_string();
        assert!(matches!(
            MemoryEntry::new(input).unwrap_err(),
            ValidationError::InvalidProject(_)
        ));
    }

    #[test]
    fn empty_project_rejected() {
        let mut input = sample_input();
        input.project = String::new();
        assert!(matches!(
            MemoryEntry::new(input).unwrap_err(),
            ValidationError::InvalidProject(_)
        ));
    }

    #[test]
    fn tags_are_trimmed_and_deduped() {
        let mut input = sample_input();
        input.tags = vec![
            " webhooks ".to_string(),
            "webhooks".to_string(),
            String::new(),
            "retries".to_string(),
        ];
        let entry = MemoryEntry::new(input).unwrap();
        assert_eq!(entry.tags, vec!["webhooks", "retries"]);
    }

    #[test]
    fn reference_order_preserved() {
        let mut input = sample_input();
        input.references = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let entry = MemoryEntry::new(input).unwrap();
        assert_eq!(entry.references, vec!["b", "a", "c"]);
    }

    #[test]
    fn category_parse_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()).unwrap(), category);
        }
    }

    #[test]
    fn unknown_category_rejected() {
        assert_eq!(
            Category::parse("musings").unwrap_err(),
            ValidationError::UnknownCategory("musings".to_string())
        );
    }

    #[test]
    fn category_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::Architecture).unwrap();
        assert_eq!(json, "\"architecture\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::Architecture);
    }

    #[test]
    fn memory_id_display_parse_round_trip() {
        let id = MemoryId::new();
        let parsed = MemoryId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn garbage_id_rejected() {
        assert!(matches!(
            MemoryId::parse("not-a-uuid").unwrap_err(),
            ValidationError::InvalidId(_)
        ));
    }

    #[test]
    fn entry_serialization_roundtrip() {
        let entry = MemoryEntry::new(sample_input()).unwrap();
        let json = serde_json::to_string(&entry).unwrap();
        let restored: MemoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn has_all_tags_requires_every_tag() {
        let entry = MemoryEntry::new(sample_input()).unwrap();
        assert!(entry.has_all_tags(&["webhooks".to_string()]));
        assert!(entry.has_all_tags(&["webhooks".to_string(), "retries".to_string()]));
        assert!(!entry.has_all_tags(&["webhooks".to_string(), "billing".to_string()]));
        assert!(entry.has_all_tags(&[]));
    }
}
