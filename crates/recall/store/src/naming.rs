//! File naming: `<created_at>-<category>-<slug>.md`, timestamps with `-`
//! instead of `:` so names stay portable.

use recall_types::MemoryEntry;

const SLUG_MAX: usize = 50;

/// File stem for an entry (no extension, no collision suffix).
pub(crate) fn file_stem(entry: &MemoryEntry) -> String {
    format!(
        "{}-{}-{}",
        entry.created_at.format("%Y-%m-%dT%H-%M-%S"),
        entry.category,
        slugify(&entry.title)
    )
}

/// Lowercase the title, collapse non-alphanumeric runs to a single `-`,
/// cap the length. Empty results fall back to "untitled".
pub(crate) fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(SLUG_MAX);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}
