//! File-backed system of record for recall memories.
//!
//! One markdown file per memory: a YAML frontmatter block (metadata,
//! including the id) followed by the content body. Files are the durable
//! truth; everything else in the system is a rebuildable projection.
//!
//! Write discipline:
//! - temp file + atomic rename, so readers observe old-or-new, never partial
//! - per-project write serialization; readers take no locks
//! - name collisions get a `-<n>` suffix, existing files are never
//!   overwritten by a save

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod document;
mod error;
mod file;
mod naming;
mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileStore, StoreConfig};
pub use traits::{MemoryStore, SavedMemory};
