//! Core data model for recall.
//!
//! A memory is a durable, human-readable record owned by the file store and
//! mirrored into a derived semantic index:
//! - **Identity** is opaque and immutable: ids live in record metadata, never
//!   in file names or contents.
//! - **Categories** are a closed set; unknown values are rejected at
//!   validation, not coerced.
//! - **`outdated`** is the only mutable field. Records are never deleted,
//!   only marked.
//!
//! Validation happens before any side effect; a record that reaches a store
//! or index is already well-formed.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod deadline;
mod entry;
mod error;

pub use deadline::Deadline;
pub use entry::{Category, MemoryEntry, MemoryEntryBuilder, MemoryId, NewMemory};
pub use error::ValidationError;
