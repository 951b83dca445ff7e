//! Consistency facade over the recall store and semantic index.
//!
//! [`MemoryService`] is the one entry point callers hold. It enforces a
//! single ordering rule: the file store is written first and is always the
//! truth; the index follows and is allowed to lag. A failed index write
//! degrades the operation instead of failing it (the [`SaveReceipt`] says
//! which outcome the caller got), and [`MemoryService::reconcile`] closes
//! the gap later by re-upserting whatever the engine is missing.
//!
//! Search goes the other way around: the index proposes candidates, the
//! store confirms them. Hits are re-read from disk before they are
//! returned, so the worst a stale index row can do is cost recall.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod error;
mod search;
mod service;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use search::{SearchHit, SearchRequest};
pub use service::{MemoryService, SaveReceipt, ServiceStats};
