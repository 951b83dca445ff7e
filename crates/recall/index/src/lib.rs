//! Derived semantic index for recall memories.
//!
//! The index is a projection of the file store, never the truth: every
//! record here can be rebuilt from the files. Two collaborators are modeled
//! as traits:
//! - [`Embedder`] turns text into a vector (deterministic hash embedder for
//!   offline use and tests, HTTP client for OpenAI-compatible endpoints)
//! - [`VectorEngine`] stores vectors and answers similarity queries (the
//!   in-memory engine is the reference implementation; production engines
//!   live behind the same trait)
//!
//! [`VectorIndex`] wraps both with the write/query policy: transient
//! collaborator failures are retried exactly once after a short backoff,
//! records are never removed (outdated is a metadata flip), and every call
//! is bounded by the caller's deadline.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod adapter;
mod embedder;
mod engine;
mod error;
mod http;

pub use adapter::{IndexConfig, VectorIndex};
pub use embedder::{Embedder, EmbedderConfig, HashEmbedder, EMBEDDING_DIM_384};
pub use engine::{EngineHit, InMemoryVectorEngine, MetadataFilter, VectorEngine, VectorRecord};
pub use error::{IndexError, IndexResult};
pub use http::HttpEmbedder;
