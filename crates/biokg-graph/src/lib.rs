//! biokg Graph - Graph sink abstraction
//!
//! The pipeline persists accepted triples through the [`GraphSink`]
//! trait; the SurrealDB implementation lives in [`surreal_sink`].

use async_trait::async_trait;
use biokg_core::Result;

pub mod surreal_sink;

pub use surreal_sink::SurrealSink;

/// Trait for graph persistence backends.
///
/// `upsert` must be idempotent under repeated application: calling it
/// again with identical arguments may not create duplicate nodes or
/// relationships, since the same triple can be re-ingested across runs.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Ensure typed nodes for subject and object exist and a single
    /// relationship carrying the predicate connects them
    async fn upsert(
        &self,
        subject_kind: &str,
        subject: &str,
        predicate: &str,
        object_kind: &str,
        object: &str,
    ) -> Result<()>;

    /// Get sink name for logging
    fn name(&self) -> &str;
}
