//! Retrieval backend access.
//!
//! This module provides:
//! - [`Backend`]: the async seam every backend call goes through
//! - [`BackendClient`]: the reqwest implementation for both backend profiles
//! - Wire types, normalized into [`QueryAnswer`] and the aggregation payloads

mod client;
mod types;

pub use client::*;
pub use types::*;

use async_trait::async_trait;
use std::path::Path;

use crate::error::BackendResult;
use crate::session::Entity;

/// Operations the explorer needs from the retrieval backend.
///
/// Retrieval, ranking and graph traversal all happen behind this trait; the
/// client only consumes results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Connect to a graph store, optionally naming the database.
    async fn connect(&self, db_name: Option<String>) -> BackendResult<Acknowledgement>;
    /// Ingest a document (chat profile) or codebase (code profile).
    async fn ingest(&self, source: &Path) -> BackendResult<IngestReport>;
    /// Ask a natural-language question.
    async fn ask(&self, question: &Question) -> BackendResult<QueryAnswer>;
    /// Graph counts, capped to `limit` items of raw data.
    async fn graph_overview(&self, limit: u32) -> BackendResult<GraphOverview>;
    /// Context blob for one entity.
    async fn entity_context(&self, entity: &Entity) -> BackendResult<EntityContext>;
    /// Multi-hop paths between entities, bounded by `max_hops`.
    async fn find_paths(&self, entities: &[Entity], max_hops: u32) -> BackendResult<PathSet>;
    /// Drop the graph store connection.
    async fn disconnect(&self) -> BackendResult<Acknowledgement>;
}
