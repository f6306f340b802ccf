mod qdrant_gateway;

pub use qdrant_gateway::QdrantGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Chunk, CollectionInfo, FilterSpec};
use crate::error::ApiError;

/// One hit returned by `search`: the chunk id, its similarity score,
/// and the payload fields needed to reconstruct a `Source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: String,
    pub score: f32,
    pub course_id: String,
    pub course_material_id: String,
    pub material_name: String,
    pub text: String,
}

/// Typed façade over the vector database: collection lifecycle,
/// upsert, filtered search, filtered delete, counting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ensure_collection(&self, name: &str, vector_dim: usize) -> Result<(), ApiError>;

    /// Removes the collection and all its chunks. Succeeds even if the
    /// collection was already absent.
    async fn delete_collection(&self, name: &str) -> Result<(), ApiError>;

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError>;

    /// Batched; atomicity at the batch level is not required, but a
    /// partial failure must be reported as an error rather than silently
    /// dropped.
    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<(), ApiError>;

    async fn search(
        &self,
        name: &str,
        query_vector: &[f32],
        top_k: usize,
        filter: &FilterSpec,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, ApiError>;

    /// Removes all chunks matching `filter`; returns 0 if none matched.
    /// Must not delete across collections.
    async fn delete_by_filter(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError>;

    async fn count(&self, name: &str) -> Result<u64, ApiError>;

    /// Count of points matching `filter` within `name`, used by the
    /// indexing engine's uniqueness pre-check.
    async fn count_matching(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError>;
}
