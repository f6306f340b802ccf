mod http_embedder;

pub use http_embedder::HttpEmbedder;

use async_trait::async_trait;

use crate::error::ApiError;

/// Deterministic (for design purposes) mapping from text to a
/// fixed-dimension vector via an external embedding service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    fn dimension(&self) -> usize;
}
