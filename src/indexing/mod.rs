use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::chunker::chunk_text;
use crate::domain::{Chunk, FilterSpec, TenantKey};
use crate::embedder::Embedder;
use crate::error::ApiError;
use crate::vector_store::VectorStore;

pub struct IndexingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub default_collection: String,
    pub enforce_uniqueness: bool,
}

pub struct IndexResult {
    pub success: bool,
    pub chunk_count: usize,
    pub processing_time: f64,
    pub collection_name: String,
}

pub struct IndexingEngine {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    config: IndexingConfig,
}

impl IndexingEngine {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, config: IndexingConfig) -> Self {
        Self {
            vector_store,
            embedder,
            config,
        }
    }

    pub async fn build_index(
        &self,
        raw_text: &str,
        tenant: TenantKey,
        material_name: String,
        collection_override: Option<String>,
    ) -> Result<IndexResult, ApiError> {
        let start = Instant::now();
        let collection = collection_override.unwrap_or_else(|| self.config.default_collection.clone());

        if self.config.enforce_uniqueness {
            self.reject_if_already_indexed(&collection, &tenant).await?;
        }

        self.vector_store
            .ensure_collection(&collection, self.embedder.dimension())
            .await?;

        let texts = chunk_text(raw_text, self.config.chunk_size, self.config.chunk_overlap);
        if texts.is_empty() {
            return Err(ApiError::BadRequest(
                "document produced zero chunks".to_string(),
            ));
        }

        let mut chunks = Vec::with_capacity(texts.len());
        for (index, text) in texts.into_iter().enumerate() {
            let embedding = self.embedder.embed(&text).await.map_err(|_| ApiError::EmbedFailed {
                index,
                reason: format!("embedding failed for chunk {index}"),
            })?;

            chunks.push(Chunk::new(tenant.clone(), material_name.clone(), index, text, embedding));
        }

        self.vector_store.upsert(&collection, &chunks).await?;

        info!(
            collection = %collection,
            course_id = %tenant.course_id,
            course_material_id = %tenant.course_material_id,
            chunk_count = chunks.len(),
            "document indexed"
        );

        Ok(IndexResult {
            success: true,
            chunk_count: chunks.len(),
            processing_time: start.elapsed().as_secs_f64(),
            collection_name: collection,
        })
    }

    /// Tenant uniqueness is enforced here, at the indexing layer, per
    /// the boundary decision recorded for this engine: callers are
    /// expected to `delete_by_filter` first when re-indexing.
    async fn reject_if_already_indexed(&self, collection: &str, tenant: &TenantKey) -> Result<(), ApiError> {
        let filter = FilterSpec::ByMaterial(tenant.course_material_id.clone());
        let existing = self.vector_store.count_matching(collection, &filter).await?;
        if existing > 0 {
            debug!(
                collection,
                course_material_id = %tenant.course_material_id,
                existing,
                "refusing duplicate ingestion"
            );
            return Err(ApiError::invariant(format!(
                "tenant {}/{} already has {existing} indexed chunks in {collection}",
                tenant.course_id, tenant.course_material_id
            )));
        }
        Ok(())
    }
}
