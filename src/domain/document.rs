use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::TenantKey;

/// An ingested unit. Immutable after ingestion; replaced only via
/// delete-then-insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub tenant: TenantKey,
    pub material_name: String,
    pub raw_text: String,
    pub file_size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// One segment of a `Document`'s text, together with its embedding and
/// the payload duplicated for filterless joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: Uuid,
    pub tenant: TenantKey,
    pub material_name: String,
    pub chunk_index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(
        tenant: TenantKey,
        material_name: String,
        chunk_index: usize,
        text: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            tenant,
            material_name,
            chunk_index,
            text,
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// A named partition in the vector store, lazily created on first upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub vectors_count: u64,
}
