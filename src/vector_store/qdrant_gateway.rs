use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeleteCollectionBuilder,
    DeletePointsBuilder, Distance, Filter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{SearchHit, VectorStore};
use crate::config::Settings;
use crate::domain::{Chunk, CollectionInfo, FilterSpec};
use crate::error::ApiError;

pub struct QdrantGateway {
    client: Qdrant,
}

impl QdrantGateway {
    pub fn connect(settings: &Settings) -> Result<Self, ApiError> {
        let url = format!("http://{}:{}", settings.qdrant_host, settings.qdrant_port);

        let client = Qdrant::from_url(&url)
            .timeout(Duration::from_secs(settings.qdrant_timeout))
            .build()
            .map_err(|e| ApiError::store_unavailable(format!("qdrant connect: {e}")))?;

        Ok(Self { client })
    }

    fn native_filter(filter: &FilterSpec) -> Option<Filter> {
        match filter {
            FilterSpec::None => None,
            FilterSpec::ByCourse(course_id) => {
                Some(Filter::must([Condition::matches("course_id", course_id.clone())]))
            }
            FilterSpec::ByMaterial(material_id) => Some(Filter::must([Condition::matches(
                "course_material_id",
                material_id.clone(),
            )])),
        }
    }

    fn chunk_to_point(chunk: &Chunk) -> PointStruct {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("course_id".into(), chunk.tenant.course_id.clone().into());
        payload.insert(
            "course_material_id".into(),
            chunk.tenant.course_material_id.clone().into(),
        );
        payload.insert("material_name".into(), chunk.material_name.clone().into());
        payload.insert("chunk_index".into(), (chunk.chunk_index as i64).into());
        payload.insert("text".into(), chunk.text.clone().into());
        payload.insert("created_at".into(), chunk.created_at.to_rfc3339().into());

        PointStruct::new(
            chunk.chunk_id.to_string(),
            chunk.embedding.clone(),
            Payload::from(payload),
        )
    }
}

#[async_trait]
impl VectorStore for QdrantGateway {
    async fn ensure_collection(&self, name: &str, vector_dim: usize) -> Result<(), ApiError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| ApiError::store_unavailable(format!("collection_exists: {e}")))?;

        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(vector_dim as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| ApiError::store_unavailable(format!("create_collection: {e}")))?;

        debug!(collection = name, dim = vector_dim, "collection created");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), ApiError> {
        match self
            .client
            .delete_collection(DeleteCollectionBuilder::new(name))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(())
                } else {
                    Err(ApiError::store_unavailable(format!("delete_collection: {msg}")))
                }
            }
        }
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| ApiError::store_unavailable(format!("list_collections: {e}")))?;

        let mut infos = Vec::with_capacity(response.collections.len());
        for collection in response.collections {
            let count = self.count(&collection.name).await.unwrap_or(0);
            infos.push(CollectionInfo {
                name: collection.name,
                vectors_count: count,
            });
        }
        Ok(infos)
    }

    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<(), ApiError> {
        if chunks.is_empty() {
            return Err(ApiError::invariant("upsert called with an empty chunk batch"));
        }

        let points: Vec<PointStruct> = chunks.iter().map(Self::chunk_to_point).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, points))
            .await
            .map_err(|e| ApiError::store_unavailable(format!("upsert: {e}")))?;

        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        query_vector: &[f32],
        top_k: usize,
        filter: &FilterSpec,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>, ApiError> {
        let mut builder = SearchPointsBuilder::new(name, query_vector.to_vec(), top_k as u64)
            .with_payload(true);

        if let Some(native) = Self::native_filter(filter) {
            builder = builder.filter(native);
        }
        if let Some(threshold) = score_threshold {
            builder = builder.score_threshold(threshold);
        }

        let response = match self.client.search_points(builder).await {
            Ok(r) => r,
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("doesn't exist") || msg.contains("not found") {
                    warn!(collection = name, "search against missing collection");
                    return Ok(Vec::new());
                }
                return Err(ApiError::store_unavailable(format!("search: {msg}")));
            }
        };

        let hits = response
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                let get_str = |k: &str| {
                    payload
                        .get(k)
                        .and_then(|v| v.as_str().map(|s| s.to_string()))
                        .unwrap_or_default()
                };
                let chunk_id = match point.id.and_then(|id| id.point_id_options) {
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u,
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
                    None => String::new(),
                };
                SearchHit {
                    chunk_id,
                    score: point.score,
                    course_id: get_str("course_id"),
                    course_material_id: get_str("course_material_id"),
                    material_name: get_str("material_name"),
                    text: get_str("text"),
                }
            })
            .collect();

        Ok(hits)
    }

    async fn delete_by_filter(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError> {
        let native = Self::native_filter(filter).ok_or_else(|| {
            ApiError::invariant("delete_by_filter requires a non-NONE filter")
        })?;

        let before = self.count(name).await.unwrap_or(0);

        match self
            .client
            .delete_points(DeletePointsBuilder::new(name).points(native))
            .await
        {
            Ok(_) => {}
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("doesn't exist") || msg.contains("not found") {
                    return Ok(0);
                }
                return Err(ApiError::store_unavailable(format!("delete_by_filter: {msg}")));
            }
        }

        let after = self.count(name).await.unwrap_or(before);
        Ok(before.saturating_sub(after))
    }

    async fn count(&self, name: &str) -> Result<u64, ApiError> {
        match self
            .client
            .count(CountPointsBuilder::new(name).exact(true))
            .await
        {
            Ok(response) => Ok(response.result.map(|r| r.count).unwrap_or(0)),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("doesn't exist") || msg.contains("not found") {
                    Ok(0)
                } else {
                    Err(ApiError::store_unavailable(format!("count: {msg}")))
                }
            }
        }
    }

    async fn count_matching(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError> {
        let Some(native) = Self::native_filter(filter) else {
            return self.count(name).await;
        };

        match self
            .client
            .count(CountPointsBuilder::new(name).filter(native).exact(true))
            .await
        {
            Ok(response) => Ok(response.result.map(|r| r.count).unwrap_or(0)),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("doesn't exist") || msg.contains("not found") {
                    Ok(0)
                } else {
                    Err(ApiError::store_unavailable(format!("count_matching: {msg}")))
                }
            }
        }
    }
}
