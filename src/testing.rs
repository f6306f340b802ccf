//! In-memory fakes for the four gateway traits, used by the crate's
//! own end-to-end tests in `tests/` where a live Qdrant/Redis/LLM isn't
//! available. Deterministic and dependency-free; not meant for
//! production use.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{Chunk, CollectionInfo, ConversationMemory, FilterSpec, Turn};
use crate::embedder::Embedder;
use crate::error::ApiError;
use crate::generator::{Generator, Message};
use crate::memory_store::MemoryStore;
use crate::vector_store::{SearchHit, VectorStore};

#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: Mutex<HashMap<String, Vec<Chunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(chunk: &Chunk, filter: &FilterSpec) -> bool {
        match filter {
            FilterSpec::None => true,
            FilterSpec::ByCourse(course_id) => &chunk.tenant.course_id == course_id,
            FilterSpec::ByMaterial(material_id) => &chunk.tenant.course_material_id == material_id,
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            dot / (norm_a * norm_b)
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str, _vector_dim: usize) -> Result<(), ApiError> {
        self.collections.lock().await.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), ApiError> {
        self.collections.lock().await.remove(name);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, ApiError> {
        Ok(self
            .collections
            .lock()
            .await
            .iter()
            .map(|(name, chunks)| CollectionInfo {
                name: name.clone(),
                vectors_count: chunks.len() as u64,
            })
            .collect())
    }

    async fn upsert(&self, name: &str, chunks: &[Chunk]) -> Result<(), ApiError> {
        if chunks.is_empty() {
            return Err(ApiError::invariant("upsert called with an empty chunk batch"));
        }
        self.collections
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(chunks);
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
        let collections = self.collections.lock().await;
        let Some(chunks) = collections.get(name) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = chunks
            .iter()
            .filter(|c| Self::matches(c, filter))
            .map(|c| SearchHit {
                chunk_id: c.chunk_id.to_string(),
                score: Self::cosine(query_vector, &c.embedding),
                course_id: c.tenant.course_id.clone(),
                course_material_id: c.tenant.course_material_id.clone(),
                material_name: c.material_name.clone(),
                text: c.text.clone(),
            })
            .filter(|hit| score_threshold.map(|t| hit.score >= t).unwrap_or(true))
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn delete_by_filter(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError> {
        let mut collections = self.collections.lock().await;
        let Some(chunks) = collections.get_mut(name) else {
            return Ok(0);
        };
        let before = chunks.len();
        chunks.retain(|c| !Self::matches(c, filter));
        Ok((before - chunks.len()) as u64)
    }

    async fn count(&self, name: &str) -> Result<u64, ApiError> {
        Ok(self
            .collections
            .lock()
            .await
            .get(name)
            .map(|c| c.len() as u64)
            .unwrap_or(0))
    }

    async fn count_matching(&self, name: &str, filter: &FilterSpec) -> Result<u64, ApiError> {
        Ok(self
            .collections
            .lock()
            .await
            .get(name)
            .map(|chunks| chunks.iter().filter(|c| Self::matches(c, filter)).count() as u64)
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct InMemoryMemoryStore {
    records: Mutex<HashMap<String, ConversationMemory>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationMemory>, ApiError> {
        Ok(self.records.lock().await.get(conversation_id).cloned())
    }

    async fn append(&self, conversation_id: &str, message: Turn) -> Result<(), ApiError> {
        let mut records = self.records.lock().await;
        let memory = records
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationMemory::empty(conversation_id));
        memory.messages.push(message);
        Ok(())
    }

    async fn overwrite(&self, memory: &ConversationMemory) -> Result<(), ApiError> {
        self.records
            .lock()
            .await
            .insert(memory.conversation_id.clone(), memory.clone());
        Ok(())
    }

    async fn delete(&self, conversation_id: &str) -> Result<bool, ApiError> {
        Ok(self.records.lock().await.remove(conversation_id).is_some())
    }
}

/// Deterministic bag-of-words embedding: no semantic meaning, but
/// stable across calls and cheap, which is all the in-process tests
/// need from it.
pub struct DeterministicEmbedder {
    dimension: usize,
}

impl DeterministicEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vector = vec![0.0f32; self.dimension];
        for (i, word) in text.split_whitespace().enumerate() {
            let slot = (word.len() + i) % self.dimension;
            vector[slot] += 1.0;
        }
        if vector.iter().all(|v| *v == 0.0) {
            vector[0] = 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Echoes a templated response referencing whatever was asked, so
/// tests can assert non-emptiness and rough shape without a live LLM.
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn complete(
        &self,
        messages: &[Message],
        _system_prompt: Option<&str>,
        _temperature: f32,
    ) -> Result<String, ApiError> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("answer based on: {}", last.chars().take(120).collect::<String>()))
    }
}
