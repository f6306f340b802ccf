use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::cleanup::CleanupCoordinator;
use crate::config::Settings;
use crate::conversation::{ConversationEngine, ConversationEngineConfig, ConversationLockMap};
use crate::embedder::{Embedder, HttpEmbedder};
use crate::generator::{Generator, HttpGenerator, PromptRegistry};
use crate::indexing::{IndexingConfig, IndexingEngine};
use crate::memory_store::{MemoryStore, RedisGateway};
use crate::orchestrator::{ChatOrchestrator, OrchestratorConfig};
use crate::retrieval::RetrievalEngine;
use crate::tenant_lock::TenantLockMap;
use crate::utils::limiters::Timeouts;
use crate::vector_store::{QdrantGateway, VectorStore};

/// Everything a request handler needs, built once at startup and
/// shared behind `Arc`s. There is no package-level mutable state; this
/// struct is the one composition root.
pub struct Services {
    pub settings: Settings,
    pub vector_store: Arc<dyn VectorStore>,
    pub memory_store: Arc<dyn MemoryStore>,
    pub indexing: Arc<IndexingEngine>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub cleanup: Arc<CleanupCoordinator>,
    pub tenant_locks: Arc<TenantLockMap>,
}

impl Services {
    pub async fn build(settings: Settings) -> Result<Self> {
        let timeouts = Timeouts::from_settings(&settings);

        let vector_store: Arc<dyn VectorStore> = Arc::new(QdrantGateway::connect(&settings)?);
        let memory_store: Arc<dyn MemoryStore> =
            Arc::new(RedisGateway::connect(&settings, timeouts.memory_store).await?);
        info!("connected to vector store and memory store");

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&settings, timeouts.embedding));
        let generator: Arc<dyn Generator> = Arc::new(HttpGenerator::new(&settings, timeouts.generation));

        let prompts = Arc::new(PromptRegistry::load("prompts")?);
        info!("prompt templates loaded");

        let indexing = Arc::new(IndexingEngine::new(
            vector_store.clone(),
            embedder.clone(),
            IndexingConfig {
                chunk_size: settings.chunk_size,
                chunk_overlap: settings.chunk_overlap,
                default_collection: settings.default_collection.clone(),
                enforce_uniqueness: true,
            },
        ));

        let retrieval = Arc::new(RetrievalEngine::new(vector_store.clone(), embedder.clone()));

        let conversation = Arc::new(ConversationEngine::new(
            memory_store.clone(),
            generator.clone(),
            prompts.clone(),
            ConversationEngineConfig {
                token_limit: settings.conversation_token_limit,
                hard_cap_messages: settings.conversation_hard_cap,
                tail_keep: settings.conversation_tail_keep,
                summary_temperature: settings.llm_temperature,
            },
        ));

        let orchestrator = Arc::new(ChatOrchestrator::new(
            retrieval,
            conversation,
            generator,
            prompts,
            Arc::new(ConversationLockMap::new()),
            OrchestratorConfig {
                default_collection: settings.default_collection.clone(),
                similarity_top_k: settings.conversation_similarity_top_k,
                generation_temperature: settings.llm_temperature,
            },
        ));

        let cleanup = Arc::new(CleanupCoordinator::new(vector_store.clone(), memory_store.clone()));

        Ok(Self {
            settings,
            vector_store,
            memory_store,
            indexing,
            orchestrator,
            cleanup,
            tenant_locks: Arc::new(TenantLockMap::new()),
        })
    }
}
