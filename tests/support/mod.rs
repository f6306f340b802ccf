use std::sync::Arc;

use coursework_rag_server::cleanup::CleanupCoordinator;
use coursework_rag_server::conversation::{ConversationEngine, ConversationEngineConfig, ConversationLockMap};
use coursework_rag_server::embedder::Embedder;
use coursework_rag_server::generator::{Generator, PromptRegistry};
use coursework_rag_server::indexing::{IndexingConfig, IndexingEngine};
use coursework_rag_server::memory_store::MemoryStore;
use coursework_rag_server::orchestrator::{ChatOrchestrator, OrchestratorConfig};
use coursework_rag_server::retrieval::RetrievalEngine;
use coursework_rag_server::tenant_lock::TenantLockMap;
use coursework_rag_server::testing::{DeterministicEmbedder, EchoGenerator, InMemoryMemoryStore, InMemoryVectorStore};
use coursework_rag_server::vector_store::VectorStore;

pub const EMBED_DIM: usize = 8;
pub const DEFAULT_COLLECTION: &str = "default";

/// The full in-process stack wired from the in-memory fakes, mirroring
/// `Services::build` without a live Qdrant/Redis/LLM.
pub struct Harness {
    pub vector_store: Arc<dyn VectorStore>,
    pub memory_store: Arc<dyn MemoryStore>,
    pub indexing: Arc<IndexingEngine>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub cleanup: Arc<CleanupCoordinator>,
    pub tenant_locks: Arc<TenantLockMap>,
}

pub fn build_harness() -> Harness {
    build_harness_with(ConversationEngineConfig {
        token_limit: 4000,
        hard_cap_messages: 20,
        tail_keep: 4,
        summary_temperature: 0.1,
    })
}

pub fn build_harness_with(conversation_config: ConversationEngineConfig) -> Harness {
    let vector_store: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new());
    let memory_store: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new());
    let embedder: Arc<dyn Embedder> = Arc::new(DeterministicEmbedder::new(EMBED_DIM));
    let generator: Arc<dyn Generator> = Arc::new(EchoGenerator);

    let prompts = Arc::new(PromptRegistry::load("prompts").expect("prompt templates present in workspace root"));

    let indexing = Arc::new(IndexingEngine::new(
        vector_store.clone(),
        embedder.clone(),
        IndexingConfig {
            chunk_size: 200,
            chunk_overlap: 20,
            default_collection: DEFAULT_COLLECTION.to_string(),
            enforce_uniqueness: true,
        },
    ));

    let retrieval = Arc::new(RetrievalEngine::new(vector_store.clone(), embedder.clone()));

    let conversation = Arc::new(ConversationEngine::new(
        memory_store.clone(),
        generator.clone(),
        prompts.clone(),
        conversation_config,
    ));

    let orchestrator = Arc::new(ChatOrchestrator::new(
        retrieval,
        conversation,
        generator,
        prompts,
        Arc::new(ConversationLockMap::new()),
        OrchestratorConfig {
            default_collection: DEFAULT_COLLECTION.to_string(),
            similarity_top_k: 6,
            generation_temperature: 0.1,
        },
    ));

    let cleanup = Arc::new(CleanupCoordinator::new(vector_store.clone(), memory_store.clone()));

    Harness {
        vector_store,
        memory_store,
        indexing,
        orchestrator,
        cleanup,
        tenant_locks: Arc::new(TenantLockMap::new()),
    }
}
