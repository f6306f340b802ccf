use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Deliberately flat: every field corresponds 1:1 to an env var named
/// in the external interface (`RAG_` prefix), e.g. `RAG_QDRANT_PREFER_GRPC`.
/// A nested struct would force the `config` crate's separator-based
/// dotting to collide with the snake_case field names themselves.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub redis_url: String,
    pub redis_ttl: u64,

    pub qdrant_host: String,
    pub qdrant_port: u16,
    pub qdrant_prefer_grpc: bool,
    pub qdrant_timeout: u64,
    pub default_collection: String,

    pub embed_model: String,
    pub embed_dimension: usize,

    pub llm_model: String,
    pub llm_temperature: f32,

    pub api_key: String,
    pub base_url: String,

    pub conversation_token_limit: usize,
    pub conversation_similarity_top_k: usize,
    pub conversation_tail_keep: usize,
    pub conversation_hard_cap: usize,

    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("redis_ttl", 3600)?
            .set_default("qdrant_host", "localhost")?
            .set_default("qdrant_port", 6334)?
            .set_default("qdrant_prefer_grpc", true)?
            .set_default("qdrant_timeout", 10)?
            .set_default("default_collection", "course_materials")?
            .set_default("embed_dimension", 1536)?
            .set_default("llm_temperature", 0.1)?
            .set_default("conversation_token_limit", 4000)?
            .set_default("conversation_similarity_top_k", 6)?
            .set_default("conversation_tail_keep", 4)?
            .set_default("conversation_hard_cap", 20)?
            .set_default("chunk_size", 512)?
            .set_default("chunk_overlap", 50)?
            .add_source(
                Environment::with_prefix("RAG")
                    .separator("::")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}
