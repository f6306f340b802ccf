use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::MemoryStore;
use crate::config::Settings;
use crate::domain::{ConversationMemory, Turn};
use crate::error::ApiError;
use crate::utils::limiters::with_timeout;

pub struct RedisGateway {
    conn: ConnectionManager,
    ttl_seconds: u64,
    timeout: Duration,
}

impl RedisGateway {
    pub async fn connect(settings: &Settings, timeout: Duration) -> Result<Self, ApiError> {
        let client = redis::Client::open(settings.redis_url.clone())
            .map_err(|e| ApiError::store_unavailable(format!("redis client: {e}")))?;

        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| ApiError::store_unavailable(format!("redis connect: {e}")))?;

        Ok(Self {
            conn,
            ttl_seconds: settings.redis_ttl,
            timeout,
        })
    }

    fn key(conversation_id: &str) -> String {
        format!("conversation:{conversation_id}")
    }
}

#[async_trait]
impl MemoryStore for RedisGateway {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationMemory>, ApiError> {
        let mut conn = self.conn.clone();
        let key = Self::key(conversation_id);
        let raw: Option<String> = with_timeout(self.timeout, "memory_store.load", async move {
            conn.get(key)
                .await
                .map_err(|e| ApiError::store_unavailable(format!("redis get: {e}")))
        })
        .await?;

        match raw {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| ApiError::InvariantViolation(format!("corrupt memory record: {e}"))),
        }
    }

    async fn append(&self, conversation_id: &str, message: Turn) -> Result<(), ApiError> {
        let mut memory = self
            .load(conversation_id)
            .await?
            .unwrap_or_else(|| ConversationMemory::empty(conversation_id));
        memory.messages.push(message);
        self.overwrite(&memory).await
    }

    async fn overwrite(&self, memory: &ConversationMemory) -> Result<(), ApiError> {
        let json = serde_json::to_string(memory)
            .map_err(|e| ApiError::InvariantViolation(format!("serialize memory: {e}")))?;

        let mut conn = self.conn.clone();
        let key = Self::key(&memory.conversation_id);
        let ttl_seconds = self.ttl_seconds;
        with_timeout(self.timeout, "memory_store.overwrite", async move {
            conn.set_ex::<_, _, ()>(key, json, ttl_seconds)
                .await
                .map_err(|e| ApiError::store_unavailable(format!("redis set: {e}")))
        })
        .await
    }

    async fn delete(&self, conversation_id: &str) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        let key = Self::key(conversation_id);
        let removed: u64 = with_timeout(self.timeout, "memory_store.delete", async move {
            conn.del(key)
                .await
                .map_err(|e| ApiError::store_unavailable(format!("redis del: {e}")))
        })
        .await?;

        Ok(removed > 0)
    }
}
