mod redis_gateway;

pub use redis_gateway::RedisGateway;

use async_trait::async_trait;

use crate::domain::{ConversationMemory, Turn};
use crate::error::ApiError;

/// Typed façade over the external key-value store used for chat
/// history. Every write refreshes the key's TTL; appends and
/// overwrites are atomic at key granularity because the whole record
/// (messages + summary + token estimate) is stored as a single value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn load(&self, conversation_id: &str) -> Result<Option<ConversationMemory>, ApiError>;

    async fn append(&self, conversation_id: &str, message: Turn) -> Result<(), ApiError>;

    async fn overwrite(&self, memory: &ConversationMemory) -> Result<(), ApiError>;

    /// Idempotent: returns `false` if the key was already absent.
    async fn delete(&self, conversation_id: &str) -> Result<bool, ApiError>;
}
