use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{ConversationMemory, Turn};
use crate::error::ApiError;
use crate::generator::{Generator, Message, PromptRegistry};
use crate::keyed_lock::KeyedLockMap;
use crate::memory_store::MemoryStore;
use crate::utils::token_estimator::{estimate_many, estimate_tokens, would_exceed_limit};

/// Sharded map from conversation_id to its single-writer lock. Held by
/// the orchestrator for the duration of one `chat()` call so
/// `append_turn` always observes the previous turn's persisted state.
pub type ConversationLockMap = KeyedLockMap<String>;

pub struct ConversationEngineConfig {
    pub token_limit: usize,
    pub hard_cap_messages: usize,
    pub tail_keep: usize,
    pub summary_temperature: f32,
}

/// The rolling-buffer-with-compaction conversation memory engine.
pub struct ConversationEngine {
    store: Arc<dyn MemoryStore>,
    generator: Arc<dyn Generator>,
    prompts: Arc<PromptRegistry>,
    config: ConversationEngineConfig,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        generator: Arc<dyn Generator>,
        prompts: Arc<PromptRegistry>,
        config: ConversationEngineConfig,
    ) -> Self {
        Self {
            store,
            generator,
            prompts,
            config,
        }
    }

    pub async fn open(&self, conversation_id: &str) -> Result<ConversationMemory, ApiError> {
        Ok(self
            .store
            .load(conversation_id)
            .await?
            .unwrap_or_else(|| ConversationMemory::empty(conversation_id)))
    }

    /// Appends a user/assistant turn pair, compacting via summarization
    /// if the token estimate or hard message cap is exceeded, then
    /// persists the result.
    pub async fn append_turn(
        &self,
        mut memory: ConversationMemory,
        user_msg: String,
        assistant_msg: String,
    ) -> Result<ConversationMemory, ApiError> {
        let combined_new_text = format!("{user_msg} {assistant_msg}");
        let over_token_limit =
            would_exceed_limit(memory.token_estimate, &combined_new_text, self.config.token_limit);

        memory.messages.push(Turn::user(user_msg));
        memory.messages.push(Turn::assistant(assistant_msg));

        memory.token_estimate = self.recompute_tokens(&memory);

        let over_hard_cap = memory.messages.len() > self.config.hard_cap_messages;

        if over_token_limit || over_hard_cap {
            memory = self.compact(memory).await?;
        }

        memory.last_activity = chrono::Utc::now();
        self.store.overwrite(&memory).await?;
        Ok(memory)
    }

    pub async fn clear(&self, conversation_id: &str) -> Result<bool, ApiError> {
        self.store.delete(conversation_id).await
    }

    fn recompute_tokens(&self, memory: &ConversationMemory) -> usize {
        let summary_tokens = memory.summary.as_deref().map(estimate_tokens).unwrap_or(0);
        let message_tokens = estimate_many(memory.messages.iter().map(|t| t.content.as_str()));
        summary_tokens + message_tokens
    }

    async fn compact(&self, memory: ConversationMemory) -> Result<ConversationMemory, ApiError> {
        let tail_keep = self.config.tail_keep.min(memory.messages.len());
        let split_at = memory.messages.len() - tail_keep;
        let (to_fold, tail) = memory.messages.split_at(split_at);

        let transcript: String = to_fold
            .iter()
            .map(|t| format!("{:?}: {}\n", t.role, t.content))
            .collect();

        let prompt = self
            .prompts
            .summarization(memory.summary.as_deref().unwrap_or(""), &transcript);

        let summary = self
            .generator
            .complete(&[Message::user(prompt)], None, self.config.summary_temperature)
            .await?;

        debug!(
            conversation_id = %memory.conversation_id,
            folded = to_fold.len(),
            kept = tail.len(),
            "compacted conversation memory"
        );

        let mut compacted = memory;
        compacted.messages = tail.to_vec();
        compacted.summary = Some(summary);
        compacted.token_estimate = self.recompute_tokens(&compacted);

        info!(
            conversation_id = %compacted.conversation_id,
            token_estimate = compacted.token_estimate,
            "conversation memory compaction complete"
        );

        Ok(compacted)
    }
}
