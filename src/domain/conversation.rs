use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-conversation rolling chat history: an ordered turn list plus an
/// optional summary of compacted earlier turns and a cached token
/// estimate. Persisted as a single value in the memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub conversation_id: String,
    pub messages: Vec<Turn>,
    pub summary: Option<String>,
    pub token_estimate: usize,
    pub last_activity: DateTime<Utc>,
}

impl ConversationMemory {
    pub fn empty(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            summary: None,
            token_estimate: 0,
            last_activity: Utc::now(),
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Build the `chat_history` string used to prime question
    /// condensation: the carried summary (if any) followed by each turn.
    pub fn history_text(&self) -> String {
        let mut out = String::new();
        if let Some(summary) = &self.summary {
            out.push_str(summary);
            out.push('\n');
        }
        for turn in &self.messages {
            let role = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            out.push_str(role);
            out.push_str(": ");
            out.push_str(&turn.content);
            out.push('\n');
        }
        out
    }
}

/// The two chat response modes. Modeled as a tagged variant rather than
/// a trait object: there are exactly two, and they share most of their
/// pre/post processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineMode {
    RetrievalAugmented,
    Direct,
}
