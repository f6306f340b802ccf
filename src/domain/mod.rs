mod chat;
mod conversation;
mod document;
mod filter;
mod tenant;

pub use chat::{ChatRequest, ChatResponse, Source};
pub use conversation::{ConversationMemory, EngineMode, Role, Turn};
pub use document::{Chunk, CollectionInfo, Document};
pub use filter::FilterSpec;
pub use tenant::TenantKey;
