use axum::extract::Path;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::{ChatRequest, ChatResponse};
use crate::error::ApiError;
use crate::services::Services;

pub async fn chat_handler(
    Extension(services): Extension<Arc<Services>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = services.orchestrator.chat(request).await?;
    Ok(Json(response))
}

#[derive(Serialize)]
pub struct DeleteConversationResponse {
    success: bool,
    conversation_id: String,
}

pub async fn delete_conversation_handler(
    Extension(services): Extension<Arc<Services>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteConversationResponse>, ApiError> {
    let success = services.cleanup.delete_conversation(&conversation_id).await?;
    Ok(Json(DeleteConversationResponse {
        success,
        conversation_id,
    }))
}

#[derive(Serialize)]
pub struct EngineDescription {
    mode: &'static str,
    description: &'static str,
}

pub async fn engines_handler() -> Json<Vec<EngineDescription>> {
    Json(vec![
        EngineDescription {
            mode: "RETRIEVAL_AUGMENTED",
            description: "Answers are grounded in retrieved course material; requires a course or material filter.",
        },
        EngineDescription {
            mode: "DIRECT",
            description: "Answers directly from conversation history, without retrieval.",
        },
    ])
}

#[derive(Serialize)]
pub struct ConversationHealthResponse {
    status: &'static str,
    service_info: &'static str,
}

pub async fn conversation_health_handler() -> Json<ConversationHealthResponse> {
    Json(ConversationHealthResponse {
        status: "ok",
        service_info: "conversation memory + chat orchestrator",
    })
}
