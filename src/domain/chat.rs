use serde::{Deserialize, Serialize};

use super::conversation::EngineMode;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub question: String,
    #[serde(rename = "chat_engine_type")]
    pub engine_mode: EngineMode,
    pub course_id: Option<String>,
    pub course_material_id: Option<String>,
    pub collection_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub course_id: String,
    pub course_material_id: String,
    pub material_name: String,
    pub chunk_text: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub conversation_id: String,
    pub engine_mode: EngineMode,
    pub filter_info: String,
    pub processing_time: f64,
}
