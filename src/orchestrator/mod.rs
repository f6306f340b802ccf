use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::conversation::{ConversationEngine, ConversationLockMap};
use crate::domain::{ChatRequest, ChatResponse, EngineMode, FilterSpec, Source};
use crate::error::ApiError;
use crate::generator::{Generator, Message, PromptRegistry};
use crate::retrieval::RetrievalEngine;

const REFUSAL: &str = "检索必须携带过滤条件，不支持无过滤条件检索";
const EMPTY_HIT: &str = "检索的课程和材料不在数据库中";

pub struct OrchestratorConfig {
    pub default_collection: String,
    pub similarity_top_k: usize,
    pub generation_temperature: f32,
}

/// Composes the two chat response modes. Both share pre/post
/// processing; the mode itself is a tagged match, not a trait object —
/// there are exactly two and most of the skeleton is shared.
pub struct ChatOrchestrator {
    retrieval: Arc<RetrievalEngine>,
    conversation: Arc<ConversationEngine>,
    generator: Arc<dyn Generator>,
    prompts: Arc<PromptRegistry>,
    conversation_locks: Arc<ConversationLockMap>,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        conversation: Arc<ConversationEngine>,
        generator: Arc<dyn Generator>,
        prompts: Arc<PromptRegistry>,
        conversation_locks: Arc<ConversationLockMap>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            retrieval,
            conversation,
            generator,
            prompts,
            conversation_locks,
            config,
        }
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let start = Instant::now();

        if request.conversation_id.trim().is_empty() {
            return Err(ApiError::BadRequest("conversation_id must not be empty".to_string()));
        }
        if request.question.trim().is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        let _guard = self.conversation_locks.acquire(request.conversation_id.clone()).await;

        let (filter_spec, tie_break) =
            FilterSpec::derive(request.course_id.as_deref(), request.course_material_id.as_deref());
        if tie_break {
            warn!(
                course_id = ?request.course_id,
                course_material_id = ?request.course_material_id,
                "both course_id and course_material_id supplied; course_id wins"
            );
        }

        let memory = self.conversation.open(&request.conversation_id).await?;

        let response = match request.engine_mode {
            EngineMode::RetrievalAugmented => {
                self.retrieval_augmented(&request, &filter_spec, tie_break, memory).await?
            }
            EngineMode::Direct => self.direct(&request, &filter_spec, tie_break, memory).await?,
        };

        Ok(ChatResponse {
            processing_time: start.elapsed().as_secs_f64(),
            ..response
        })
    }

    async fn retrieval_augmented(
        &self,
        request: &ChatRequest,
        filter_spec: &FilterSpec,
        tie_break: bool,
        memory: crate::domain::ConversationMemory,
    ) -> Result<ChatResponse, ApiError> {
        if filter_spec.is_none() {
            info!(conversation_id = %request.conversation_id, "retrieval refused: no filter supplied");
            return Ok(ChatResponse {
                answer: REFUSAL.to_string(),
                sources: Vec::new(),
                conversation_id: request.conversation_id.clone(),
                engine_mode: request.engine_mode,
                filter_info: REFUSAL.to_string(),
                processing_time: 0.0,
            });
        }

        let collection = request
            .collection_name
            .clone()
            .unwrap_or_else(|| self.config.default_collection.clone());

        let hits = self
            .retrieval
            .retrieve(&collection, &request.question, filter_spec, Some(self.config.similarity_top_k))
            .await?;

        let filter_info = describe_filter(filter_spec, tie_break);

        if hits.is_empty() {
            info!(
                conversation_id = %request.conversation_id,
                collection = %collection,
                "retrieval returned zero hits"
            );
            return Ok(ChatResponse {
                answer: EMPTY_HIT.to_string(),
                sources: Vec::new(),
                conversation_id: request.conversation_id.clone(),
                engine_mode: request.engine_mode,
                filter_info: EMPTY_HIT.to_string(),
                processing_time: 0.0,
            });
        }

        let chat_history = memory.history_text();
        let condensed_question = self
            .generator
            .complete(
                &[Message::user(
                    self.prompts.condense_question(&chat_history, &request.question),
                )],
                None,
                self.config.generation_temperature,
            )
            .await;

        let standalone_question = match condensed_question {
            Ok(q) if !q.trim().is_empty() => q,
            _ => request.question.clone(),
        };

        let context_str = assemble_context(&hits);

        let answer = match self
            .generator
            .complete(
                &[Message::user(
                    self.prompts.context_integration(&context_str, &standalone_question),
                )],
                None,
                self.config.generation_temperature,
            )
            .await
        {
            Ok(answer) => answer,
            Err(ApiError::GenFailed(reason)) => {
                return Ok(ChatResponse {
                    answer: format!("抱歉，处理您的问题时出现错误: {reason}"),
                    sources: Vec::new(),
                    conversation_id: request.conversation_id.clone(),
                    engine_mode: request.engine_mode,
                    filter_info,
                    processing_time: 0.0,
                });
            }
            Err(other) => return Err(other),
        };

        self.conversation
            .append_turn(memory, request.question.clone(), answer.clone())
            .await?;

        Ok(ChatResponse {
            answer,
            sources: hits,
            conversation_id: request.conversation_id.clone(),
            engine_mode: request.engine_mode,
            filter_info,
            processing_time: 0.0,
        })
    }

    async fn direct(
        &self,
        request: &ChatRequest,
        filter_spec: &FilterSpec,
        tie_break: bool,
        memory: crate::domain::ConversationMemory,
    ) -> Result<ChatResponse, ApiError> {
        let filter_info = describe_filter(filter_spec, tie_break);

        let mut messages: Vec<Message> = memory
            .messages
            .iter()
            .map(|turn| match turn.role {
                crate::domain::Role::User => Message::user(turn.content.clone()),
                crate::domain::Role::Assistant => Message::assistant(turn.content.clone()),
            })
            .collect();
        messages.push(Message::user(request.question.clone()));

        let answer = match self
            .generator
            .complete(&messages, Some(self.prompts.direct_system()), self.config.generation_temperature)
            .await
        {
            Ok(answer) => answer,
            Err(ApiError::GenFailed(reason)) => {
                return Ok(ChatResponse {
                    answer: format!("抱歉，处理您的问题时出现错误: {reason}"),
                    sources: Vec::new(),
                    conversation_id: request.conversation_id.clone(),
                    engine_mode: request.engine_mode,
                    filter_info,
                    processing_time: 0.0,
                });
            }
            Err(other) => return Err(other),
        };

        self.conversation
            .append_turn(memory, request.question.clone(), answer.clone())
            .await?;

        Ok(ChatResponse {
            answer,
            sources: Vec::new(),
            conversation_id: request.conversation_id.clone(),
            engine_mode: request.engine_mode,
            filter_info,
            processing_time: 0.0,
        })
    }
}

fn describe_filter(filter_spec: &FilterSpec, tie_break: bool) -> String {
    if tie_break {
        filter_spec.describe()
    } else {
        filter_spec.describe_plain()
    }
}

fn assemble_context(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] ({}) {}\n", i + 1, s.material_name, s.chunk_text))
        .collect()
}
