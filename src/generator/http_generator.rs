use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Generator, Message};
use crate::config::Settings;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct HttpGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl HttpGenerator {
    pub fn new(settings: &Settings, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.llm_model.clone(),
            timeout,
        }
    }
}

fn role_str(role: super::MessageRole) -> &'static str {
    match role {
        super::MessageRole::System => "system",
        super::MessageRole::User => "user",
        super::MessageRole::Assistant => "assistant",
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn complete(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
        temperature: f32,
    ) -> Result<String, ApiError> {
        let mut wire: Vec<WireMessage> = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system_prompt {
            wire.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        for m in messages {
            wire.push(WireMessage {
                role: role_str(m.role),
                content: &m.content,
            });
        }

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: wire,
            temperature,
            stream: false,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| ApiError::GenFailed("generation request timed out".to_string()))?
        .map_err(|e| ApiError::GenFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::GenFailed(format!(
                "generation service returned {}",
                response.status()
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::GenFailed(format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ApiError::GenFailed("completion response had no choices".to_string()))
    }
}
