//! OpenAI chat-completions client
//!
//! Also serves Grok (x.ai), DeepSeek and Poe, which expose the same API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_url, require_key, send_error, status_error, CompletionProvider};
use crate::error::{NxdError, Result};
use crate::types::{ProviderConfig, ProviderId};

pub struct OpenAiCompatibleProvider {
    id: ProviderId,
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &ProviderConfig, client: Client) -> Self {
        Self {
            id: config.id,
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = require_key(self.id, &self.api_key)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = build_url(&self.base_url, "/chat/completions");
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(self.id, &url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(self.id, status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| NxdError::provider_transport(self.id, format!("Malformed response: {}", e), None))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| NxdError::provider_transport(self.id, "Response contained no choices", None))
    }

    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
