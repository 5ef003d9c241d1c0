//! Anthropic provider implementation
//!
//! Supports Anthropic's Claude messages API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_url, require_key, send_error, status_error, CompletionProvider};
use crate::error::{NxdError, Result};
use crate::types::{ProviderConfig, ProviderId};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider implementation
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig, client: Client) -> Self {
        Self {
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
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = require_key(ProviderId::Anthropic, &self.api_key)?;

        let request = MessagesRequest {
            model: &self.model,
            system: system_prompt,
            messages: vec![MessagesMessage {
                role: "user",
                content: user_prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = build_url(&self.base_url, "/messages");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(ProviderId::Anthropic, &url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(ProviderId::Anthropic, status, &body));
        }

        let messages: MessagesResponse = response.json().await.map_err(|e| {
            NxdError::provider_transport(
                ProviderId::Anthropic,
                format!("Malformed response: {}", e),
                None,
            )
        })?;

        let text: String = messages
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(NxdError::provider_transport(
                ProviderId::Anthropic,
                "Response contained no text",
                None,
            ));
        }
        Ok(text)
    }

    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }
}

// Anthropic API structures
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<MessagesMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_concatenates_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"O"},{"type":"tool_use"},{"type":"text","text":"K"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.content.into_iter().filter_map(|b| b.text).collect();
        assert_eq!(text, "OK");
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let request = MessagesRequest {
            model: "claude-3-opus-20240229",
            system: "be brief",
            messages: vec![MessagesMessage { role: "user", content: "hi" }],
            temperature: 0.7,
            max_tokens: 4000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }
}
