//! AI provider clients
//!
//! Grok, OpenAI, DeepSeek and Poe all speak the OpenAI chat-completions
//! protocol and share one client; Anthropic has its own.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiCompatibleProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{NxdError, Result};
use crate::types::{ProviderConfig, ProviderId};

/// HTTP-level timeout; the gateway applies its own tighter per-attempt bound
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A single AI completion backend
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One system + user exchange, returning the assistant text
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    fn id(&self) -> ProviderId;

    /// Get model name being used
    fn model(&self) -> &str;

    /// Check if provider has credentials
    fn is_ready(&self) -> bool;
}

/// Create the client for a provider configuration.
///
/// A provider without an API key is still created; its calls fail with a
/// transport error so the gateway can fail over.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    let client = http_client()?;
    match config.id {
        ProviderId::Anthropic => Ok(Arc::new(AnthropicProvider::new(config, client))),
        ProviderId::Grok | ProviderId::OpenAi | ProviderId::DeepSeek | ProviderId::Poe => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(config, client)))
        }
    }
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("nxd-engine/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| NxdError::network(e.to_string(), None, None))
}

/// Credential or `ProviderTransport` error when absent
fn require_key(provider: ProviderId, api_key: &Option<String>) -> Result<&str> {
    api_key
        .as_deref()
        .ok_or_else(|| NxdError::provider_transport(provider, "API key not configured", None))
}

/// Map a non-success HTTP status to a transport error
fn status_error(provider: ProviderId, status: StatusCode, body: &str) -> NxdError {
    let message = match status.as_u16() {
        401 => "Authentication failed (401). Please check your API key".to_string(),
        403 => "Access forbidden (403). Your API key may not have permission".to_string(),
        429 => "Rate limit exceeded (429). Please try again later".to_string(),
        500..=599 => format!("Server error ({}). The API service is experiencing issues", status),
        _ => format!("API request failed ({}): {}", status, body),
    };
    NxdError::provider_transport(provider, message, Some(status.as_u16()))
}

fn send_error(provider: ProviderId, url: &str, err: reqwest::Error) -> NxdError {
    NxdError::provider_transport(
        provider,
        format!("Failed to connect to {}: {}", url, err),
        err.status().map(|s| s.as_u16()),
    )
}

/// `base_url` joined with `endpoint`, adding `/v1` when the base lacks it
fn build_url(base_url: &str, endpoint: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    if base_url.ends_with("/v1") {
        format!("{}{}", base_url, endpoint)
    } else {
        format!("{}/v1{}", base_url, endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        assert_eq!(
            build_url("https://api.x.ai/v1", "/chat/completions"),
            "https://api.x.ai/v1/chat/completions"
        );
        assert_eq!(
            build_url("http://localhost:8080/", "/messages"),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn test_status_error_mapping() {
        let err = status_error(ProviderId::Grok, StatusCode::TOO_MANY_REQUESTS, "");
        match err {
            NxdError::ProviderTransport { provider, status_code, message } => {
                assert_eq!(provider, ProviderId::Grok);
                assert_eq!(status_code, Some(429));
                assert!(message.contains("Rate limit"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_create_provider_without_key() {
        for id in ProviderId::ALL {
            let provider = create_provider(&ProviderConfig::new(id, None)).unwrap();
            assert_eq!(provider.id(), id);
            assert_eq!(provider.model(), id.default_model());
            assert!(!provider.is_ready());
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_transport_error() {
        let provider = create_provider(&ProviderConfig::new(ProviderId::DeepSeek, None)).unwrap();
        let err = provider.complete("system", "user").await.unwrap_err();
        assert!(matches!(
            err,
            NxdError::ProviderTransport { provider: ProviderId::DeepSeek, .. }
        ));
    }
}
