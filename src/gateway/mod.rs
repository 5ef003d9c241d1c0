//! AI provider gateway
//!
//! Routes autonomous-operation requests to AI providers with ordered failover
//! and keeps a bounded audit log of every decision.

pub mod failover;
pub mod log;
pub mod prompts;
pub mod providers;

// Re-export main functionality
pub use failover::{AiGateway, DEGRADED_RESPONSE};
pub use log::DecisionLog;
pub use providers::{create_provider, CompletionProvider};

/// Provider names accepted on the command line
pub fn available_providers() -> Vec<&'static str> {
    crate::types::ProviderId::ALL
        .iter()
        .map(|p| p.as_str())
        .collect()
}
