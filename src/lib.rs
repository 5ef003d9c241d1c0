//! NXD Engine - domain scoring, suggestion ranking and AI provider failover
//!
//! Two cooperating components for the NXD Web3 domain platform:
//! a deterministic scoring and suggestion engine, and an AI gateway that
//! fails over between providers and keeps an audit log of its decisions.

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod types;

// Re-export commonly used types
pub use config::Settings;
pub use error::{NxdError, Result};
pub use types::{
    AvailabilityReport, DecisionLogEntry, DomainCategory, DomainSuggestion, EngineHealth,
    GatewayConfig, GatewayHealth, GatewayResponse, MarketAnalysis, MarketTier, MetricsSnapshot,
    OperationContext, OperationRequest, OperationType, PerformanceMetrics, PriceRecommendations,
    PriceTrend, PricingQuote, ProviderConfig, ProviderHealth, ProviderId, ScoreBreakdown,
    SuggestConfig, TldProfile,
};

// Re-export main functionality
pub use domain::{
    AvailabilityOracle, CandidateName, DomainScorer, RegistryOracle, SuggestionEngine, TldTable,
};
pub use gateway::{AiGateway, CompletionProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
