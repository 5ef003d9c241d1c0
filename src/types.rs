//! Core types and structures for nxd-engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::NxdError;

/// Quality band of a scored name, derived from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainCategory {
    Premium,
    Standard,
    Creative,
}

impl DomainCategory {
    /// Composite score at or above which a name is premium.
    pub const PREMIUM_THRESHOLD: f64 = 80.0;
    /// Composite score at or above which a name is standard.
    pub const STANDARD_THRESHOLD: f64 = 60.0;

    pub fn from_score(overall_score: f64) -> Self {
        if overall_score >= Self::PREMIUM_THRESHOLD {
            DomainCategory::Premium
        } else if overall_score >= Self::STANDARD_THRESHOLD {
            DomainCategory::Standard
        } else {
            DomainCategory::Creative
        }
    }
}

impl std::fmt::Display for DomainCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DomainCategory::Premium => "premium",
            DomainCategory::Standard => "standard",
            DomainCategory::Creative => "creative",
        };
        f.pad(label)
    }
}

/// Result of scoring a candidate name. All scores are on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub name: String,
    pub length_score: f64,
    pub brandability_score: f64,
    pub keyword_score: f64,
    pub memorability_score: f64,
    pub overall_score: f64,
    /// Estimated market value in ETH
    pub market_value: f64,
    pub reasons: Vec<String>,
}

impl ScoreBreakdown {
    pub fn category(&self) -> DomainCategory {
        DomainCategory::from_score(self.overall_score)
    }
}

/// Pricing profile of a top-level domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TldProfile {
    pub tld: String,
    /// Registration price in ETH
    pub base_price: f64,
    pub premium_multiplier: f64,
    pub renewal_price: f64,
    pub is_premium: bool,
    pub description: String,
}

/// A scored, available name under a specific TLD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSuggestion {
    pub name: String,
    pub tld: String,
    pub full_domain: String,
    pub available: bool,
    pub score: ScoreBreakdown,
    pub category: DomainCategory,
    pub estimated_value: f64,
}

impl DomainSuggestion {
    pub fn overall_score(&self) -> f64 {
        self.score.overall_score
    }
}

/// Registration pricing for a single name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingQuote {
    pub registration_eth: f64,
    pub renewal_eth: f64,
    pub is_premium: bool,
    pub estimated_market_value: f64,
}

/// Outcome of checking one name under one TLD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub full_domain: String,
    pub name: String,
    pub tld: String,
    pub available: bool,
    pub score: Option<ScoreBreakdown>,
    pub pricing: PricingQuote,
    pub alternatives: Vec<DomainSuggestion>,
}

/// Direction of recent sale prices for a TLD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

impl PriceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTrend::Increasing => "increasing",
            PriceTrend::Stable => "stable",
            PriceTrend::Decreasing => "decreasing",
        }
    }

    /// Factor applied to market value for listing prices
    pub fn multiplier(&self) -> f64 {
        match self {
            PriceTrend::Increasing => 1.2,
            PriceTrend::Stable => 1.0,
            PriceTrend::Decreasing => 0.8,
        }
    }
}

impl std::fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTrend {
    type Err = NxdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "increasing" | "up" => Ok(PriceTrend::Increasing),
            "stable" | "flat" => Ok(PriceTrend::Stable),
            "decreasing" | "down" => Ok(PriceTrend::Decreasing),
            other => Err(NxdError::config(format!(
                "unknown price trend '{}' (expected increasing, stable or decreasing)",
                other
            ))),
        }
    }
}

/// Coarse rating used for investment potential and liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTier {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for MarketTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MarketTier::High => "high",
            MarketTier::Medium => "medium",
            MarketTier::Low => "low",
        };
        f.pad(label)
    }
}

/// Listing guidance in ETH, derived from a name's market value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecommendations {
    pub suggested_listing_price: f64,
    pub minimum_acceptable_price: f64,
    pub premium_price: f64,
    pub market_adjusted_value: f64,
}

/// Secondary-market view of one name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub full_domain: String,
    pub score: ScoreBreakdown,
    pub price_trend: PriceTrend,
    pub price_recommendations: PriceRecommendations,
    pub investment_potential: MarketTier,
    pub liquidity_estimate: MarketTier,
    pub analyzed_at: DateTime<Utc>,
}

/// Self-test result of the scoring and suggestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub healthy: bool,
    pub supported_tlds: Vec<String>,
    pub oracle: String,
    pub test_score: Option<f64>,
    pub test_suggestions: usize,
    pub error: Option<String>,
}

impl EngineHealth {
    pub fn failed(
        supported_tlds: Vec<String>,
        oracle: String,
        test_score: Option<f64>,
        error: NxdError,
    ) -> Self {
        tracing::warn!(oracle = %oracle, error = %error, "Domain engine health check failed");
        Self {
            healthy: false,
            supported_tlds,
            oracle,
            test_score,
            test_suggestions: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Autonomous operation handled by the AI gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    DomainApproval,
    FeeAdjustment,
    GovernanceProposal,
    MarketAnalysis,
    UserSupport,
    AnomalyDetection,
}

impl OperationType {
    pub const ALL: [OperationType; 6] = [
        OperationType::DomainApproval,
        OperationType::FeeAdjustment,
        OperationType::GovernanceProposal,
        OperationType::MarketAnalysis,
        OperationType::UserSupport,
        OperationType::AnomalyDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::DomainApproval => "domain_approval",
            OperationType::FeeAdjustment => "fee_adjustment",
            OperationType::GovernanceProposal => "governance_proposal",
            OperationType::MarketAnalysis => "market_analysis",
            OperationType::UserSupport => "user_support",
            OperationType::AnomalyDetection => "anomaly_detection",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|op| op.as_str()).collect()
    }

    /// Provider tried first when the caller expresses no preference
    pub fn default_provider(&self) -> ProviderId {
        match self {
            OperationType::MarketAnalysis => ProviderId::OpenAi,
            OperationType::UserSupport => ProviderId::Anthropic,
            OperationType::DomainApproval
            | OperationType::FeeAdjustment
            | OperationType::GovernanceProposal
            | OperationType::AnomalyDetection => ProviderId::Grok,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = NxdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == needle)
            .ok_or_else(|| NxdError::unknown_operation(s))
    }
}

/// AI provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Grok,
    OpenAi,
    Anthropic,
    DeepSeek,
    Poe,
}

impl ProviderId {
    /// Providers in default priority order
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Grok,
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::DeepSeek,
        ProviderId::Poe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Grok => "grok",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Poe => "poe",
        }
    }

    pub fn default_priority(&self) -> u32 {
        match self {
            ProviderId::Grok => 1,
            ProviderId::OpenAi => 2,
            ProviderId::Anthropic => 3,
            ProviderId::DeepSeek => 4,
            ProviderId::Poe => 5,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderId::Grok => "grok-3",
            ProviderId::OpenAi => "gpt-4-turbo-preview",
            ProviderId::Anthropic => "claude-3-opus-20240229",
            ProviderId::DeepSeek => "deepseek-chat",
            ProviderId::Poe => "claude-3-opus",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::Grok => "https://api.x.ai/v1",
            ProviderId::OpenAi => "https://api.openai.com/v1",
            ProviderId::Anthropic => "https://api.anthropic.com/v1",
            ProviderId::DeepSeek => "https://api.deepseek.com/v1",
            ProviderId::Poe => "https://api.poe.com/v1",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderId::Grok => "XAI_API_KEY",
            ProviderId::OpenAi => "OPENAI_API_KEY",
            ProviderId::Anthropic => "ANTHROPIC_API_KEY",
            ProviderId::DeepSeek => "DEEPSEEK_API_KEY",
            ProviderId::Poe => "POE_API_KEY",
        }
    }

    /// Environment variable overriding the model
    pub fn model_var(&self) -> &'static str {
        match self {
            ProviderId::Grok => "XAI_MODEL",
            ProviderId::OpenAi => "OPENAI_MODEL",
            ProviderId::Anthropic => "ANTHROPIC_MODEL",
            ProviderId::DeepSeek => "DEEPSEEK_MODEL",
            ProviderId::Poe => "POE_MODEL",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = NxdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        let needle = match needle.as_str() {
            "xai" => "grok",
            "claude" => "anthropic",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| NxdError::config(format!("Unknown AI provider: {}", s)))
    }
}

/// Static configuration of one AI provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    /// Lower is tried first
    pub priority: u32,
    pub temperature: f32,
}

impl ProviderConfig {
    /// Configuration with the provider's stock model, endpoint and priority
    pub fn new(id: ProviderId, api_key: Option<String>) -> Self {
        Self {
            id,
            model: id.default_model().to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: None,
            max_tokens: 4000,
            priority: id.default_priority(),
            temperature: 0.7,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.id.default_base_url())
    }
}

/// Free-form key/value context rendered into operation prompts
pub type OperationContext = serde_json::Map<String, serde_json::Value>;

/// An autonomous-decision request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: OperationType,
    pub context: OperationContext,
    pub approval_required: bool,
}

impl OperationRequest {
    pub fn new(operation: OperationType, context: OperationContext) -> Self {
        Self {
            operation,
            context,
            approval_required: false,
        }
    }

    pub fn requires_approval(mut self, required: bool) -> Self {
        self.approval_required = required;
        self
    }
}

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Served,
    Exhausted,
}

/// Admin correction attached to a logged decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverride {
    pub timestamp: DateTime<Utc>,
    pub decision: serde_json::Value,
    pub justification: String,
}

/// Audit record of one completed gateway invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: OperationType,
    /// Provider that served the request; `None` when every provider failed
    pub provider: Option<ProviderId>,
    pub outcome: DecisionOutcome,
    pub context: OperationContext,
    pub response: String,
    pub approval_required: bool,
    pub admin_override: Option<AdminOverride>,
}

/// One provider attempt inside an invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider: ProviderId,
    pub succeeded: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// What callers get back from the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    pub success: bool,
    pub operation: OperationType,
    pub provider: Option<ProviderId>,
    pub response: String,
    pub fallback_used: bool,
    pub attempts: Vec<AttemptRecord>,
    pub log_id: u64,
    pub timestamp: DateTime<Utc>,
}

impl GatewayResponse {
    /// Turn a degraded response into `AllProvidersExhausted`
    pub fn into_result(self) -> crate::error::Result<Self> {
        if self.success {
            Ok(self)
        } else {
            let attempted = self.attempts.iter().map(|a| a.provider).collect();
            Err(NxdError::exhausted(self.operation, attempted))
        }
    }
}

/// Provider health as seen by a probe call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum ProviderHealth {
    Healthy,
    Degraded,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub healthy: bool,
    pub providers: Vec<(ProviderId, ProviderHealth)>,
    pub decision_log_count: usize,
}

/// Configuration for the suggestion engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Maximum availability checks in flight
    pub oracle_concurrency: usize,
    pub oracle_timeout: Duration,
    /// Candidates generated per requested result
    pub overgeneration: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            oracle_concurrency: 10,
            oracle_timeout: Duration::from_secs(5),
            overgeneration: 3,
        }
    }
}

/// Configuration for the AI gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub attempt_timeout: Duration,
    pub total_timeout: Duration,
    pub decision_log_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(20),
            total_timeout: Duration::from_secs(60),
            decision_log_capacity: 1000,
        }
    }
}

/// Lock-free counters shared by the engine and the gateway
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    invocations: AtomicU64,
    provider_failures: AtomicU64,
    fallbacks: AtomicU64,
    exhausted: AtomicU64,
    availability_checks: AtomicU64,
    availability_errors: AtomicU64,
    total_check_time_ms: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_provider_failures(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_availability_check(&self, duration_ms: u64) {
        self.availability_checks.fetch_add(1, Ordering::Relaxed);
        self.total_check_time_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn increment_availability_errors(&self) {
        self.availability_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            availability_checks: self.availability_checks.load(Ordering::Relaxed),
            availability_errors: self.availability_errors.load(Ordering::Relaxed),
            total_check_time_ms: self.total_check_time_ms.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PerformanceMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub provider_failures: u64,
    pub fallbacks: u64,
    pub exhausted: u64,
    pub availability_checks: u64,
    pub availability_errors: u64,
    pub total_check_time_ms: u64,
}

impl MetricsSnapshot {
    pub fn avg_check_time_ms(&self) -> f64 {
        if self.availability_checks == 0 {
            0.0
        } else {
            self.total_check_time_ms as f64 / self.availability_checks as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds() {
        assert_eq!(DomainCategory::from_score(80.0), DomainCategory::Premium);
        assert_eq!(DomainCategory::from_score(79.99), DomainCategory::Standard);
        assert_eq!(DomainCategory::from_score(60.0), DomainCategory::Standard);
        assert_eq!(DomainCategory::from_score(59.99), DomainCategory::Creative);
        assert_eq!(DomainCategory::from_score(0.0), DomainCategory::Creative);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("domain_approval".parse::<OperationType>().unwrap(), OperationType::DomainApproval);
        assert_eq!("Market-Analysis".parse::<OperationType>().unwrap(), OperationType::MarketAnalysis);
        let err = "launch_rocket".parse::<OperationType>().unwrap_err();
        assert!(matches!(err, NxdError::UnknownOperationType { .. }));
    }

    #[test]
    fn test_default_routes() {
        assert_eq!(OperationType::UserSupport.default_provider(), ProviderId::Anthropic);
        assert_eq!(OperationType::MarketAnalysis.default_provider(), ProviderId::OpenAi);
        assert_eq!(OperationType::AnomalyDetection.default_provider(), ProviderId::Grok);
    }

    #[test]
    fn test_provider_parsing_and_priority() {
        assert_eq!("xai".parse::<ProviderId>().unwrap(), ProviderId::Grok);
        assert_eq!("Claude".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert!("bard".parse::<ProviderId>().is_err());

        let priorities: Vec<u32> = ProviderId::ALL.iter().map(|p| p.default_priority()).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_provider_config_drops_blank_key() {
        let config = ProviderConfig::new(ProviderId::Poe, Some("  ".to_string()));
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url(), "https://api.poe.com/v1");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OperationType::FeeAdjustment).unwrap();
        assert_eq!(json, "\"fee_adjustment\"");
        let json = serde_json::to_string(&DomainCategory::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = PerformanceMetrics::new();
        metrics.record_availability_check(10);
        metrics.record_availability_check(30);
        metrics.increment_fallbacks();
        let stats = metrics.get_stats();
        assert_eq!(stats.availability_checks, 2);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.avg_check_time_ms(), 20.0);
    }
}
