//! AI gateway with ordered provider failover

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::timeout;

use super::log::DecisionLog;
use super::prompts::{
    render_user_prompt, system_prompt, HEALTH_SYSTEM_PROMPT, HEALTH_USER_PROMPT,
};
use super::providers::{create_provider, CompletionProvider};
use crate::error::{NxdError, Result};
use crate::types::{
    AttemptRecord, DecisionLogEntry, DecisionOutcome, GatewayConfig, GatewayHealth,
    GatewayResponse, MetricsSnapshot, OperationContext, OperationRequest, OperationType,
    PerformanceMetrics, ProviderConfig, ProviderHealth, ProviderId,
};

/// Returned in place of an AI answer when every provider failed
pub const DEGRADED_RESPONSE: &str =
    "AI services are temporarily unavailable. This request requires manual review.";

#[derive(Clone)]
struct RegisteredProvider {
    priority: u32,
    client: Arc<dyn CompletionProvider>,
}

/// Routes operation requests to AI providers, failing over in priority order.
///
/// Cheap to clone; clones share providers, decision log and metrics.
#[derive(Clone)]
pub struct AiGateway {
    providers: Arc<RwLock<HashMap<ProviderId, RegisteredProvider>>>,
    config: GatewayConfig,
    log: Arc<DecisionLog>,
    metrics: Arc<PerformanceMetrics>,
}

impl AiGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
            log: Arc::new(DecisionLog::new(config.decision_log_capacity)),
            config,
            metrics: Arc::new(PerformanceMetrics::new()),
        }
    }

    /// Gateway with an HTTP client for every configured provider
    pub fn from_configs(config: GatewayConfig, providers: &[ProviderConfig]) -> Result<Self> {
        let gateway = Self::new(config);
        for provider in providers {
            gateway.add_provider(provider)?;
        }
        Ok(gateway)
    }

    /// Share a metrics sink with other components
    pub fn with_metrics(mut self, metrics: Arc<PerformanceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Create and register the HTTP client for `config`
    pub fn add_provider(&self, config: &ProviderConfig) -> Result<()> {
        let client = create_provider(config)?;
        self.register(client, config.priority);
        Ok(())
    }

    /// Register a provider client, replacing any with the same id
    pub fn register(&self, client: Arc<dyn CompletionProvider>, priority: u32) {
        let id = client.id();
        self.providers
            .write()
            .insert(id, RegisteredProvider { priority, client });
        tracing::debug!(provider = %id, priority = %priority, "Registered AI provider");
    }

    /// Registered providers in priority order
    pub fn providers(&self) -> Vec<ProviderId> {
        self.ordered_providers().into_iter().map(|(id, _)| id).collect()
    }

    pub fn has_provider(&self, id: ProviderId) -> bool {
        self.providers.read().contains_key(&id)
    }

    /// Handle an operation given by name, as the route layer receives it
    pub async fn invoke_named(
        &self,
        operation: &str,
        context: OperationContext,
        preferred: Option<&str>,
    ) -> Result<GatewayResponse> {
        let operation: OperationType = operation.parse()?;
        let preferred = preferred.map(str::parse::<ProviderId>).transpose()?;
        self.invoke(&OperationRequest::new(operation, context), preferred)
            .await
    }

    /// Serve `request` from the preferred provider, or fail over.
    ///
    /// Provider failures never surface as `Err`: when every provider fails the
    /// result has `success == false` and [`DEGRADED_RESPONSE`]. Exactly one
    /// decision log entry is written once the chain finishes; a dropped
    /// future writes none.
    pub async fn invoke(
        &self,
        request: &OperationRequest,
        preferred: Option<ProviderId>,
    ) -> Result<GatewayResponse> {
        let operation = request.operation;
        let primary = preferred.unwrap_or_else(|| operation.default_provider());
        let chain = self.failover_chain(primary);

        self.metrics.increment_invocations();

        if !chain.iter().any(|(id, _)| *id == primary) {
            tracing::debug!(
                operation = %operation,
                provider = %primary,
                "Preferred provider not registered, starting with fallbacks"
            );
        }

        let system = system_prompt(operation);
        let user = render_user_prompt(operation, &request.context);

        let overall_start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.total_timeout;
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(chain.len());
        let mut served: Option<(ProviderId, String)> = None;

        for (id, client) in chain {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                tracing::warn!(
                    operation = %operation,
                    attempted = %attempts.len(),
                    "Aggregate timeout reached, abandoning failover chain"
                );
                break;
            }
            let budget = remaining.min(self.config.attempt_timeout);

            let attempt_start = Instant::now();
            let result = match timeout(budget, client.complete(system, &user)).await {
                Ok(result) => result,
                Err(_) => Err(NxdError::timeout(format!("{} completion", id), budget)),
            };
            let duration_ms = attempt_start.elapsed().as_millis() as u64;

            match result {
                Ok(text) => {
                    attempts.push(AttemptRecord {
                        provider: id,
                        succeeded: true,
                        error: None,
                        duration_ms,
                    });
                    served = Some((id, text));
                    break;
                }
                Err(e) => {
                    self.metrics.increment_provider_failures();
                    tracing::warn!(
                        operation = %operation,
                        provider = %id,
                        error = %e,
                        duration_ms = %duration_ms,
                        "AI provider attempt failed"
                    );
                    attempts.push(AttemptRecord {
                        provider: id,
                        succeeded: false,
                        error: Some(e.to_string()),
                        duration_ms,
                    });
                }
            }
        }

        let timestamp = Utc::now();
        let (provider, response, outcome) = match served {
            Some((id, text)) => (Some(id), text, DecisionOutcome::Served),
            None => (None, DEGRADED_RESPONSE.to_string(), DecisionOutcome::Exhausted),
        };
        let fallback_used = provider.map_or(false, |id| id != primary);

        let log_id = self.log.append(DecisionLogEntry {
            id: 0,
            timestamp,
            operation,
            provider,
            outcome,
            context: request.context.clone(),
            response: response.clone(),
            approval_required: request.approval_required,
            admin_override: None,
        });

        match provider {
            Some(id) => {
                if fallback_used {
                    self.metrics.increment_fallbacks();
                }
                tracing::info!(
                    operation = %operation,
                    provider = %id,
                    fallback_used = %fallback_used,
                    attempts = %attempts.len(),
                    duration_ms = %overall_start.elapsed().as_millis(),
                    log_id = %log_id,
                    "AI operation completed"
                );
            }
            None => {
                self.metrics.increment_exhausted();
                tracing::warn!(
                    operation = %operation,
                    attempts = %attempts.len(),
                    duration_ms = %overall_start.elapsed().as_millis(),
                    log_id = %log_id,
                    "All AI providers failed, returning degraded response"
                );
            }
        }

        Ok(GatewayResponse {
            success: provider.is_some(),
            operation,
            provider,
            response,
            fallback_used,
            attempts,
            log_id,
            timestamp,
        })
    }

    /// `primary` first if registered, then every other provider by priority
    fn failover_chain(&self, primary: ProviderId) -> Vec<(ProviderId, Arc<dyn CompletionProvider>)> {
        let mut ordered = self.ordered_providers();
        if let Some(pos) = ordered.iter().position(|(id, _)| *id == primary) {
            let first = ordered.remove(pos);
            ordered.insert(0, first);
        }
        ordered
    }

    /// Clone the clients out so no lock is held across an await
    fn ordered_providers(&self) -> Vec<(ProviderId, Arc<dyn CompletionProvider>)> {
        let providers = self.providers.read();
        let mut entries: Vec<(ProviderId, &RegisteredProvider)> =
            providers.iter().map(|(id, p)| (*id, p)).collect();
        entries.sort_by_key(|(id, p)| (p.priority, id.default_priority()));
        entries
            .into_iter()
            .map(|(id, p)| (id, Arc::clone(&p.client)))
            .collect()
    }

    /// Most recent `limit` decisions, optionally for one operation, newest last
    pub fn get_decision_logs(
        &self,
        operation: Option<OperationType>,
        limit: usize,
    ) -> Vec<DecisionLogEntry> {
        self.log.recent(operation, limit)
    }

    /// Attach an admin decision to a logged entry
    pub fn override_decision(
        &self,
        log_id: u64,
        admin_decision: Value,
        justification: &str,
    ) -> Result<DecisionLogEntry> {
        let entry = self
            .log
            .override_entry(log_id, admin_decision, justification)?;
        tracing::info!(log_id = %log_id, justification = %justification, "AI decision overridden");
        Ok(entry)
    }

    pub fn decision_log_len(&self) -> usize {
        self.log.len()
    }

    /// Probe every provider once, without failover and without logging a
    /// decision
    pub async fn health_check(&self) -> GatewayHealth {
        let providers = self.ordered_providers();
        let probes = providers.iter().map(|(id, client)| async move {
            let status = match timeout(
                self.config.attempt_timeout,
                client.complete(HEALTH_SYSTEM_PROMPT, HEALTH_USER_PROMPT),
            )
            .await
            {
                Ok(Ok(text)) if text.contains("OK") => ProviderHealth::Healthy,
                Ok(Ok(_)) => ProviderHealth::Degraded,
                Ok(Err(e)) => ProviderHealth::Error(e.to_string()),
                Err(_) => ProviderHealth::Error(format!(
                    "timed out after {}ms",
                    self.config.attempt_timeout.as_millis()
                )),
            };
            (*id, status)
        });
        let statuses = join_all(probes).await;

        let healthy = statuses
            .iter()
            .any(|(_, status)| *status == ProviderHealth::Healthy);

        tracing::info!(
            healthy = %healthy,
            providers = %statuses.len(),
            "AI gateway health check completed"
        );

        GatewayHealth {
            healthy,
            providers: statuses,
            decision_log_count: self.log.len(),
        }
    }

    pub fn get_metrics(&self) -> Arc<PerformanceMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }
}

impl Default for AiGateway {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    enum Behaviour {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct FakeProvider {
        id: ProviderId,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(id: ProviderId, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                id,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail => Err(NxdError::provider_transport(self.id, "boom", Some(503))),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }

        fn id(&self) -> ProviderId {
            self.id
        }

        fn model(&self) -> &str {
            "fake"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    fn quick_config() -> GatewayConfig {
        GatewayConfig {
            attempt_timeout: Duration::from_millis(50),
            total_timeout: Duration::from_secs(5),
            decision_log_capacity: 1000,
        }
    }

    fn request(operation: OperationType) -> OperationRequest {
        let mut context = OperationContext::new();
        context.insert("domain_name".to_string(), json!("vault"));
        OperationRequest::new(operation, context)
    }

    #[tokio::test]
    async fn test_default_provider_serves() {
        let gateway = AiGateway::new(quick_config());
        let grok = FakeProvider::new(ProviderId::Grok, Behaviour::Reply("{\"approved\":true}"));
        let openai = FakeProvider::new(ProviderId::OpenAi, Behaviour::Reply("nope"));
        gateway.register(grok.clone(), 1);
        gateway.register(openai.clone(), 2);

        let response = gateway
            .invoke(&request(OperationType::DomainApproval), None)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.provider, Some(ProviderId::Grok));
        assert!(!response.fallback_used);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn test_preferred_overrides_default() {
        let gateway = AiGateway::new(quick_config());
        gateway.register(FakeProvider::new(ProviderId::Grok, Behaviour::Reply("grok")), 1);
        gateway.register(FakeProvider::new(ProviderId::Poe, Behaviour::Reply("poe")), 5);

        let response = gateway
            .invoke(&request(OperationType::DomainApproval), Some(ProviderId::Poe))
            .await
            .unwrap();
        assert_eq!(response.provider, Some(ProviderId::Poe));
        assert_eq!(response.response, "poe");
    }

    #[tokio::test]
    async fn test_fallback_in_priority_order() {
        let gateway = AiGateway::new(quick_config());
        let anthropic = FakeProvider::new(ProviderId::Anthropic, Behaviour::Fail);
        let deepseek = FakeProvider::new(ProviderId::DeepSeek, Behaviour::Reply("deepseek"));
        let grok = FakeProvider::new(ProviderId::Grok, Behaviour::Fail);
        gateway.register(anthropic.clone(), 3);
        gateway.register(deepseek.clone(), 4);
        gateway.register(grok.clone(), 1);

        let response = gateway
            .invoke(&request(OperationType::UserSupport), None)
            .await
            .unwrap();

        let order: Vec<ProviderId> = response.attempts.iter().map(|a| a.provider).collect();
        assert_eq!(order, vec![ProviderId::Anthropic, ProviderId::Grok, ProviderId::DeepSeek]);
        assert_eq!(response.provider, Some(ProviderId::DeepSeek));
        assert!(response.fallback_used);
        assert_eq!(gateway.get_metrics_snapshot().fallbacks, 1);
        assert_eq!(gateway.get_metrics_snapshot().provider_failures, 2);
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out() {
        let gateway = AiGateway::new(quick_config());
        gateway.register(FakeProvider::new(ProviderId::Grok, Behaviour::Hang), 1);
        gateway.register(FakeProvider::new(ProviderId::OpenAi, Behaviour::Reply("ok")), 2);

        let response = gateway
            .invoke(&request(OperationType::AnomalyDetection), None)
            .await
            .unwrap();
        assert_eq!(response.provider, Some(ProviderId::OpenAi));
        let error = response.attempts[0].error.as_deref().unwrap_or("");
        assert!(error.contains("timed out after 50ms"), "{}", error);
    }

    #[tokio::test]
    async fn test_aggregate_timeout_bounds_chain() {
        let config = GatewayConfig {
            attempt_timeout: Duration::from_millis(80),
            total_timeout: Duration::from_millis(100),
            decision_log_capacity: 10,
        };
        let gateway = AiGateway::new(config);
        for id in [ProviderId::Grok, ProviderId::OpenAi, ProviderId::Anthropic] {
            gateway.register(FakeProvider::new(id, Behaviour::Hang), id.default_priority());
        }

        let started = Instant::now();
        let response = gateway
            .invoke(&request(OperationType::FeeAdjustment), None)
            .await
            .unwrap();

        assert!(!response.success);
        assert!(response.attempts.len() < 3);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(gateway.decision_log_len(), 1);
    }

    #[tokio::test]
    async fn test_no_providers_is_degraded() {
        let gateway = AiGateway::new(quick_config());
        let response = gateway
            .invoke(&request(OperationType::MarketAnalysis), None)
            .await
            .unwrap();
        assert!(!response.success);
        assert!(response.attempts.is_empty());
        assert_eq!(response.response, DEGRADED_RESPONSE);

        let err = response.into_result().unwrap_err();
        assert!(matches!(err, NxdError::AllProvidersExhausted { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_invoke_writes_nothing() {
        let gateway = AiGateway::new(GatewayConfig {
            attempt_timeout: Duration::from_secs(30),
            total_timeout: Duration::from_secs(60),
            decision_log_capacity: 10,
        });
        gateway.register(FakeProvider::new(ProviderId::Grok, Behaviour::Hang), 1);

        let req = request(OperationType::DomainApproval);
        let abandoned = tokio::time::timeout(Duration::from_millis(50), gateway.invoke(&req, None)).await;
        assert!(abandoned.is_err());
        assert_eq!(gateway.decision_log_len(), 0);
    }

    #[tokio::test]
    async fn test_invoke_named_rejects_unknown_operation() {
        let gateway = AiGateway::new(quick_config());
        let grok = FakeProvider::new(ProviderId::Grok, Behaviour::Reply("ok"));
        gateway.register(grok.clone(), 1);

        let err = gateway
            .invoke_named("launch_rocket", OperationContext::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, NxdError::UnknownOperationType { .. }));
        assert_eq!(grok.calls(), 0);
        assert_eq!(gateway.decision_log_len(), 0);

        let response = gateway
            .invoke_named("fee-adjustment", OperationContext::new(), Some("xai"))
            .await
            .unwrap();
        assert_eq!(response.operation, OperationType::FeeAdjustment);
    }

    #[tokio::test]
    async fn test_approval_flag_logged() {
        let gateway = AiGateway::new(quick_config());
        gateway.register(FakeProvider::new(ProviderId::Grok, Behaviour::Reply("ok")), 1);

        let req = request(OperationType::GovernanceProposal).requires_approval(true);
        let response = gateway.invoke(&req, None).await.unwrap();

        let logs = gateway.get_decision_logs(Some(OperationType::GovernanceProposal), 10);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, response.log_id);
        assert!(logs[0].approval_required);
        assert_eq!(logs[0].context["domain_name"], json!("vault"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let gateway = AiGateway::new(quick_config());
        gateway.register(FakeProvider::new(ProviderId::Grok, Behaviour::Reply("OK")), 1);
        gateway.register(FakeProvider::new(ProviderId::OpenAi, Behaviour::Reply("hello")), 2);
        gateway.register(FakeProvider::new(ProviderId::Poe, Behaviour::Fail), 5);

        let health = gateway.health_check().await;
        assert!(health.healthy);
        assert_eq!(health.providers[0], (ProviderId::Grok, ProviderHealth::Healthy));
        assert_eq!(health.providers[1], (ProviderId::OpenAi, ProviderHealth::Degraded));
        assert!(matches!(health.providers[2].1, ProviderHealth::Error(_)));
        assert_eq!(health.decision_log_count, 0);
        assert_eq!(gateway.decision_log_len(), 0);
    }
}
