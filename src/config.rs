//! Environment-driven settings

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{NxdError, Result};
use crate::types::{GatewayConfig, ProviderConfig, ProviderId, SuggestConfig};

pub const ATTEMPT_TIMEOUT_VAR: &str = "NXD_AI_ATTEMPT_TIMEOUT_SECS";
pub const TOTAL_TIMEOUT_VAR: &str = "NXD_AI_TOTAL_TIMEOUT_SECS";
pub const LOG_CAPACITY_VAR: &str = "NXD_DECISION_LOG_CAPACITY";
pub const ORACLE_CONCURRENCY_VAR: &str = "NXD_ORACLE_CONCURRENCY";
pub const ORACLE_TIMEOUT_VAR: &str = "NXD_ORACLE_TIMEOUT_SECS";

/// Everything the engine and gateway read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// One entry per known provider, in priority order
    pub providers: Vec<ProviderConfig>,
    pub gateway: GatewayConfig,
    pub suggest: SuggestConfig,
}

impl Settings {
    /// Read the process environment, after loading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read a dotenv file without touching the process environment
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let iter = dotenv::from_path_iter(path)
            .map_err(|e| NxdError::config(format!("Cannot read {}: {}", path.display(), e)))?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item
                .map_err(|e| NxdError::config(format!("Malformed line in {}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build settings from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let providers = ProviderId::ALL
            .iter()
            .map(|&id| provider_config(id, &lookup))
            .collect();

        let defaults = GatewayConfig::default();
        let gateway = GatewayConfig {
            attempt_timeout: secs(&lookup, ATTEMPT_TIMEOUT_VAR, defaults.attempt_timeout)?,
            total_timeout: secs(&lookup, TOTAL_TIMEOUT_VAR, defaults.total_timeout)?,
            decision_log_capacity: positive(&lookup, LOG_CAPACITY_VAR, defaults.decision_log_capacity)?,
        };

        if gateway.total_timeout < gateway.attempt_timeout {
            tracing::warn!(
                attempt_secs = %gateway.attempt_timeout.as_secs(),
                total_secs = %gateway.total_timeout.as_secs(),
                "Aggregate AI timeout is shorter than the per-attempt timeout"
            );
        }

        let defaults = SuggestConfig::default();
        let suggest = SuggestConfig {
            oracle_concurrency: positive(&lookup, ORACLE_CONCURRENCY_VAR, defaults.oracle_concurrency)?,
            oracle_timeout: secs(&lookup, ORACLE_TIMEOUT_VAR, defaults.oracle_timeout)?,
            overgeneration: defaults.overgeneration,
        };

        Ok(Self {
            providers,
            gateway,
            suggest,
        })
    }

    /// Providers that have an API key
    pub fn configured_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.api_key.is_some())
    }

    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: ProviderId::ALL
                .iter()
                .map(|&id| ProviderConfig::new(id, None))
                .collect(),
            gateway: GatewayConfig::default(),
            suggest: SuggestConfig::default(),
        }
    }
}

/// `XAI_API_KEY` -> `XAI_BASE_URL`
fn base_url_var(id: ProviderId) -> String {
    id.api_key_var().replace("_API_KEY", "_BASE_URL")
}

fn provider_config<F>(id: ProviderId, lookup: &F) -> ProviderConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ProviderConfig::new(id, lookup(id.api_key_var()));

    if let Some(model) = non_empty(lookup(id.model_var())) {
        config = config.with_model(model);
    }
    if let Some(base_url) = non_empty(lookup(&base_url_var(id))) {
        config = config.with_base_url(base_url);
    }

    config
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup(key)) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| crate::config_error!("{} has invalid value '{}': {}", key, raw, e)),
    }
}

fn positive<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, usize>(lookup, key)? {
        Some(0) => Err(crate::config_error!("{} must be greater than zero", key)),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

fn secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, u64>(lookup, key)? {
        Some(0) => Err(crate::config_error!("{} must be greater than zero", key)),
        Some(value) => Ok(Duration::from_secs(value)),
        None => Ok(default),
    }
}
