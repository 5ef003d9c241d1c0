//! Error handling for nxd-engine

use crate::types::{OperationType, ProviderId};
use std::time::Duration;
use thiserror::Error;

/// Main error type for nxd-engine
#[derive(Error, Debug, Clone)]
pub enum NxdError {
    #[error("Invalid domain name '{name}': {reason}")]
    InvalidNameFormat { name: String, reason: String },

    #[error("Unsupported TLD: .{tld}")]
    UnsupportedTld { tld: String },

    #[error("Unknown operation type: {operation}")]
    UnknownOperationType { operation: String },

    #[error("Provider error ({provider}): {message}")]
    ProviderTransport {
        provider: ProviderId,
        message: String,
        status_code: Option<u16>,
    },

    #[error("All AI providers failed for {operation} (attempted: {})", format_providers(.attempted))]
    AllProvidersExhausted {
        operation: OperationType,
        attempted: Vec<ProviderId>,
    },

    #[error("Decision log entry not found: {id}")]
    LogEntryNotFound { id: u64 },

    #[error("Availability check failed for '{domain}': {message}")]
    Oracle { domain: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        url: Option<String>,
    },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_providers(providers: &[ProviderId]) -> String {
    if providers.is_empty() {
        return "none".to_string();
    }
    providers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl NxdError {
    /// Create an invalid name error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNameFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_tld(tld: impl Into<String>) -> Self {
        Self::UnsupportedTld { tld: tld.into() }
    }

    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperationType {
            operation: operation.into(),
        }
    }

    /// Create a provider transport error
    pub fn provider_transport(
        provider: ProviderId,
        message: impl Into<String>,
        status_code: Option<u16>,
    ) -> Self {
        Self::ProviderTransport {
            provider,
            message: message.into(),
            status_code,
        }
    }

    pub fn exhausted(operation: OperationType, attempted: Vec<ProviderId>) -> Self {
        Self::AllProvidersExhausted {
            operation,
            attempted,
        }
    }

    pub fn log_entry_not_found(id: u64) -> Self {
        Self::LogEntryNotFound { id }
    }

    /// Create an availability oracle error
    pub fn oracle(domain: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Oracle {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(
        message: impl Into<String>,
        status_code: Option<u16>,
        url: Option<String>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            status_code,
            url,
        }
    }

    /// Create a timeout error; sub-second budgets keep their precision
    pub fn timeout(operation: impl Into<String>, budget: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: budget.as_millis() as u64,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidNameFormat { name, reason } => {
                format!("❌ '{}' is not a valid domain label: {}\n💡 Use 1-63 letters, digits or hyphens, not starting or ending with a hyphen", name, reason)
            }
            Self::UnsupportedTld { tld } => {
                format!("❌ .{} is not offered\n💡 Supported TLDs: nxd, web3, dao, defi, nft", tld)
            }
            Self::UnknownOperationType { operation } => {
                format!("❌ Unknown AI operation '{}'\n💡 Use one of: {}", operation, OperationType::names().join(", "))
            }
            Self::ProviderTransport { provider, message, .. } => {
                format!("❌ AI provider ({}) error: {}\n💡 Check your API key and rate limits", provider, message)
            }
            Self::AllProvidersExhausted { .. } => {
                format!("⚠️  {}\n💡 Fall back to manual review", self)
            }
            Self::LogEntryNotFound { id } => {
                format!("❌ No decision log entry with id {}", id)
            }
            Self::Oracle { domain, message } => {
                format!("⚠️  Could not check availability of '{}': {}", domain, message)
            }
            Self::Config { message } => {
                format!("❌ Configuration problem: {}\n💡 Check your .env file or environment", message)
            }
            Self::Network { message, status_code, .. } => {
                let status = status_code.map_or(String::new(), |c| format!(" ({})", c));
                format!("❌ Network error{}: {}\n💡 Check your internet connection", status, message)
            }
            Self::Timeout { operation, timeout_ms } => {
                format!("⏱️  Operation '{}' timed out after {}ms\n💡 Try increasing the timeout", operation, timeout_ms)
            }
            Self::Internal { message } => {
                format!("❌ Internal error: {}\n💡 This is a bug, please report it", message)
            }
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NxdError>;

/// Helper macros for common error patterns
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::NxdError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::NxdError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! invalid_name {
    ($name:expr, $msg:expr) => {
        $crate::error::NxdError::invalid_name($name, $msg)
    };
    ($name:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::NxdError::invalid_name($name, format!($fmt, $($arg)*))
    };
}
