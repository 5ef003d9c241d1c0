//! Availability oracle abstraction and the in-memory registry

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{NxdError, Result};

/// Labels that can never be registered under any TLD
pub const RESERVED_NAMES: &[&str] = &[
    "test", "example", "demo", "admin", "api", "www", "mail", "bitcoin", "ethereum", "crypto",
    "defi", "nft", "dao",
];

/// Answers whether a fully qualified name is still free
#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    /// `Err` means the oracle could not answer, not that the name is taken
    async fn is_available(&self, fqdn: &str) -> Result<bool>;

    /// Oracle name for logs
    fn name(&self) -> &str;
}

/// In-memory registry of taken names, seeded with [`RESERVED_NAMES`]
#[derive(Debug)]
pub struct RegistryOracle {
    registered: RwLock<HashSet<String>>,
}

impl RegistryOracle {
    pub fn new() -> Self {
        Self {
            registered: RwLock::new(HashSet::new()),
        }
    }

    /// Mark a fully qualified name as taken. Returns false if it already was.
    pub fn register(&self, fqdn: &str) -> Result<bool> {
        let fqdn = normalize(fqdn)?;
        Ok(self.registered.write().insert(fqdn))
    }

    pub fn registered_count(&self) -> usize {
        self.registered.read().len()
    }
}

impl Default for RegistryOracle {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(fqdn: &str) -> Result<String> {
    let fqdn = fqdn.trim().trim_end_matches('.').to_ascii_lowercase();
    match fqdn.split_once('.') {
        Some((label, tld)) if !label.is_empty() && !tld.is_empty() => Ok(fqdn),
        _ => Err(NxdError::oracle(fqdn, "expected a fully qualified name like 'name.nxd'")),
    }
}

#[async_trait]
impl AvailabilityOracle for RegistryOracle {
    async fn is_available(&self, fqdn: &str) -> Result<bool> {
        let fqdn = normalize(fqdn)?;
        let label = fqdn.split('.').next().unwrap_or_default();

        if RESERVED_NAMES.contains(&label) {
            return Ok(false);
        }

        Ok(!self.registered.read().contains(&fqdn))
    }

    fn name(&self) -> &str {
        "registry"
    }
}
