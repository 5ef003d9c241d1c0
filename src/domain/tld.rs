//! TLD pricing table.
//!
//! A small static mapping, loaded once and shared read-only between the scorer
//! and the suggestion engine.

use std::collections::BTreeMap;

use crate::error::{NxdError, Result};
use crate::types::{PricingQuote, ScoreBreakdown, TldProfile};

/// TLD used when a caller gives none
pub const DEFAULT_TLD: &str = "nxd";

/// Composite score at or above which registration uses the premium multiplier
pub const PREMIUM_PRICING_THRESHOLD: f64 = 75.0;

/// (tld, base price, premium multiplier, renewal price, description)
const NXD_TLDS: &[(&str, f64, f64, f64, &str)] = &[
    ("nxd", 0.01, 10.0, 0.005, "NXD Protocol native domain"),
    ("web3", 0.008, 5.0, 0.004, "Web3 focused domain"),
    ("dao", 0.012, 8.0, 0.006, "Decentralized organization domain"),
    ("defi", 0.015, 12.0, 0.008, "DeFi protocol domain"),
    ("nft", 0.010, 6.0, 0.005, "NFT collection domain"),
];

/// Read-only lookup of [`TldProfile`]s
#[derive(Debug, Clone)]
pub struct TldTable {
    profiles: BTreeMap<String, TldProfile>,
}

impl TldTable {
    /// Build a table from explicit profiles
    pub fn new(profiles: impl IntoIterator<Item = TldProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.tld.to_lowercase(), p))
                .collect(),
        }
    }

    pub fn get(&self, tld: &str) -> Option<&TldProfile> {
        self.profiles.get(&tld.to_lowercase())
    }

    /// Profile for `tld`, or `UnsupportedTld`
    pub fn require(&self, tld: &str) -> Result<&TldProfile> {
        self.get(tld).ok_or_else(|| NxdError::unsupported_tld(tld))
    }

    pub fn contains(&self, tld: &str) -> bool {
        self.get(tld).is_some()
    }

    /// Supported TLDs in sorted order
    pub fn tlds(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &TldProfile> {
        self.profiles.values()
    }

    /// Registration and renewal pricing for a scored name
    pub fn quote(&self, tld: &str, score: Option<&ScoreBreakdown>) -> Result<PricingQuote> {
        let profile = self.require(tld)?;

        let is_premium = score
            .map(|s| s.overall_score >= PREMIUM_PRICING_THRESHOLD)
            .unwrap_or(false);

        let registration_eth = if is_premium {
            profile.base_price * profile.premium_multiplier
        } else {
            profile.base_price
        };

        Ok(PricingQuote {
            registration_eth,
            renewal_eth: profile.renewal_price,
            is_premium,
            estimated_market_value: score.map(|s| s.market_value).unwrap_or(registration_eth),
        })
    }
}

impl Default for TldTable {
    fn default() -> Self {
        Self::new(NXD_TLDS.iter().map(
            |&(tld, base_price, premium_multiplier, renewal_price, description)| TldProfile {
                tld: tld.to_string(),
                base_price,
                premium_multiplier,
                renewal_price,
                is_premium: true,
                description: description.to_string(),
            },
        ))
    }
}
