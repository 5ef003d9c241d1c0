//! Candidate name generation from a seed query
//!
//! Three independent strategies, applied in order:
//! 1. Variations: truncations plus common prefixes/suffixes
//! 2. Enhancement: tech/crypto terms on either side of the seed
//! 3. Thematic: longer domain words appended while the name stays short

use std::collections::HashSet;

use super::validator::{utils::sanitize_query, CandidateName, DomainValidator};

/// Prefixes for direct variations
const VARIATION_PREFIXES: &[&str] = &["my", "get", "the", "use", "go", "try", "pro"];

/// Suffixes for direct variations
const VARIATION_SUFFIXES: &[&str] = &["app", "lab", "hub", "io", "dao", "net"];

/// Terms combined with the seed on both sides
const ENHANCERS: &[&str] = &["ai", "web3", "defi", "nft", "dao", "meta", "crypto", "smart"];

/// Longer domain words appended to the seed
const THEMATIC_WORDS: &[&str] = &["protocol", "network", "chain", "vault", "swap", "pool", "bridge"];

/// Practical length limit for thematic combinations
pub const MAX_THEMATIC_LEN: usize = 15;

/// Seeds at least this long also yield 3- and 4-character truncations
const TRUNCATION_MIN_LEN: usize = 5;

/// Candidate generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Variation,
    Enhancement,
    Thematic,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Variation, Strategy::Enhancement, Strategy::Thematic];

    /// Raw (unvalidated) names this strategy derives from a sanitized seed
    pub fn expand(&self, base: &str) -> Vec<String> {
        match self {
            Strategy::Variation => variations(base),
            Strategy::Enhancement => enhancements(base),
            Strategy::Thematic => thematic(base),
        }
    }
}

fn variations(base: &str) -> Vec<String> {
    let mut names = Vec::new();

    for prefix in VARIATION_PREFIXES {
        names.push(format!("{}{}", prefix, base));
    }

    for suffix in VARIATION_SUFFIXES {
        names.push(format!("{}{}", base, suffix));
    }

    if base.len() >= TRUNCATION_MIN_LEN {
        names.push(base[..3].to_string());
        names.push(base[..4].to_string());
    }

    names
}

fn enhancements(base: &str) -> Vec<String> {
    let mut names = Vec::new();

    for enhancer in ENHANCERS.iter().filter(|e| **e != base) {
        names.push(format!("{}{}", enhancer, base));
        names.push(format!("{}{}", base, enhancer));
    }

    names
}

fn thematic(base: &str) -> Vec<String> {
    THEMATIC_WORDS
        .iter()
        .filter(|word| base.len() + word.len() <= MAX_THEMATIC_LEN)
        .map(|word| format!("{}{}", base, word))
        .collect()
}

/// Generates a bounded, deduplicated candidate list for a seed query
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    overgeneration: usize,
    validator: DomainValidator,
}

impl CandidateGenerator {
    /// `overgeneration` candidates are produced per requested result, since
    /// some will be filtered out as unavailable
    pub fn new(overgeneration: usize) -> Self {
        Self {
            overgeneration: overgeneration.max(1),
            validator: DomainValidator::new(),
        }
    }

    /// Candidates in strategy order, at most `count * overgeneration` of them
    pub fn generate(&self, seed_query: &str, count: usize) -> Vec<CandidateName> {
        let base = sanitize_query(seed_query);
        let limit = count.saturating_mul(self.overgeneration);
        if base.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for strategy in Strategy::ALL {
            for raw in strategy.expand(&base) {
                if candidates.len() >= limit {
                    return candidates;
                }
                // Over-long combinations are dropped rather than reported
                let Ok(name) = self.validator.validate(&raw) else {
                    continue;
                };
                if seen.insert(name.clone()) {
                    candidates.push(name);
                }
            }
        }

        candidates
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new(3)
    }
}
