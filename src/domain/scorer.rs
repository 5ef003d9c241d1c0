//! Heuristic domain name scoring.
//!
//! Four independent sub-scores on a 0-100 scale, combined by a fixed weighted
//! sum. Scoring is pure: the same name and base price always give the same
//! breakdown.

use std::sync::Arc;

use super::tld::TldTable;
use super::validator::{CandidateName, DomainValidator};
use crate::error::Result;
use crate::types::ScoreBreakdown;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

/// Consonant pairs that are hard to say
const HARD_CLUSTERS: &[&str] = &["qq", "xx", "zz", "qx", "xz"];

/// Predictable runs that make a name forgettable
const SEQUENTIAL_PATTERNS: &[&str] = &["123", "234", "345", "456", "567", "678", "789", "abc"];

/// Curated tech / crypto vocabulary
pub const TECH_KEYWORDS: &[&str] = &[
    "ai", "crypto", "defi", "nft", "dao", "web3", "meta", "blockchain",
    "smart", "token", "coin", "digital", "virtual", "cyber", "tech",
    "app", "lab", "labs", "protocol", "network", "chain", "vault",
    "swap", "pool", "stake", "yield", "farm", "mint", "burn", "bridge",
];

/// Subset of [`TECH_KEYWORDS`] that earns an extra Web3 bonus
const WEB3_TERMS: &[&str] = &["web3", "crypto", "defi", "nft", "dao", "blockchain"];

const EXACT_KEYWORD_SCORE: f64 = 75.0;
const EXACT_WEB3_BONUS: f64 = 25.0;
const PARTIAL_KEYWORD_SCORE: f64 = 25.0;
const PARTIAL_KEYWORD_CAP: f64 = 50.0;
const PARTIAL_WEB3_BONUS: f64 = 20.0;

/// Composite weights in percent, in the order length, brandability, keyword,
/// memorability. Integer percentages keep the sum exactly 100.
pub const WEIGHTS_PCT: [u32; 4] = [25, 30, 20, 25];

/// Value multipliers applied to the TLD base price, by composite score band
const VALUE_TIERS: &[(f64, f64)] = &[(90.0, 20.0), (75.0, 10.0), (60.0, 5.0), (40.0, 2.0)];

/// Names shorter than this earn a length bonus on their market value
const VALUE_LENGTH_PIVOT: usize = 10;
const VALUE_LENGTH_BONUS_PER_CHAR: f64 = 0.1;

/// Scores candidate names against a TLD pricing table
#[derive(Debug, Clone)]
pub struct DomainScorer {
    tlds: Arc<TldTable>,
    validator: DomainValidator,
}

impl DomainScorer {
    pub fn new(tlds: Arc<TldTable>) -> Self {
        Self {
            tlds,
            validator: DomainValidator::new(),
        }
    }

    pub fn tlds(&self) -> &TldTable {
        &self.tlds
    }

    /// Validate `name`, then score it against the base price of `tld`
    pub fn score(&self, name: &str, tld: &str) -> Result<ScoreBreakdown> {
        let candidate = self.validator.validate(name)?;
        let profile = self.tlds.require(tld)?;
        Ok(score_candidate(&candidate, profile.base_price))
    }

    /// Score several names for the same TLD, keeping input order
    pub fn score_batch(&self, names: &[String], tld: &str) -> Vec<Result<ScoreBreakdown>> {
        names.iter().map(|name| self.score(name, tld)).collect()
    }
}

impl Default for DomainScorer {
    fn default() -> Self {
        Self::new(Arc::new(TldTable::default()))
    }
}

/// Score an already validated name
pub fn score_candidate(name: &CandidateName, base_price: f64) -> ScoreBreakdown {
    let label = name.as_str();

    let length_score = length_score(label.len());
    let brandability_score = brandability_score(label);
    let keyword_score = keyword_score(label);
    let memorability_score = memorability_score(label);

    let overall_score = round2(composite(
        length_score,
        brandability_score,
        keyword_score,
        memorability_score,
    ));

    let reasons = scoring_reasons(
        label.len(),
        length_score,
        brandability_score,
        keyword_score,
        memorability_score,
    );

    ScoreBreakdown {
        name: label.to_string(),
        length_score: round2(length_score),
        brandability_score: round2(brandability_score),
        keyword_score: round2(keyword_score),
        memorability_score: round2(memorability_score),
        overall_score,
        market_value: estimate_market_value(label.len(), overall_score, base_price),
        reasons,
    }
}

/// Weighted sum of the four sub-scores
pub fn composite(length: f64, brandability: f64, keyword: f64, memorability: f64) -> f64 {
    let [wl, wb, wk, wm] = WEIGHTS_PCT;
    (length * wl as f64 + brandability * wb as f64 + keyword * wk as f64 + memorability * wm as f64)
        / 100.0
}

/// Peaks at 3-6 characters; very short names stay high, long names decay.
pub fn length_score(len: usize) -> f64 {
    match len {
        0 => 0.0,
        1..=2 => 90.0,
        3..=6 => 100.0,
        7..=8 => 85.0,
        9..=10 => 75.0,
        11..=12 => 60.0,
        13..=15 => 45.0,
        16..=20 => 20.0,
        _ => 10.0,
    }
}

pub fn brandability_score(name: &str) -> f64 {
    let mut score = 50.0;

    let vowels = vowel_count(name);
    let consonants = consonant_count(name);
    if vowels > 0 && consonants > 0 {
        let ratio = vowels.min(consonants) as f64 / vowels.max(consonants) as f64;
        score += ratio * 30.0;
    }

    for cluster in HARD_CLUSTERS {
        if name.contains(cluster) {
            score -= 15.0;
        }
    }

    if is_word_like(name) {
        score += 20.0;
    }

    clamp_score(score)
}

/// Exact keyword matches beat any combination of partial matches.
pub fn keyword_score(name: &str) -> f64 {
    if TECH_KEYWORDS.contains(&name) {
        let bonus = if WEB3_TERMS.contains(&name) {
            EXACT_WEB3_BONUS
        } else {
            0.0
        };
        return clamp_score(EXACT_KEYWORD_SCORE + bonus);
    }

    // Two-letter keywords match too many unrelated names
    let hits = TECH_KEYWORDS
        .iter()
        .filter(|kw| kw.len() >= 3 && name.contains(*kw))
        .count();
    let partial = (hits as f64 * PARTIAL_KEYWORD_SCORE).min(PARTIAL_KEYWORD_CAP);

    let web3_bonus = if WEB3_TERMS.iter().any(|term| name.contains(term)) {
        PARTIAL_WEB3_BONUS
    } else {
        0.0
    };

    clamp_score(partial + web3_bonus)
}

pub fn memorability_score(name: &str) -> f64 {
    let mut score = 50.0;

    for pattern in SEQUENTIAL_PATTERNS {
        if name.contains(pattern) {
            score -= 20.0;
        }
    }

    if has_triple_run(name) {
        score -= 20.0;
    }

    if has_unique_pattern(name) {
        score += 25.0;
    }

    if has_alternation(name) {
        score += 10.0;
    }

    let digits = name.chars().filter(|c| c.is_ascii_digit()).count();
    if digits * 2 > name.len() {
        score -= 30.0;
    }

    clamp_score(score)
}

/// Market value in ETH: tiered multiple of the base price plus a short-name bonus
pub fn estimate_market_value(len: usize, overall_score: f64, base_price: f64) -> f64 {
    let multiplier = VALUE_TIERS
        .iter()
        .find(|(threshold, _)| overall_score >= *threshold)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0);

    let length_bonus = VALUE_LENGTH_PIVOT.saturating_sub(len) as f64 * VALUE_LENGTH_BONUS_PER_CHAR;

    round4(base_price * multiplier + length_bonus)
}

fn scoring_reasons(
    len: usize,
    length_score: f64,
    brandability_score: f64,
    keyword_score: f64,
    memorability_score: f64,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if length_score >= 100.0 {
        reasons.push(format!("Ideal length ({} characters)", len));
    } else if length_score >= 90.0 {
        reasons.push("Ultra-short premium name".to_string());
    } else if length_score <= 20.0 {
        reasons.push("Long name, harder to type".to_string());
    }

    if brandability_score >= 80.0 {
        reasons.push("Strong brandability".to_string());
    }

    if keyword_score >= EXACT_KEYWORD_SCORE {
        reasons.push("Exact match on a high-value keyword".to_string());
    } else if keyword_score >= 45.0 {
        reasons.push("High keyword relevance".to_string());
    }

    if memorability_score >= 75.0 {
        reasons.push("Highly memorable".to_string());
    } else if memorability_score <= 30.0 {
        reasons.push("Repetitive or number-heavy pattern".to_string());
    }

    reasons
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c)
}

fn is_consonant(c: char) -> bool {
    c.is_ascii_alphabetic() && !is_vowel(c)
}

fn vowel_count(name: &str) -> usize {
    name.chars().filter(|&c| is_vowel(c)).count()
}

fn consonant_count(name: &str) -> usize {
    name.chars().filter(|&c| is_consonant(c)).count()
}

/// At least two vowels, no more than 60% vowels, never four consonants in a row
fn is_word_like(name: &str) -> bool {
    let vowels = vowel_count(name);
    if vowels < 2 || vowels as f64 > name.len() as f64 * 0.6 {
        return false;
    }

    let mut streak = 0;
    for c in name.chars() {
        if is_consonant(c) {
            streak += 1;
            if streak > 3 {
                return false;
            }
        } else {
            streak = 0;
        }
    }

    true
}

fn has_triple_run(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// At least half of the characters are distinct
fn has_unique_pattern(name: &str) -> bool {
    let mut distinct: Vec<char> = name.chars().collect();
    distinct.sort_unstable();
    distinct.dedup();
    distinct.len() * 2 >= name.len()
}

/// Strict vowel/consonant alternation over four or more letters
fn has_alternation(name: &str) -> bool {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() < 4 || !chars.iter().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    chars.windows(2).all(|w| is_vowel(w[0]) != is_vowel(w[1]))
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
