//! Suggestion pipeline: generate, check availability, score, rank

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::candidates::CandidateGenerator;
use super::market::analyze_score;
use super::oracle::AvailabilityOracle;
use super::scorer::score_candidate;
use super::tld::{TldTable, DEFAULT_TLD};
use super::validator::{CandidateName, DomainValidator};
use crate::error::{NxdError, Result};
use crate::types::{
    AvailabilityReport, DomainCategory, DomainSuggestion, EngineHealth, MarketAnalysis,
    MetricsSnapshot, PerformanceMetrics, PriceTrend, SuggestConfig, TldProfile,
};

/// Alternatives offered when a checked name is taken
pub const MAX_ALTERNATIVES: usize = 5;

const SELF_TEST_NAME: &str = "test";
const SELF_TEST_QUERY: &str = "example";

/// Generates, filters and ranks domain suggestions
pub struct SuggestionEngine {
    tlds: Arc<TldTable>,
    oracle: Arc<dyn AvailabilityOracle>,
    generator: CandidateGenerator,
    validator: DomainValidator,
    semaphore: Semaphore,
    config: SuggestConfig,
    metrics: Arc<PerformanceMetrics>,
}

impl SuggestionEngine {
    pub fn new(tlds: Arc<TldTable>, oracle: Arc<dyn AvailabilityOracle>, config: SuggestConfig) -> Self {
        Self {
            tlds,
            oracle,
            generator: CandidateGenerator::new(config.overgeneration),
            validator: DomainValidator::new(),
            semaphore: Semaphore::new(config.oracle_concurrency.max(1)),
            config,
            metrics: Arc::new(PerformanceMetrics::new()),
        }
    }

    /// Share a metrics sink with other components
    pub fn with_metrics(mut self, metrics: Arc<PerformanceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn tlds(&self) -> &TldTable {
        &self.tlds
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }

    /// Ranked, available suggestions for `query` across `tlds`.
    ///
    /// Unknown TLDs fail the whole request before any oracle call. Candidates
    /// whose availability cannot be determined are skipped. An empty `tlds`
    /// list means the default TLD.
    pub async fn suggest(
        &self,
        query: &str,
        tlds: &[String],
        max_results: usize,
    ) -> Result<Vec<DomainSuggestion>> {
        let profiles = self.resolve_tlds(tlds)?;
        let candidates = self.generator.generate(query, max_results);

        if candidates.is_empty() {
            tracing::debug!(query = %query, "No candidates generated");
            return Ok(Vec::new());
        }

        let pairs: Vec<(&CandidateName, &TldProfile)> = profiles
            .iter()
            .flat_map(|profile| candidates.iter().map(move |candidate| (candidate, *profile)))
            .collect();

        let batch_start = Instant::now();
        let checks = pairs
            .iter()
            .map(|(candidate, profile)| self.probe(candidate.qualified(&profile.tld)));
        let answers = join_all(checks).await;

        let mut suggestions: Vec<DomainSuggestion> = pairs
            .iter()
            .zip(answers)
            .filter(|(_, available)| *available == Some(true))
            .map(|((candidate, profile), _)| build_suggestion(candidate, profile))
            .collect();

        let available = suggestions.len();
        rank_suggestions(&mut suggestions);
        suggestions.truncate(max_results);

        tracing::info!(
            query = %query,
            tlds = %profiles.len(),
            checked = %pairs.len(),
            available = %available,
            returned = %suggestions.len(),
            duration_ms = %batch_start.elapsed().as_millis(),
            "Suggestion batch completed"
        );

        Ok(suggestions)
    }

    /// Availability, score and pricing of one name, with alternatives if taken
    pub async fn check(&self, name: &str, tld: &str) -> Result<AvailabilityReport> {
        let candidate = self.validator.validate(name)?;
        let profile = self.resolve_tld(tld)?;
        let full_domain = candidate.qualified(&profile.tld);

        let start = Instant::now();
        let available = timeout(self.config.oracle_timeout, self.oracle.is_available(&full_domain))
            .await
            .map_err(|_| {
                NxdError::timeout(
                    format!("availability check for {}", full_domain),
                    self.config.oracle_timeout,
                )
            })??;
        self.metrics
            .record_availability_check(start.elapsed().as_millis() as u64);

        let (score, pricing, alternatives) = if available {
            let score = score_candidate(&candidate, profile.base_price);
            let pricing = self.tlds.quote(&profile.tld, Some(&score))?;
            (Some(score), pricing, Vec::new())
        } else {
            let pricing = self.tlds.quote(&profile.tld, None)?;
            let alternatives = self
                .suggest(candidate.as_str(), &[profile.tld.clone()], MAX_ALTERNATIVES)
                .await?;
            (None, pricing, alternatives)
        };

        tracing::debug!(
            domain = %full_domain,
            available = %available,
            alternatives = %alternatives.len(),
            "Domain check completed"
        );

        Ok(AvailabilityReport {
            full_domain,
            name: candidate.into(),
            tld: profile.tld.clone(),
            available,
            score,
            pricing,
            alternatives,
        })
    }

    /// Listing guidance for one name under `trend`. Availability is not
    /// consulted; registered names are the usual subject.
    pub fn analyze(&self, name: &str, tld: &str, trend: PriceTrend) -> Result<MarketAnalysis> {
        let candidate = self.validator.validate(name)?;
        let profile = self.resolve_tld(tld)?;
        let score = score_candidate(&candidate, profile.base_price);
        let analysis = analyze_score(candidate.qualified(&profile.tld), score, trend);

        tracing::debug!(
            domain = %analysis.full_domain,
            trend = %trend,
            investment = %analysis.investment_potential,
            liquidity = %analysis.liquidity_estimate,
            "Market analysis completed"
        );

        Ok(analysis)
    }

    /// Score a fixed name and run a small suggestion batch against the oracle
    pub async fn health_check(&self) -> EngineHealth {
        let supported_tlds = self.tlds.tlds().into_iter().map(String::from).collect();
        let oracle = self.oracle.name().to_string();

        let test_score = match self.analyze(SELF_TEST_NAME, DEFAULT_TLD, PriceTrend::Stable) {
            Ok(analysis) => analysis.score.overall_score,
            Err(e) => return EngineHealth::failed(supported_tlds, oracle, None, e),
        };

        match self
            .suggest(SELF_TEST_QUERY, &[DEFAULT_TLD.to_string()], 3)
            .await
        {
            Ok(suggestions) => {
                tracing::info!(
                    oracle = %oracle,
                    test_suggestions = %suggestions.len(),
                    "Domain engine health check completed"
                );
                EngineHealth {
                    healthy: test_score > 0.0,
                    supported_tlds,
                    oracle,
                    test_score: Some(test_score),
                    test_suggestions: suggestions.len(),
                    error: None,
                }
            }
            Err(e) => EngineHealth::failed(supported_tlds, oracle, Some(test_score), e),
        }
    }

    fn resolve_tld(&self, tld: &str) -> Result<&TldProfile> {
        let tld = if tld.trim().is_empty() { DEFAULT_TLD } else { tld };
        let tld = self.validator.validate_tld(tld)?;
        self.tlds.require(&tld)
    }

    fn resolve_tlds(&self, tlds: &[String]) -> Result<Vec<&TldProfile>> {
        if tlds.is_empty() {
            return Ok(vec![self.resolve_tld(DEFAULT_TLD)?]);
        }

        let mut profiles: Vec<&TldProfile> = Vec::with_capacity(tlds.len());
        for tld in tlds {
            let profile = self.resolve_tld(tld)?;
            if !profiles.iter().any(|p| p.tld == profile.tld) {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    /// `Some(available)`, or `None` when the oracle failed or timed out
    async fn probe(&self, fqdn: String) -> Option<bool> {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(domain = %fqdn, error = %e, "Skipping candidate, oracle pool closed");
                return None;
            }
        };

        let start = Instant::now();
        match timeout(self.config.oracle_timeout, self.oracle.is_available(&fqdn)).await {
            Ok(Ok(available)) => {
                self.metrics
                    .record_availability_check(start.elapsed().as_millis() as u64);
                Some(available)
            }
            Ok(Err(e)) => {
                self.metrics.increment_availability_errors();
                tracing::warn!(
                    domain = %fqdn,
                    oracle = %self.oracle.name(),
                    error = %e,
                    "Skipping candidate, availability check failed"
                );
                None
            }
            Err(_) => {
                self.metrics.increment_availability_errors();
                tracing::warn!(
                    domain = %fqdn,
                    oracle = %self.oracle.name(),
                    timeout_ms = %self.config.oracle_timeout.as_millis(),
                    "Skipping candidate, availability check timed out"
                );
                None
            }
        }
    }
}

fn build_suggestion(candidate: &CandidateName, profile: &TldProfile) -> DomainSuggestion {
    let score = score_candidate(candidate, profile.base_price);
    DomainSuggestion {
        name: candidate.to_string(),
        tld: profile.tld.clone(),
        full_domain: candidate.qualified(&profile.tld),
        available: true,
        category: DomainCategory::from_score(score.overall_score),
        estimated_value: score.market_value,
        score,
    }
}

/// Composite score descending, then shorter name, then name and TLD
/// alphabetically
pub fn rank_suggestions(suggestions: &mut [DomainSuggestion]) {
    suggestions.sort_by(compare_suggestions);
}

fn compare_suggestions(a: &DomainSuggestion, b: &DomainSuggestion) -> Ordering {
    b.overall_score()
        .total_cmp(&a.overall_score())
        .then_with(|| a.name.len().cmp(&b.name.len()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.tld.cmp(&b.tld))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::oracle::RegistryOracle;
    use crate::types::{MarketTier, ScoreBreakdown};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    /// Every name is available except `taken`; `broken` names error, `slow`
    /// names never answer in time
    struct FakeOracle {
        taken: HashSet<String>,
        broken: HashSet<String>,
        slow: HashSet<String>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeOracle {
        fn new() -> Self {
            Self {
                taken: HashSet::new(),
                broken: HashSet::new(),
                slow: HashSet::new(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn taken(mut self, fqdn: &str) -> Self {
            self.taken.insert(fqdn.to_string());
            self
        }

        fn broken(mut self, fqdn: &str) -> Self {
            self.broken.insert(fqdn.to_string());
            self
        }

        fn slow(mut self, fqdn: &str) -> Self {
            self.slow.insert(fqdn.to_string());
            self
        }
    }

    #[async_trait]
    impl AvailabilityOracle for FakeOracle {
        async fn is_available(&self, fqdn: &str) -> Result<bool> {
            let now = self.in_flight.fetch_add(1, AtomicOrdering::SeqCst) + 1;
            self.peak.fetch_max(now, AtomicOrdering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.slow.contains(fqdn) {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            self.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);

            if self.broken.contains(fqdn) {
                return Err(NxdError::oracle(fqdn, "registry unreachable"));
            }
            Ok(!self.taken.contains(fqdn))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn engine(oracle: FakeOracle) -> (SuggestionEngine, Arc<FakeOracle>) {
        let oracle = Arc::new(oracle);
        let config = SuggestConfig {
            oracle_concurrency: 4,
            oracle_timeout: Duration::from_millis(100),
            overgeneration: 3,
        };
        let engine = SuggestionEngine::new(Arc::new(TldTable::default()), oracle.clone(), config);
        (engine, oracle)
    }

    fn suggestion(name: &str, overall_score: f64) -> DomainSuggestion {
        DomainSuggestion {
            name: name.to_string(),
            tld: "nxd".to_string(),
            full_domain: format!("{}.nxd", name),
            available: true,
            score: ScoreBreakdown {
                name: name.to_string(),
                length_score: 0.0,
                brandability_score: 0.0,
                keyword_score: 0.0,
                memorability_score: 0.0,
                overall_score,
                market_value: 0.0,
                reasons: Vec::new(),
            },
            category: DomainCategory::from_score(overall_score),
            estimated_value: 0.0,
        }
    }

    #[test]
    fn test_ranking_tie_breaks_on_length() {
        let mut list = vec![
            suggestion("abcdefgh", 72.0),
            suggestion("zyxwv", 72.0),
            suggestion("longestname", 90.0),
        ];
        rank_suggestions(&mut list);
        let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["longestname", "zyxwv", "abcdefgh"]);
    }

    #[tokio::test]
    async fn test_suggest_ranks_and_truncates() {
        let (engine, _) = engine(FakeOracle::new());
        let results = engine.suggest("crypto", &["nxd".to_string()], 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|s| s.tld == "nxd" && s.available));
        assert!(results.windows(2).all(|w| w[0].overall_score() >= w[1].overall_score()));
        assert!(results[0].name.contains("crypto"));
    }

    #[tokio::test]
    async fn test_unavailable_and_failed_candidates_skipped() {
        let oracle = FakeOracle::new()
            .taken("mycrypto.nxd")
            .broken("getcrypto.nxd")
            .slow("thecrypto.nxd");
        let (engine, _) = engine(oracle);

        // room for every candidate, so nothing is ranked out
        let max_results = 100;
        let results = engine
            .suggest("crypto", &["nxd".to_string()], max_results)
            .await
            .unwrap();

        let skipped = ["mycrypto", "getcrypto", "thecrypto"];
        let expected: HashSet<String> = CandidateGenerator::new(3)
            .generate("crypto", max_results)
            .into_iter()
            .map(String::from)
            .filter(|name| !skipped.contains(&name.as_str()))
            .collect();
        let returned: HashSet<String> = results.iter().map(|s| s.name.clone()).collect();

        assert_eq!(returned.len(), results.len());
        assert_eq!(returned, expected);
        assert!(returned.contains("usecrypto"));
        assert_eq!(engine.metrics().availability_errors, 2);
    }

    #[tokio::test]
    async fn test_huge_max_results_does_not_overallocate() {
        let (engine, _) = engine(FakeOracle::new());
        let results = engine
            .suggest("crypto", &["nxd".to_string()], usize::MAX)
            .await
            .unwrap();

        let all = CandidateGenerator::new(3).generate("crypto", usize::MAX);
        assert_eq!(results.len(), all.len());
        assert!(results.windows(2).all(|w| w[0].overall_score() >= w[1].overall_score()));
    }

    #[tokio::test]
    async fn test_all_taken_gives_empty() {
        struct NothingFree;

        #[async_trait]
        impl AvailabilityOracle for NothingFree {
            async fn is_available(&self, _fqdn: &str) -> Result<bool> {
                Ok(false)
            }

            fn name(&self) -> &str {
                "nothing-free"
            }
        }

        let engine = SuggestionEngine::new(
            Arc::new(TldTable::default()),
            Arc::new(NothingFree),
            SuggestConfig::default(),
        );
        let results = engine.suggest("vault", &[], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tld_fails_fast() {
        let (engine, oracle) = engine(FakeOracle::new());
        let err = engine
            .suggest("crypto", &["nxd".to_string(), "com".to_string()], 3)
            .await
            .unwrap_err();
        assert!(matches!(err, NxdError::UnsupportedTld { .. }));
        assert_eq!(oracle.peak.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let (engine, oracle) = engine(FakeOracle::new());
        let tlds: Vec<String> = ["nxd", "dao", "web3"].iter().map(|t| t.to_string()).collect();
        let results = engine.suggest("vault", &tlds, 10).await.unwrap();

        assert_eq!(results.len(), 10);
        assert!(oracle.peak.load(AtomicOrdering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_multiple_tlds_deduplicated() {
        let (engine, _) = engine(FakeOracle::new());
        let tlds: Vec<String> = ["dao", "DAO", ".dao"].iter().map(|t| t.to_string()).collect();
        let results = engine.suggest("swap", &tlds, 50).await.unwrap();
        let mut domains: Vec<&str> = results.iter().map(|s| s.full_domain.as_str()).collect();
        let total = domains.len();
        domains.sort();
        domains.dedup();
        assert_eq!(domains.len(), total);
    }

    #[tokio::test]
    async fn test_check_available_and_taken() {
        let engine = SuggestionEngine::new(
            Arc::new(TldTable::default()),
            Arc::new(RegistryOracle::new()),
            SuggestConfig::default(),
        );

        let report = engine.check("cryptolab", "nxd").await.unwrap();
        assert!(report.available);
        assert_eq!(report.full_domain, "cryptolab.nxd");
        assert!(report.score.is_some());
        assert!(report.alternatives.is_empty());

        let report = engine.check("Crypto", "").await.unwrap();
        assert!(!report.available);
        assert_eq!(report.full_domain, "crypto.nxd");
        assert!(report.score.is_none());
        assert!(!report.pricing.is_premium);
        assert!(!report.alternatives.is_empty());
        assert!(report.alternatives.len() <= MAX_ALTERNATIVES);
        assert!(report.alternatives.iter().all(|s| s.full_domain != "crypto.nxd"));
    }

    #[test]
    fn test_analyze_uses_score_and_trend() {
        let (engine, oracle) = engine(FakeOracle::new());

        let rising = engine.analyze("Crypto", "nxd", PriceTrend::Increasing).unwrap();
        assert_eq!(rising.full_domain, "crypto.nxd");
        assert_eq!(rising.score.overall_score, 80.55);
        assert_eq!(rising.investment_potential, MarketTier::High);
        assert_eq!(rising.liquidity_estimate, MarketTier::Medium);
        assert!(rising.price_recommendations.suggested_listing_price > rising.score.market_value);

        let flat = engine.analyze("crypto", "nxd", PriceTrend::Stable).unwrap();
        assert_eq!(flat.investment_potential, MarketTier::Medium);
        assert_eq!(flat.price_recommendations.suggested_listing_price, flat.score.market_value);

        assert!(matches!(
            engine.analyze("crypto", "com", PriceTrend::Stable).unwrap_err(),
            NxdError::UnsupportedTld { .. }
        ));
        assert_eq!(oracle.peak.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_health_check() {
        let (engine, _) = engine(FakeOracle::new());
        let health = engine.health_check().await;

        assert!(health.healthy);
        assert_eq!(health.oracle, "fake");
        assert_eq!(health.test_suggestions, 3);
        assert!(health.test_score.unwrap_or(0.0) > 0.0);
        assert_eq!(health.supported_tlds, vec!["dao", "defi", "nft", "nxd", "web3"]);
        assert!(health.error.is_none());
    }

    #[tokio::test]
    async fn test_check_rejects_bad_input() {
        let (engine, _) = engine(FakeOracle::new());
        assert!(matches!(
            engine.check("-bad", "nxd").await.unwrap_err(),
            NxdError::InvalidNameFormat { .. }
        ));
        assert!(matches!(
            engine.check("good", "org").await.unwrap_err(),
            NxdError::UnsupportedTld { .. }
        ));
    }
}
