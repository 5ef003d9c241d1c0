//! Secondary-market guidance derived from a name's score

use chrono::Utc;

use super::scorer::round4;
use crate::types::{MarketAnalysis, MarketTier, PriceRecommendations, PriceTrend, ScoreBreakdown};

/// Floor for offers, as a share of market value
pub const MINIMUM_PRICE_FACTOR: f64 = 0.7;
/// Ceiling for premium listings, as a share of market value
pub const PREMIUM_PRICE_FACTOR: f64 = 1.5;

pub const HIGH_INVESTMENT_THRESHOLD: f64 = 80.0;
pub const MEDIUM_INVESTMENT_THRESHOLD: f64 = 60.0;
pub const HIGH_LIQUIDITY_THRESHOLD: f64 = 85.0;
pub const MEDIUM_LIQUIDITY_THRESHOLD: f64 = 65.0;

pub fn price_recommendations(market_value: f64, trend: PriceTrend) -> PriceRecommendations {
    let adjusted = round4(market_value * trend.multiplier());
    PriceRecommendations {
        suggested_listing_price: adjusted,
        minimum_acceptable_price: round4(market_value * MINIMUM_PRICE_FACTOR),
        premium_price: round4(market_value * PREMIUM_PRICE_FACTOR),
        market_adjusted_value: adjusted,
    }
}

/// High needs both a strong score and a rising market
pub fn investment_potential(overall_score: f64, trend: PriceTrend) -> MarketTier {
    if overall_score >= HIGH_INVESTMENT_THRESHOLD && trend == PriceTrend::Increasing {
        MarketTier::High
    } else if overall_score >= MEDIUM_INVESTMENT_THRESHOLD {
        MarketTier::Medium
    } else {
        MarketTier::Low
    }
}

/// How quickly the name is likely to sell
pub fn liquidity_estimate(overall_score: f64) -> MarketTier {
    if overall_score >= HIGH_LIQUIDITY_THRESHOLD {
        MarketTier::High
    } else if overall_score >= MEDIUM_LIQUIDITY_THRESHOLD {
        MarketTier::Medium
    } else {
        MarketTier::Low
    }
}

pub fn analyze_score(full_domain: String, score: ScoreBreakdown, trend: PriceTrend) -> MarketAnalysis {
    MarketAnalysis {
        full_domain,
        price_recommendations: price_recommendations(score.market_value, trend),
        investment_potential: investment_potential(score.overall_score, trend),
        liquidity_estimate: liquidity_estimate(score.overall_score),
        price_trend: trend,
        score,
        analyzed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_recommendations_follow_trend() {
        let rising = price_recommendations(1.0, PriceTrend::Increasing);
        assert_eq!(rising.suggested_listing_price, 1.2);
        assert_eq!(rising.market_adjusted_value, 1.2);
        assert_eq!(rising.minimum_acceptable_price, 0.7);
        assert_eq!(rising.premium_price, 1.5);

        let falling = price_recommendations(1.0, PriceTrend::Decreasing);
        assert_eq!(falling.suggested_listing_price, 0.8);
        assert_eq!(falling.minimum_acceptable_price, 0.7);

        let flat = price_recommendations(0.05, PriceTrend::Stable);
        assert_eq!(flat.suggested_listing_price, 0.05);
        assert_eq!(flat.premium_price, 0.075);
    }

    #[test]
    fn test_investment_potential_thresholds() {
        assert_eq!(investment_potential(80.0, PriceTrend::Increasing), MarketTier::High);
        assert_eq!(investment_potential(95.0, PriceTrend::Stable), MarketTier::Medium);
        assert_eq!(investment_potential(79.99, PriceTrend::Increasing), MarketTier::Medium);
        assert_eq!(investment_potential(60.0, PriceTrend::Decreasing), MarketTier::Medium);
        assert_eq!(investment_potential(59.99, PriceTrend::Increasing), MarketTier::Low);
    }

    #[test]
    fn test_liquidity_thresholds() {
        assert_eq!(liquidity_estimate(85.0), MarketTier::High);
        assert_eq!(liquidity_estimate(84.99), MarketTier::Medium);
        assert_eq!(liquidity_estimate(65.0), MarketTier::Medium);
        assert_eq!(liquidity_estimate(64.99), MarketTier::Low);
    }

    #[test]
    fn test_trend_parsing() {
        assert_eq!("Increasing".parse::<PriceTrend>().unwrap(), PriceTrend::Increasing);
        assert_eq!("down".parse::<PriceTrend>().unwrap(), PriceTrend::Decreasing);
        assert!("sideways".parse::<PriceTrend>().is_err());
        assert_eq!(PriceTrend::default(), PriceTrend::Stable);
    }
}
