//! Domain scoring and suggestion engine

pub mod candidates;
pub mod market;
pub mod oracle;
pub mod scorer;
pub mod suggest;
pub mod tld;
pub mod validator;

// Re-export main functionality
pub use candidates::{CandidateGenerator, Strategy};
pub use market::{investment_potential, liquidity_estimate, price_recommendations};
pub use oracle::{AvailabilityOracle, RegistryOracle, RESERVED_NAMES};
pub use scorer::{score_candidate, DomainScorer};
pub use suggest::{rank_suggestions, SuggestionEngine, MAX_ALTERNATIVES};
pub use tld::{TldTable, DEFAULT_TLD, PREMIUM_PRICING_THRESHOLD};
pub use validator::{CandidateName, DomainValidator, MAX_LABEL_LEN};
