//! Domain label validation utilities

use crate::error::{NxdError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest label DNS allows
pub const MAX_LABEL_LEN: usize = 63;

/// A domain label that passed structural validation.
///
/// Lowercase ASCII letters, digits and hyphens, 1-63 characters, no leading or
/// trailing hyphen. Construct with [`CandidateName::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateName(String);

impl CandidateName {
    pub fn parse(name: &str) -> Result<Self> {
        DomainValidator::new().validate(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `name.tld`
    pub fn qualified(&self, tld: &str) -> String {
        format!("{}.{}", self.0, tld)
    }
}

impl std::fmt::Display for CandidateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CandidateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CandidateName {
    type Error = NxdError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CandidateName> for String {
    fn from(name: CandidateName) -> Self {
        name.0
    }
}

/// Domain label validator
#[derive(Debug, Clone, Default)]
pub struct DomainValidator;

impl DomainValidator {
    /// Create a new domain validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a single label (no dots)
    pub fn validate(&self, name: &str) -> Result<CandidateName> {
        let label = name.to_ascii_lowercase();

        self.validate_length(&label)?;
        self.validate_characters(&label)?;
        self.validate_format(&label)?;

        Ok(CandidateName(label))
    }

    fn validate_length(&self, label: &str) -> Result<()> {
        if label.is_empty() {
            return Err(NxdError::invalid_name(label, "name cannot be empty"));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(crate::invalid_name!(
                label,
                "name too long ({} characters, max {})",
                label.len(),
                MAX_LABEL_LEN
            ));
        }

        Ok(())
    }

    fn validate_characters(&self, label: &str) -> Result<()> {
        let valid_chars = Regex::new(r"^[a-z0-9-]+$")
            .map_err(|e| NxdError::internal(e.to_string()))?;

        if !valid_chars.is_match(label) {
            return Err(NxdError::invalid_name(
                label,
                "only letters, digits and hyphens are allowed",
            ));
        }

        Ok(())
    }

    fn validate_format(&self, label: &str) -> Result<()> {
        if label.starts_with('-') || label.ends_with('-') {
            return Err(NxdError::invalid_name(
                label,
                "name cannot start or end with a hyphen",
            ));
        }

        Ok(())
    }

    /// Validate a TLD string (format only, not whether it is offered)
    pub fn validate_tld(&self, tld: &str) -> Result<String> {
        let tld = tld.trim().trim_start_matches('.').to_ascii_lowercase();
        let tld_regex = Regex::new(r"^[a-z0-9]{2,63}$")
            .map_err(|e| NxdError::internal(e.to_string()))?;

        if !tld_regex.is_match(&tld) {
            return Err(NxdError::unsupported_tld(tld));
        }

        Ok(tld)
    }

    /// Split `name.tld` into a validated label and TLD, using `default_tld`
    /// when the input has no dot
    pub fn split_domain(&self, input: &str, default_tld: &str) -> Result<(CandidateName, String)> {
        let input = input.trim();
        let (name, tld) = match input.rsplit_once('.') {
            Some((name, tld)) => (name, tld),
            None => (input, default_tld),
        };

        Ok((self.validate(name)?, self.validate_tld(tld)?))
    }
}

/// Utility functions for free-text input
pub mod utils {
    /// Reduce a free-text query to lowercase ASCII letters and digits
    pub fn sanitize_query(query: &str) -> String {
        query
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// Parse a TLD list that may be comma or whitespace separated
    pub fn parse_tld_input(input: &str) -> Vec<String> {
        input
            .split(&[',', ' ', '\n', '\t'][..])
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
