//! Protocol configuration
//!
//! Delimiters and the hashing scheme are configuration points. The digest
//! primitive itself is injected separately, see [`crate::hash::GibDigest`].

use crate::error::{IbGibError, Result};
use crate::hash::HashScheme;
use serde::{Deserialize, Serialize};

/// Separates label from hash in an address: `ib^gib`
pub const DEFAULT_ADDRESS_DELIMITER: &str = "^";
/// Separates punctiliar hash from timeline hash in a compound gib
pub const DEFAULT_COMPOUND_DELIMITER: &str = ".";
/// Longest label (and relation name) the validator accepts
pub const DEFAULT_MAX_LABEL_LEN: usize = 155;

/// Settings shared by the hasher, codec, transforms and validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtocolConfig {
    /// Label/hash delimiter
    pub address_delimiter: String,
    /// Punctiliar/timeline delimiter inside a gib
    pub compound_delimiter: String,
    /// Hashing and normalization scheme tag
    pub scheme: HashScheme,
    /// Maximum label length in characters
    pub max_label_len: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            address_delimiter: DEFAULT_ADDRESS_DELIMITER.to_string(),
            compound_delimiter: DEFAULT_COMPOUND_DELIMITER.to_string(),
            scheme: HashScheme::default(),
            max_label_len: DEFAULT_MAX_LABEL_LEN,
        }
    }
}

impl ProtocolConfig {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ProtocolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the delimiters can actually separate anything
    pub fn validate(&self) -> Result<()> {
        if self.address_delimiter.is_empty() {
            return Err(IbGibError::Precondition(
                "address delimiter must not be empty".into(),
            ));
        }
        if self.compound_delimiter.is_empty() {
            return Err(IbGibError::Precondition(
                "compound delimiter must not be empty".into(),
            ));
        }
        if self.address_delimiter == self.compound_delimiter {
            return Err(IbGibError::Precondition(format!(
                "address and compound delimiters must differ (both '{}')",
                self.address_delimiter
            )));
        }
        if self.max_label_len == 0 {
            return Err(IbGibError::Precondition(
                "max label length must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Reasons `label` is not a usable ib or relation name; empty when it is.
    ///
    /// Labels are non-empty, at most `max_label_len` chars, and hold no
    /// control characters or address delimiter.
    pub fn label_problems(&self, label: &str) -> Vec<String> {
        if label.is_empty() {
            return vec!["empty".into()];
        }
        let mut problems = Vec::new();
        let len = label.chars().count();
        if len > self.max_label_len {
            problems.push(format!("{} chars exceeds max {}", len, self.max_label_len));
        }
        if label.contains(&self.address_delimiter) {
            problems.push(format!(
                "contains address delimiter '{}'",
                self.address_delimiter
            ));
        }
        if label.chars().any(char::is_control) {
            problems.push("contains control characters".into());
        }
        problems
    }
}
