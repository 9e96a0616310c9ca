//! Gib derivation
//!
//! gib = H(H(ib) + H(canon(rel8ns)) + H(canon(data))), each H an uppercase
//! hex digest and absent parts contributing the empty string. With neither
//! data nor rel8ns present the gib is H(H(ib)). Records inside a timeline
//! append `.<tjp gib>` to that punctiliar hash.
//!
//! Canonicalization drift would silently re-address every stored record, so
//! everything here is a pure function of the normalized payloads.

use super::digest::{GibDigest, HashScheme, Sha256Digest};
use crate::address::Address;
use crate::config::ProtocolConfig;
use crate::error::{IbGibError, Result};
use crate::model::{has_content, normalize, IbGib, Rel8ns};
use serde_json::Value;
use std::sync::Arc;

/// Data payload as seen by the hasher
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Structured document, hashed via canonical text
    Document(&'a Value),
    /// Raw bytes, digested directly
    Bytes(&'a [u8]),
}

/// Computes gibs with an injected digest
#[derive(Debug, Clone)]
pub struct Hasher {
    digest: Arc<dyn GibDigest>,
    config: ProtocolConfig,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(Arc::new(Sha256Digest), ProtocolConfig::default())
    }
}

impl Hasher {
    pub fn new(digest: Arc<dyn GibDigest>, config: ProtocolConfig) -> Self {
        Self { digest, config }
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        Self::new(Arc::new(Sha256Digest), config)
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn scheme(&self) -> HashScheme {
        self.config.scheme
    }

    pub fn digest_name(&self) -> &str {
        self.digest.name()
    }

    /// Uppercase hex digest of arbitrary text
    pub fn hex(&self, text: &str) -> String {
        self.digest.hex_upper(text.as_bytes())
    }

    /// Normalized compact JSON. Equal documents render byte-identically
    /// regardless of original key order.
    pub fn canonical_text(value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&normalize(value))?)
    }

    /// Hash of the relation map, or "" if no relation has an address
    pub fn rel8ns_hash(&self, rel8ns: Option<&Rel8ns>) -> Result<String> {
        let Some(rel8ns) = rel8ns else {
            return Ok(String::new());
        };
        if !rel8ns.values().any(|addrs| !addrs.is_empty()) {
            return Ok(String::new());
        }
        let text = serde_json::to_string(rel8ns)?;
        Ok(self.hex(&text))
    }

    /// Hash of the data payload, or "" if it carries nothing
    pub fn data_hash(&self, data: Option<Payload<'_>>) -> Result<String> {
        match data {
            None => Ok(String::new()),
            Some(Payload::Bytes(bytes)) => Ok(self.digest.hex_upper(bytes)),
            Some(Payload::Document(doc)) => {
                let normalized = normalize(doc);
                if !has_content(&normalized) {
                    return Ok(String::new());
                }
                let text = serde_json::to_string(&normalized)?;
                Ok(self.hex(&text))
            }
        }
    }

    /// Timeline-independent hash of the three fields
    pub fn punctiliar_gib(
        &self,
        ib: &str,
        data: Option<Payload<'_>>,
        rel8ns: Option<&Rel8ns>,
    ) -> Result<String> {
        let ib_hash = self.hex(ib);
        let rel8ns_hash = self.rel8ns_hash(rel8ns)?;
        let data_hash = self.data_hash(data)?;
        let gib = if rel8ns_hash.is_empty() && data_hash.is_empty() {
            self.hex(&ib_hash)
        } else {
            self.hex(&format!("{}{}{}", ib_hash, rel8ns_hash, data_hash))
        };
        log::trace!(
            "punctiliar gib for '{}': ib={} rel8ns={} data={} -> {}",
            ib,
            ib_hash,
            rel8ns_hash,
            data_hash,
            gib
        );
        Ok(gib)
    }

    /// Full gib, compound when `timeline_gib` is given
    pub fn gib_of(
        &self,
        ib: &str,
        data: Option<Payload<'_>>,
        rel8ns: Option<&Rel8ns>,
        timeline_gib: Option<&str>,
    ) -> Result<String> {
        let punctiliar = self.punctiliar_gib(ib, data, rel8ns)?;
        Ok(match timeline_gib {
            Some(tjp_gib) => format!("{}{}{}", punctiliar, self.config.compound_delimiter, tjp_gib),
            None => punctiliar,
        })
    }

    /// Gib of a record, detecting timeline membership from its `tjp` relation
    pub fn gib(&self, record: &IbGib) -> Result<String> {
        let timeline = self.timeline_gib(record)?;
        self.gib_of(
            &record.ib,
            record.data.as_ref().map(Payload::Document),
            record.rel8ns.as_ref(),
            timeline.as_deref(),
        )
    }

    /// Hash component of the record's tjp address, if it has one
    pub fn timeline_gib(&self, record: &IbGib) -> Result<Option<String>> {
        match record.tjp_addr() {
            None => Ok(None),
            Some(addr) => {
                let parsed = Address::parse_with(addr, &self.config.address_delimiter)
                    .map_err(|e| {
                        IbGibError::Validation(format!(
                            "malformed tjp address on '{}': {}",
                            record.ib, e
                        ))
                    })?;
                Ok(Some(parsed.gib))
            }
        }
    }
}
