//! IbGib: the content-addressed record

use crate::config::DEFAULT_ADDRESS_DELIMITER;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Label of the universal root record
pub const ROOT_IB: &str = "ib";
/// Hash literal carried by every primitive record
pub const PRIMITIVE_GIB: &str = "gib";
/// Address of the universal root
pub const ROOT_ADDR: &str = "ib^gib";

pub const PAST_REL8N_NAME: &str = "past";
pub const ANCESTOR_REL8N_NAME: &str = "ancestor";
pub const DNA_REL8N_NAME: &str = "dna";
pub const TJP_REL8N_NAME: &str = "tjp";
pub const IDENTITY_REL8N_NAME: &str = "identity";
pub const SECRET_REL8N_NAME: &str = "secret";
pub const ENCRYPTION_REL8N_NAME: &str = "encryption";

/// Relation names the protocol itself defines
pub const RESERVED_REL8N_NAMES: [&str; 7] = [
    PAST_REL8N_NAME,
    ANCESTOR_REL8N_NAME,
    DNA_REL8N_NAME,
    TJP_REL8N_NAME,
    IDENTITY_REL8N_NAME,
    SECRET_REL8N_NAME,
    ENCRYPTION_REL8N_NAME,
];

/// Relation names only transforms may write; rel8 refuses to edit them
pub const PROTECTED_REL8N_NAMES: [&str; 4] = [
    PAST_REL8N_NAME,
    ANCESTOR_REL8N_NAME,
    DNA_REL8N_NAME,
    TJP_REL8N_NAME,
];

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const COUNTER_FIELD: &str = "n";
pub const UUID_FIELD: &str = "uuid";
pub const IS_TJP_FIELD: &str = "isTjp";

/// Relation name -> ordered list of addresses
pub type Rel8ns = BTreeMap<String, Vec<String>>;

/// A record. Never mutated once its gib is computed; transforms clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IbGib {
    /// Label
    pub ib: String,
    /// Content hash: hex digest, compound digest, or the primitive literal
    pub gib: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel8ns: Option<Rel8ns>,
}

impl IbGib {
    /// Bare record with no payloads. The gib is taken as given.
    pub fn new(ib: impl Into<String>, gib: impl Into<String>) -> Self {
        Self {
            ib: ib.into(),
            gib: gib.into(),
            data: None,
            rel8ns: None,
        }
    }

    /// Address using the default `^` delimiter
    pub fn addr(&self) -> String {
        self.addr_with(DEFAULT_ADDRESS_DELIMITER)
    }

    pub fn addr_with(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.ib, delimiter, self.gib)
    }

    pub fn is_primitive(&self) -> bool {
        self.gib == PRIMITIVE_GIB
    }

    pub fn is_root(&self) -> bool {
        self.ib == ROOT_IB && self.gib == PRIMITIVE_GIB
    }

    /// True while the record is marked as the origin of a new timeline
    pub fn is_tjp(&self) -> bool {
        self.data_field(IS_TJP_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Top-level data field, if data is a keyed document
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.as_object()?.get(key)
    }

    /// Addresses under a relation name (empty if absent)
    pub fn rel8n(&self, name: &str) -> &[String] {
        self.rel8ns
            .as_ref()
            .and_then(|r| r.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Address of the timeline origin, if this record belongs to one
    pub fn tjp_addr(&self) -> Option<&str> {
        self.rel8n(TJP_REL8N_NAME).last().map(String::as_str)
    }

    /// One-line description for logs and the CLI
    pub fn summary(&self) -> String {
        let data_keys = self
            .data
            .as_ref()
            .and_then(Value::as_object)
            .map(|m| m.len())
            .unwrap_or(0);
        let rel8n_names: Vec<&str> = self
            .rel8ns
            .as_ref()
            .map(|r| r.keys().map(String::as_str).collect())
            .unwrap_or_default();
        format!(
            "IbGib '{}' | gib={} | data keys={} | rel8ns={:?}{}",
            self.ib,
            self.gib,
            data_keys,
            rel8n_names,
            if self.is_tjp() { " | tjp" } else { "" }
        )
    }
}
