//! Fork: begin a new lineage from a source record

use super::{is_false, timestamp_now, Draft, TransformOptions, TransformResult, Transformer};
use crate::error::{IbGibError, Result};
use crate::model::{
    IbGib, Rel8ns, ANCESTOR_REL8N_NAME, COUNTER_FIELD, IS_TJP_FIELD, TIMESTAMP_FIELD,
    TJP_REL8N_NAME, UUID_FIELD,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Marks the forked record as the origin of a timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TjpOptions {
    /// Give the origin a random uuid
    #[serde(skip_serializing_if = "is_false")]
    pub uuid: bool,
    /// Give the origin a timestamp (conflicts with `no_timestamp`)
    #[serde(skip_serializing_if = "is_false")]
    pub timestamp: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForkOptions {
    /// Label of the new record; defaults to the source's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_ib: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub uuid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tjp: Option<TjpOptions>,
    #[serde(skip_serializing_if = "is_false")]
    pub clone_rel8ns: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub clone_data: bool,
    /// Start the `n` counter at 0
    #[serde(skip_serializing_if = "is_false")]
    pub n_counter: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub no_timestamp: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dna: bool,
    /// Relations that keep only their most recent address
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_rel8ns: Vec<String>,
}

impl Transformer {
    /// Fork `src` into a new lineage whose `ancestor` ends with `src`.
    pub fn fork(&self, src: &IbGib, opts: &ForkOptions) -> Result<TransformResult> {
        self.check_source(src)?;
        let dest_ib = opts.dest_ib.clone().unwrap_or_else(|| src.ib.clone());
        self.check_new_ib(&dest_ib)?;
        let tjp = opts.tjp.unwrap_or_default();
        if opts.no_timestamp && tjp.timestamp {
            return Err(IbGibError::Precondition(
                "noTimestamp and tjp.timestamp are mutually exclusive".into(),
            ));
        }

        let src_is_root = src.is_root();

        let mut rel8ns = if opts.clone_rel8ns && !src_is_root {
            src.rel8ns.clone().unwrap_or_default()
        } else {
            Rel8ns::new()
        };
        // a fork always begins a fresh timeline
        rel8ns.remove(TJP_REL8N_NAME);
        if !src_is_root {
            rel8ns
                .entry(ANCESTOR_REL8N_NAME.to_string())
                .or_default()
                .push(self.source_addr(src));
        }

        let mut data = if opts.clone_data {
            self.source_data(src)?
        } else {
            Map::new()
        };
        if opts.n_counter {
            data.insert(COUNTER_FIELD.to_string(), Value::from(0u64));
        }
        if opts.uuid || tjp.uuid {
            data.insert(UUID_FIELD.to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !opts.no_timestamp {
            data.insert(TIMESTAMP_FIELD.to_string(), Value::String(timestamp_now()));
        }
        if tjp.uuid || tjp.timestamp {
            data.insert(IS_TJP_FIELD.to_string(), Value::Bool(true));
        } else {
            data.remove(IS_TJP_FIELD);
        }

        self.finish(Draft {
            ib: dest_ib,
            data,
            rel8ns,
            linked_rel8ns: opts.linked_rel8ns.clone(),
            dna: opts.dna.then(|| TransformOptions::Fork(opts.clone())),
            suppress_rel8ns: src_is_root,
        })
    }
}
