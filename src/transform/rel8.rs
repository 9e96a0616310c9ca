//! Rel8: add and remove relation edges

use super::{is_false, Draft, TransformOptions, TransformResult, Transformer};
use crate::address::is_minimally_well_formed;
use crate::error::{IbGibError, Result};
use crate::model::{IbGib, Rel8ns, PAST_REL8N_NAME, PROTECTED_REL8N_NAMES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rel8Options {
    /// Addresses to append per relation name (already-present ones are skipped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel8ns_to_add_by_addr: Option<Rel8ns>,
    /// Addresses to drop per relation name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel8ns_to_remove_by_addr: Option<Rel8ns>,
    #[serde(skip_serializing_if = "is_false")]
    pub n_counter: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub no_timestamp: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dna: bool,
    /// Relations collapsed to their last entry after the edit.
    ///
    /// Adds skip addresses already present, so re-adding an address that is
    /// not the current last entry leaves it where it was, and the collapse
    /// keeps the existing last entry instead: `tag=[a, b]` plus a linked add
    /// of `a` yields `[b]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_rel8ns: Vec<String>,
}

impl Transformer {
    /// Edit the relations of `src`; the result's `past` ends with `src`.
    pub fn rel8(&self, src: &IbGib, opts: &Rel8Options) -> Result<TransformResult> {
        self.check_mutable(src, "relate")?;

        let to_add = opts.rel8ns_to_add_by_addr.as_ref().filter(|m| !m.is_empty());
        let to_remove = opts.rel8ns_to_remove_by_addr.as_ref().filter(|m| !m.is_empty());
        if to_add.is_none() && to_remove.is_none() {
            return Err(IbGibError::Precondition(
                "rel8 requires a non-empty rel8nsToAddByAddr or rel8nsToRemoveByAddr".into(),
            ));
        }
        for edits in [to_add, to_remove].into_iter().flatten() {
            self.check_rel8n_edits(edits)?;
        }

        let mut rel8ns = src.rel8ns.clone().unwrap_or_default();
        if let Some(adds) = to_add {
            for (name, addrs) in adds {
                let existing = rel8ns.entry(name.clone()).or_default();
                for addr in addrs {
                    if !existing.contains(addr) {
                        existing.push(addr.clone());
                    }
                }
            }
        }
        if let Some(removes) = to_remove {
            for (name, addrs) in removes {
                if let Some(existing) = rel8ns.get_mut(name) {
                    existing.retain(|a| !addrs.contains(a));
                    if existing.is_empty() {
                        rel8ns.remove(name);
                    }
                }
            }
        }
        rel8ns
            .entry(PAST_REL8N_NAME.to_string())
            .or_default()
            .push(self.source_addr(src));

        let mut data = self.source_data(src)?;
        self.promote_tjp(src, &mut data, &mut rel8ns);
        self.bookkeep(&mut data, opts.n_counter, opts.no_timestamp)?;

        self.finish(Draft {
            ib: src.ib.clone(),
            data,
            rel8ns,
            linked_rel8ns: opts.linked_rel8ns.clone(),
            dna: opts.dna.then(|| TransformOptions::Rel8(opts.clone())),
            suppress_rel8ns: false,
        })
    }

    fn check_rel8n_edits(&self, edits: &Rel8ns) -> Result<()> {
        for (name, addrs) in edits {
            self.check_label("relation name", name)?;
            if PROTECTED_REL8N_NAMES.contains(&name.as_str()) {
                return Err(IbGibError::Unsupported(format!(
                    "relation '{}' is managed by transforms and cannot be edited with rel8",
                    name
                )));
            }
            if let Some(bad) = addrs
                .iter()
                .find(|a| !is_minimally_well_formed(a, self.delimiter()))
            {
                return Err(IbGibError::Precondition(format!(
                    "malformed address '{}' under relation '{}'",
                    bad, name
                )));
            }
        }
        Ok(())
    }
}
