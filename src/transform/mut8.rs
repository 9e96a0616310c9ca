//! Mut8: change a record's intrinsic data and/or label

use super::{is_false, Draft, TransformOptions, TransformResult, Transformer};
use crate::error::{IbGibError, Result};
use crate::model::{patch, remove_keys, rename_keys, IbGib, PAST_REL8N_NAME};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mut8Options {
    /// `{"old": "new"}`, nested maps recurse into child documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_to_rename: Option<Map<String, Value>>,
    /// `{"key": true}`, nested maps recurse into child documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_to_remove: Option<Map<String, Value>>,
    /// Merge-patched onto the data after renames and removals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_to_add_or_patch: Option<Map<String, Value>>,
    /// New label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mut8_ib: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub n_counter: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub no_timestamp: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub dna: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_rel8ns: Vec<String>,
}

impl Mut8Options {
    fn has_mutation(&self) -> bool {
        self.data_to_rename.is_some()
            || self.data_to_remove.is_some()
            || self.data_to_add_or_patch.is_some()
            || self.mut8_ib.is_some()
    }
}

impl Transformer {
    /// Mutate `src`; the result's `past` ends with `src`.
    ///
    /// Order: rename, remove, add/patch, then counter and timestamp.
    pub fn mut8(&self, src: &IbGib, opts: &Mut8Options) -> Result<TransformResult> {
        self.check_mutable(src, "mutate")?;
        if !opts.has_mutation() {
            return Err(IbGibError::Precondition(
                "mut8 requires dataToRename, dataToRemove, dataToAddOrPatch or mut8Ib".into(),
            ));
        }
        let ib = match &opts.mut8_ib {
            Some(new_ib) => {
                self.check_new_ib(new_ib)?;
                new_ib.clone()
            }
            None => src.ib.clone(),
        };

        let mut data = self.source_data(src)?;
        if let Some(renames) = &opts.data_to_rename {
            rename_keys(&mut data, renames)?;
        }
        if let Some(removals) = &opts.data_to_remove {
            remove_keys(&mut data, removals)?;
        }
        if let Some(changes) = &opts.data_to_add_or_patch {
            let mut doc = Value::Object(data);
            patch(&mut doc, &Value::Object(changes.clone()));
            data = match doc {
                Value::Object(map) => map,
                _ => Map::new(),
            };
        }

        let mut rel8ns = src.rel8ns.clone().unwrap_or_default();
        rel8ns
            .entry(PAST_REL8N_NAME.to_string())
            .or_default()
            .push(self.source_addr(src));
        self.promote_tjp(src, &mut data, &mut rel8ns);
        self.bookkeep(&mut data, opts.n_counter, opts.no_timestamp)?;

        self.finish(Draft {
            ib,
            data,
            rel8ns,
            linked_rel8ns: opts.linked_rel8ns.clone(),
            dna: opts.dna.then(|| TransformOptions::Mut8(opts.clone())),
            suppress_rel8ns: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{COUNTER_FIELD, DNA_REL8N_NAME, TIMESTAMP_FIELD, TJP_REL8N_NAME};
    use crate::transform::{ForkOptions, TjpOptions};
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn start(t: &Transformer) -> IbGib {
        t.fork(
            &IbGib::new("ib", "gib"),
            &ForkOptions { dest_ib: Some("doc".into()), no_timestamp: true, ..Default::default() },
        )
        .unwrap()
        .new_ibgib
    }

    #[test]
    fn test_add_then_remove_leaves_no_data() {
        let t = Transformer::default();
        let s = start(&t);
        let added = t
            .mut8(
                &s,
                &Mut8Options {
                    data_to_add_or_patch: Some(map(json!({"x": 1}))),
                    no_timestamp: true,
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        assert_eq!(added.data_field("x"), Some(&json!(1)));

        let removed = t
            .mut8(
                &added,
                &Mut8Options {
                    data_to_remove: Some(map(json!({"x": ""}))),
                    no_timestamp: true,
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        assert!(removed.data.is_none());
        assert_eq!(removed.rel8n(PAST_REL8N_NAME), [s.addr(), added.addr()]);
    }

    #[test]
    fn test_past_ends_with_source() {
        let t = Transformer::default();
        let s = start(&t);
        let m = t
            .mut8(&s, &Mut8Options { mut8_ib: Some("renamed".into()), ..Default::default() })
            .unwrap()
            .new_ibgib;
        assert_eq!(m.ib, "renamed");
        assert_eq!(m.rel8n(PAST_REL8N_NAME).last(), Some(&s.addr()));
        assert!(m.data_field(TIMESTAMP_FIELD).is_some());

        let linked = t
            .mut8(
                &m,
                &Mut8Options {
                    data_to_add_or_patch: Some(map(json!({"a": 1}))),
                    linked_rel8ns: vec![PAST_REL8N_NAME.into()],
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        assert_eq!(linked.rel8n(PAST_REL8N_NAME), [m.addr()]);
    }

    #[test]
    fn test_rename_remove_patch_order() {
        let t = Transformer::default();
        let s = start(&t);
        let seeded = t
            .mut8(
                &s,
                &Mut8Options {
                    data_to_add_or_patch: Some(map(json!({"a": 1, "b": 2, "nested": {"c": 3, "d": [1, 2]}}))),
                    no_timestamp: true,
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        let m = t
            .mut8(
                &seeded,
                &Mut8Options {
                    data_to_rename: Some(map(json!({"a": "alpha", "nested": {"c": "gamma"}}))),
                    data_to_remove: Some(map(json!({"b": true}))),
                    data_to_add_or_patch: Some(map(json!({"nested": {"d": [9]}}))),
                    no_timestamp: true,
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        assert_eq!(m.data, Some(json!({"alpha": 1, "nested": {"gamma": 3, "d": [9]}})));
    }

    #[test]
    fn test_rejections() {
        let t = Transformer::default();
        let s = start(&t);

        let primitive = IbGib::new("tag", "gib");
        let any = Mut8Options { mut8_ib: Some("x".into()), ..Default::default() };
        assert!(matches!(t.mut8(&primitive, &any), Err(IbGibError::Precondition(_))));

        assert!(matches!(t.mut8(&s, &Mut8Options::default()), Err(IbGibError::Precondition(_))));

        let to_timestamp = Mut8Options {
            data_to_rename: Some(map(json!({"when": "timestamp"}))),
            ..Default::default()
        };
        assert!(matches!(t.mut8(&s, &to_timestamp), Err(IbGibError::Unsupported(_))));

        let bad_ib = Mut8Options { mut8_ib: Some("a^b".into()), ..Default::default() };
        assert!(matches!(t.mut8(&s, &bad_ib), Err(IbGibError::Precondition(_))));

        for bad in ["a\nb".to_string(), "y".repeat(156), String::new()] {
            let relabel = Mut8Options { mut8_ib: Some(bad.clone()), ..Default::default() };
            assert!(matches!(t.mut8(&s, &relabel), Err(IbGibError::Precondition(_))), "{:?}", bad);
        }
    }

    #[test]
    fn test_counter_increments_and_recovers() {
        let t = Transformer::default();
        let s = start(&t);
        let counted = Mut8Options {
            data_to_add_or_patch: Some(map(json!({"k": "v"}))),
            n_counter: true,
            no_timestamp: true,
            ..Default::default()
        };
        let first = t.mut8(&s, &counted).unwrap().new_ibgib;
        assert_eq!(first.data_field(COUNTER_FIELD), Some(&json!(0)));
        let second = t.mut8(&first, &counted).unwrap().new_ibgib;
        assert_eq!(second.data_field(COUNTER_FIELD), Some(&json!(1)));

        let negative = t
            .mut8(
                &second,
                &Mut8Options { data_to_add_or_patch: Some(map(json!({"n": -3}))), no_timestamp: true, ..Default::default() },
            )
            .unwrap()
            .new_ibgib;
        let reset = t.mut8(&negative, &counted).unwrap().new_ibgib;
        assert_eq!(reset.data_field(COUNTER_FIELD), Some(&json!(0)));

        let fractional = t
            .mut8(
                &second,
                &Mut8Options { data_to_add_or_patch: Some(map(json!({"n": 2.5}))), no_timestamp: true, ..Default::default() },
            )
            .unwrap()
            .new_ibgib;
        assert!(matches!(t.mut8(&fractional, &counted), Err(IbGibError::IntegrityAssumption(_))));
    }

    #[test]
    fn test_promotes_tjp() {
        let t = Transformer::default();
        let origin = t
            .fork(
                &IbGib::new("ib", "gib"),
                &ForkOptions {
                    dest_ib: Some("origin".into()),
                    tjp: Some(TjpOptions { uuid: true, timestamp: true }),
                    ..Default::default()
                },
            )
            .unwrap()
            .new_ibgib;
        let m = t
            .mut8(&origin, &Mut8Options { data_to_add_or_patch: Some(map(json!({"a": 1}))), ..Default::default() })
            .unwrap()
            .new_ibgib;
        assert!(!m.is_tjp());
        assert_eq!(m.rel8n(TJP_REL8N_NAME), [origin.addr()]);
        assert!(m.gib.ends_with(&format!(".{}", origin.gib)));
    }

    #[test]
    fn test_dna_rel8n_and_data() {
        let t = Transformer::default();
        let s = start(&t);
        let opts = Mut8Options {
            data_to_add_or_patch: Some(map(json!({"x": 1}))),
            dna: true,
            ..Default::default()
        };
        let result = t.mut8(&s, &opts).unwrap();
        let dnas = result.dnas.unwrap();
        assert_eq!(dnas.len(), 1);
        assert_eq!(result.new_ibgib.rel8n(DNA_REL8N_NAME), [dnas[0].addr()]);
        assert_eq!(
            dnas[0].data,
            Some(json!({"type": "mut8", "dataToAddOrPatch": {"x": 1}, "dna": true}))
        );
        assert!(result.intermediate_ibgibs.is_none());
    }
}
