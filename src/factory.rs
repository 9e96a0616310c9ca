//! Factory: first-generation records in one call
//!
//! `first_gen` pipes fork -> mut8 (if data) -> rel8 (if relations), threading
//! the record through each step.

use crate::error::Result;
use crate::model::{IbGib, Rel8ns};
use crate::primitive::PrimitiveRegistry;
use crate::transform::{
    ForkOptions, Mut8Options, Rel8Options, TjpOptions, TransformResult, Transformer,
};
use serde_json::{Map, Value};

/// Inputs to [`Factory::first_gen`]
#[derive(Debug, Clone)]
pub struct FirstGenOptions {
    /// Label of the new record
    pub ib: String,
    /// Record to fork from, usually a primitive
    pub parent: IbGib,
    pub data: Option<Map<String, Value>>,
    pub rel8ns: Option<Rel8ns>,
    pub uuid: bool,
    pub tjp: Option<TjpOptions>,
    pub n_counter: bool,
    pub no_timestamp: bool,
    pub dna: bool,
    pub linked_rel8ns: Vec<String>,
}

impl FirstGenOptions {
    pub fn new(ib: impl Into<String>, parent: IbGib) -> Self {
        Self {
            ib: ib.into(),
            parent,
            data: None,
            rel8ns: None,
            uuid: false,
            tjp: None,
            n_counter: false,
            no_timestamp: false,
            dna: false,
            linked_rel8ns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Factory {
    transformer: Transformer,
    primitives: PrimitiveRegistry,
}

impl Factory {
    pub fn new(transformer: Transformer) -> Self {
        let primitives = PrimitiveRegistry::new(transformer.hasher().config().clone());
        Self {
            transformer,
            primitives,
        }
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn primitive(&self, ib: &str) -> Result<IbGib> {
        self.primitives.primitive(ib)
    }

    pub fn primitives(&self, ibs: &[&str]) -> Result<Vec<IbGib>> {
        self.primitives.primitives(ibs)
    }

    /// Fork, then mut8 with `data`, then rel8 with `rel8ns`.
    ///
    /// `intermediate_ibgibs` holds every record before the final one and
    /// `dnas` every DNA, both in step order. With neither data nor
    /// relations this is a bare fork.
    pub fn first_gen(&self, opts: &FirstGenOptions) -> Result<TransformResult> {
        let fork_opts = ForkOptions {
            dest_ib: Some(opts.ib.clone()),
            uuid: opts.uuid,
            tjp: opts.tjp,
            n_counter: opts.n_counter,
            no_timestamp: opts.no_timestamp,
            dna: opts.dna,
            linked_rel8ns: opts.linked_rel8ns.clone(),
            ..Default::default()
        };
        let forked = self.transformer.fork(&opts.parent, &fork_opts)?;

        let mut produced = vec![forked.new_ibgib];
        let mut dnas = forked.dnas.unwrap_or_default();

        if let Some(data) = opts.data.as_ref().filter(|d| !d.is_empty()) {
            let mut_opts = Mut8Options {
                data_to_add_or_patch: Some(data.clone()),
                n_counter: opts.n_counter,
                no_timestamp: opts.no_timestamp,
                dna: opts.dna,
                linked_rel8ns: opts.linked_rel8ns.clone(),
                ..Default::default()
            };
            let src = produced.last().cloned().unwrap_or_else(PrimitiveRegistry::root);
            let mutated = self.transformer.mut8(&src, &mut_opts)?;
            produced.push(mutated.new_ibgib);
            dnas.extend(mutated.dnas.unwrap_or_default());
        }

        if let Some(rel8ns) = opts.rel8ns.as_ref().filter(|r| !r.is_empty()) {
            let rel8_opts = Rel8Options {
                rel8ns_to_add_by_addr: Some(rel8ns.clone()),
                n_counter: opts.n_counter,
                no_timestamp: opts.no_timestamp,
                dna: opts.dna,
                linked_rel8ns: opts.linked_rel8ns.clone(),
                ..Default::default()
            };
            let src = produced.last().cloned().unwrap_or_else(PrimitiveRegistry::root);
            let related = self.transformer.rel8(&src, &rel8_opts)?;
            produced.push(related.new_ibgib);
            dnas.extend(related.dnas.unwrap_or_default());
        }

        let new_ibgib = produced.pop().unwrap_or_else(PrimitiveRegistry::root);
        log::debug!(
            "first_gen '{}' -> {} ({} intermediate)",
            opts.ib,
            new_ibgib.addr(),
            produced.len()
        );
        Ok(TransformResult {
            new_ibgib,
            dnas: if opts.dna { Some(dnas) } else { None },
            intermediate_ibgibs: if produced.is_empty() {
                None
            } else {
                Some(produced)
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ANCESTOR_REL8N_NAME, COUNTER_FIELD, PAST_REL8N_NAME, TJP_REL8N_NAME};
    use crate::validate::Validator;
    use serde_json::json;

    #[test]
    fn test_bare_fork_when_no_payloads() {
        let factory = Factory::default();
        let parent = factory.primitive("comment").unwrap();
        let result = factory.first_gen(&FirstGenOptions::new("comment hello", parent)).unwrap();
        assert_eq!(result.new_ibgib.ib, "comment hello");
        assert_eq!(result.new_ibgib.rel8n(ANCESTOR_REL8N_NAME), ["comment^gib".to_string()]);
        assert!(result.intermediate_ibgibs.is_none());
        assert!(result.dnas.is_none());
    }

    #[test]
    fn test_full_pipeline() {
        let factory = Factory::default();
        let parent = factory.primitive("comment").unwrap();
        let mut rel8ns = Rel8ns::new();
        rel8ns.insert("tag".into(), vec!["tag^gib".into()]);
        let opts = FirstGenOptions {
            data: Some(json!({"text": "hello"}).as_object().unwrap().clone()),
            rel8ns: Some(rel8ns),
            tjp: Some(TjpOptions { uuid: true, timestamp: true }),
            n_counter: true,
            dna: true,
            linked_rel8ns: vec![PAST_REL8N_NAME.into()],
            ..FirstGenOptions::new("comment hello", parent)
        };
        let result = factory.first_gen(&opts).unwrap();

        let intermediates = result.intermediate_ibgibs.as_ref().unwrap();
        assert_eq!(intermediates.len(), 2);
        let (forked, mutated) = (&intermediates[0], &intermediates[1]);
        assert!(forked.is_tjp());
        assert_eq!(mutated.rel8n(TJP_REL8N_NAME), [forked.addr()]);

        let last = &result.new_ibgib;
        assert_eq!(last.data_field("text"), Some(&json!("hello")));
        assert_eq!(last.data_field(COUNTER_FIELD), Some(&json!(2)));
        assert_eq!(last.rel8n("tag"), ["tag^gib".to_string()]);
        assert_eq!(last.rel8n(PAST_REL8N_NAME), [mutated.addr()]);
        assert_eq!(last.rel8n(TJP_REL8N_NAME), [forked.addr()]);

        let dnas = result.dnas.as_ref().unwrap();
        let kinds: Vec<&str> = dnas.iter().map(|d| d.ib.as_str()).collect();
        assert_eq!(kinds, ["fork", "mut8", "rel8"]);

        let validator = Validator::default();
        for record in intermediates.iter().chain(dnas.iter()).chain(std::iter::once(last)) {
            assert!(validator.validate_ibgib(record).is_empty(), "{}", record.addr());
        }
    }

    #[test]
    fn test_rel8_only_captures_tjp() {
        let factory = Factory::default();
        let mut rel8ns = Rel8ns::new();
        rel8ns.insert("x".into(), vec!["a^gib".into()]);
        let opts = FirstGenOptions {
            rel8ns: Some(rel8ns),
            tjp: Some(TjpOptions { uuid: false, timestamp: true }),
            ..FirstGenOptions::new("thing", PrimitiveRegistry::root())
        };
        let result = factory.first_gen(&opts).unwrap();
        let forked = &result.intermediate_ibgibs.as_ref().unwrap()[0];
        assert!(forked.rel8ns.is_none());
        assert_eq!(result.new_ibgib.rel8n(TJP_REL8N_NAME), [forked.addr()]);
    }

    #[test]
    fn test_errors_propagate() {
        let factory = Factory::default();
        let mut rel8ns = Rel8ns::new();
        rel8ns.insert("past".into(), vec!["a^gib".into()]);
        let opts = FirstGenOptions {
            rel8ns: Some(rel8ns),
            ..FirstGenOptions::new("thing", PrimitiveRegistry::root())
        };
        assert!(factory.first_gen(&opts).is_err());
    }
}
