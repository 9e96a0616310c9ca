//! Transforms: the only way new records come into existence
//!
//! - **fork**: start a new lineage from a source (`ancestor` grows)
//! - **mut8**: change data and/or label (`past` grows)
//! - **rel8**: change relations (`past` grows)
//!
//! Each transform is a pure function of (source, options). The source is
//! borrowed and cloned, never touched. When `dna` is requested the options
//! themselves become a record that can be replayed later.

mod fork;
mod mut8;
mod rel8;

pub use fork::{ForkOptions, TjpOptions};
pub use mut8::Mut8Options;
pub use rel8::Rel8Options;

use crate::error::{IbGibError, Result};
use crate::hash::Hasher;
use crate::model::{
    IbGib, Rel8ns, ANCESTOR_REL8N_NAME, COUNTER_FIELD, DNA_REL8N_NAME, IS_TJP_FIELD,
    PRIMITIVE_GIB, TIMESTAMP_FIELD, TJP_REL8N_NAME,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of a transform
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// The record produced by the final step
    pub new_ibgib: IbGib,
    /// DNA records, in step order, when requested
    pub dnas: Option<Vec<IbGib>>,
    /// Records produced along the way by multi-step operations
    pub intermediate_ibgibs: Option<Vec<IbGib>>,
}

/// Which transform a DNA record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformType {
    Fork,
    Mut8,
    Rel8,
}

impl TransformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformType::Fork => "fork",
            TransformType::Mut8 => "mut8",
            TransformType::Rel8 => "rel8",
        }
    }
}

/// Options of any transform, tagged by `type`. This is exactly the data
/// stored in a DNA record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformOptions {
    Fork(ForkOptions),
    Mut8(Mut8Options),
    Rel8(Rel8Options),
}

impl TransformOptions {
    pub fn transform_type(&self) -> TransformType {
        match self {
            TransformOptions::Fork(_) => TransformType::Fork,
            TransformOptions::Mut8(_) => TransformType::Mut8,
            TransformOptions::Rel8(_) => TransformType::Rel8,
        }
    }

    /// Parse the options recorded in a DNA record
    pub fn from_dna(dna: &IbGib) -> Result<Self> {
        let data = dna.data.clone().ok_or_else(|| {
            IbGibError::Precondition(format!("dna record '{}' has no data", dna.addr()))
        })?;
        let opts: TransformOptions = serde_json::from_value(data)?;
        if dna.ib != opts.transform_type().as_str() {
            return Err(IbGibError::Precondition(format!(
                "dna labelled '{}' carries {} options",
                dna.ib,
                opts.transform_type().as_str()
            )));
        }
        Ok(opts)
    }

    /// Same options with DNA generation switched on
    fn with_dna(mut self) -> Self {
        match &mut self {
            TransformOptions::Fork(o) => o.dna = true,
            TransformOptions::Mut8(o) => o.dna = true,
            TransformOptions::Rel8(o) => o.dna = true,
        }
        self
    }
}

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}

/// Current UTC time in HTTP-date form: `Tue, 15 Oct 2024 10:00:00 GMT`
pub(crate) fn timestamp_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A record about to be hashed
pub(crate) struct Draft {
    pub ib: String,
    pub data: Map<String, Value>,
    pub rel8ns: Rel8ns,
    pub linked_rel8ns: Vec<String>,
    /// Options to record as DNA, if requested
    pub dna: Option<TransformOptions>,
    /// Forks from the root carry no relations at all
    pub suppress_rel8ns: bool,
}

/// Applies transforms using one hasher configuration
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    hasher: Hasher,
}

impl Transformer {
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Dispatch on tagged options
    pub fn apply(&self, src: &IbGib, opts: &TransformOptions) -> Result<TransformResult> {
        match opts {
            TransformOptions::Fork(o) => self.fork(src, o),
            TransformOptions::Mut8(o) => self.mut8(src, o),
            TransformOptions::Rel8(o) => self.rel8(src, o),
        }
    }

    /// Re-apply the options recorded in `dna` to `src`.
    ///
    /// The DNA is checked against its own gib first; the regenerated DNA
    /// is byte-identical to `dna` whatever the source.
    pub fn replay(&self, dna: &IbGib, src: &IbGib) -> Result<TransformResult> {
        let computed = self.hasher.gib(dna)?;
        if computed != dna.gib {
            return Err(IbGibError::Validation(format!(
                "dna '{}' does not hash to its gib (computed {})",
                dna.addr(),
                computed
            )));
        }
        let opts = TransformOptions::from_dna(dna)?.with_dna();
        log::debug!("replaying {} dna {} onto {}", dna.ib, dna.gib, src.addr());
        self.apply(src, &opts)
    }

    /// Build the DNA record for a set of options
    pub fn build_dna(&self, opts: &TransformOptions) -> Result<IbGib> {
        let ib = opts.transform_type().as_str();
        let data = serde_json::to_value(opts)?;
        let mut rel8ns = Rel8ns::new();
        rel8ns.insert(
            ANCESTOR_REL8N_NAME.to_string(),
            vec![format!("{}{}{}", ib, self.delimiter(), PRIMITIVE_GIB)],
        );
        let mut dna = IbGib {
            ib: ib.to_string(),
            gib: String::new(),
            data: Some(data),
            rel8ns: Some(rel8ns),
        };
        dna.gib = self.hasher.gib(&dna)?;
        Ok(dna)
    }

    pub(crate) fn delimiter(&self) -> &str {
        &self.hasher.config().address_delimiter
    }

    pub(crate) fn source_addr(&self, src: &IbGib) -> String {
        src.addr_with(self.delimiter())
    }

    /// Every source needs an ib and a gib
    pub(crate) fn check_source(&self, src: &IbGib) -> Result<()> {
        if src.ib.is_empty() {
            return Err(IbGibError::Precondition("source ib required".into()));
        }
        if src.gib.is_empty() {
            return Err(IbGibError::Precondition(format!(
                "source gib required (ib '{}')",
                src.ib
            )));
        }
        Ok(())
    }

    /// mut8/rel8 additionally refuse primitives
    pub(crate) fn check_mutable(&self, src: &IbGib, verb: &str) -> Result<()> {
        self.check_source(src)?;
        if src.is_primitive() {
            return Err(IbGibError::Precondition(format!(
                "cannot {} primitive '{}'",
                verb,
                self.source_addr(src)
            )));
        }
        Ok(())
    }

    /// A new ib or relation name must pass the same label rules the validator applies
    pub(crate) fn check_label(&self, what: &str, label: &str) -> Result<()> {
        let problems = self.hasher.config().label_problems(label);
        if problems.is_empty() {
            return Ok(());
        }
        Err(IbGibError::Precondition(format!(
            "{} '{}' is not a valid label: {}",
            what,
            label,
            problems.join(", ")
        )))
    }

    pub(crate) fn check_new_ib(&self, ib: &str) -> Result<()> {
        self.check_label("ib", ib)
    }

    /// Deep copy of the source data as a keyed document
    pub(crate) fn source_data(&self, src: &IbGib) -> Result<Map<String, Value>> {
        match &src.data {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(IbGibError::Precondition(format!(
                "data of '{}' is not a keyed document",
                self.source_addr(src)
            ))),
        }
    }

    /// A tjp-marked source becomes the `tjp` of the new frame
    pub(crate) fn promote_tjp(&self, src: &IbGib, data: &mut Map<String, Value>, rel8ns: &mut Rel8ns) {
        if src.is_tjp() {
            rel8ns
                .entry(TJP_REL8N_NAME.to_string())
                .or_default()
                .push(self.source_addr(src));
            data.remove(IS_TJP_FIELD);
        }
    }

    /// Counter and timestamp handling shared by mut8 and rel8
    pub(crate) fn bookkeep(
        &self,
        data: &mut Map<String, Value>,
        n_counter: bool,
        no_timestamp: bool,
    ) -> Result<()> {
        if n_counter {
            bump_counter(data)?;
        }
        if !no_timestamp {
            data.insert(TIMESTAMP_FIELD.to_string(), Value::String(timestamp_now()));
        }
        Ok(())
    }

    /// DNA, linked collapse, empty-field pruning, hashing
    pub(crate) fn finish(&self, draft: Draft) -> Result<TransformResult> {
        let Draft {
            ib,
            data,
            mut rel8ns,
            linked_rel8ns,
            dna,
            suppress_rel8ns,
        } = draft;

        let dna_record = match dna {
            Some(opts) => Some(self.build_dna(&opts)?),
            None => None,
        };
        if let Some(dna) = &dna_record {
            rel8ns
                .entry(DNA_REL8N_NAME.to_string())
                .or_default()
                .push(self.source_addr(dna));
        }

        for name in &linked_rel8ns {
            if let Some(addrs) = rel8ns.get_mut(name) {
                if addrs.len() > 1 {
                    addrs.drain(..addrs.len() - 1);
                }
            }
        }
        rel8ns.retain(|_, addrs| !addrs.is_empty());
        if suppress_rel8ns {
            rel8ns.clear();
        }

        let mut new_ibgib = IbGib {
            ib,
            gib: String::new(),
            data: if data.is_empty() {
                None
            } else {
                Some(Value::Object(data))
            },
            rel8ns: if rel8ns.is_empty() { None } else { Some(rel8ns) },
        };
        new_ibgib.gib = self.hasher.gib(&new_ibgib)?;
        log::debug!("transform produced {}", self.source_addr(&new_ibgib));

        Ok(TransformResult {
            new_ibgib,
            dnas: dna_record.map(|d| vec![d]),
            intermediate_ibgibs: None,
        })
    }
}

/// Absent counter starts at 0; a non-negative integer increments; a
/// negative integer resets to 0 with a warning; anything else is an error.
/// Whole-valued floats (`3.0`) are treated as integers.
fn bump_counter(data: &mut Map<String, Value>) -> Result<()> {
    let next = match data.get(COUNTER_FIELD) {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => {
            // whole-valued floats such as 3.0 count as integers
            let whole = n
                .as_i64()
                .map(|i| i as f64)
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0));
            match (n.as_u64(), whole) {
                (Some(current), _) => current.checked_add(1).ok_or_else(|| {
                    IbGibError::IntegrityAssumption(format!("counter '{}' overflowed", COUNTER_FIELD))
                })?,
                (None, Some(f)) if f >= 0.0 => (f as u64).saturating_add(1),
                (None, Some(_)) => {
                    log::warn!(
                        "counter '{}' was negative ({}), resetting to 0",
                        COUNTER_FIELD,
                        n
                    );
                    0
                }
                (None, None) => {
                    return Err(IbGibError::IntegrityAssumption(format!(
                        "counter '{}' is not an integer: {}",
                        COUNTER_FIELD, n
                    )));
                }
            }
        }
        Some(other) => {
            return Err(IbGibError::IntegrityAssumption(format!(
                "counter '{}' is not an integer: {}",
                COUNTER_FIELD, other
            )));
        }
    };
    data.insert(COUNTER_FIELD.to_string(), Value::from(next));
    Ok(())
}
