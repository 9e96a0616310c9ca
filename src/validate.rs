//! Validator: re-derive and check records
//!
//! Every check returns a list of diagnostics; an empty list means valid.
//! Nothing here fails fast, so a large graph can be validated in one pass.

use crate::config::ProtocolConfig;
use crate::error::ValidationIssue;
use crate::hash::Hasher;
use crate::model::{IbGib, Rel8ns, PRIMITIVE_GIB};

/// Hex digest lengths accepted in a gib (128- and 256-bit digests)
const HEX_GIB_LENGTHS: [usize; 2] = [32, 64];

#[derive(Debug, Clone, Default)]
pub struct Validator {
    hasher: Hasher,
}

impl Validator {
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }

    fn config(&self) -> &ProtocolConfig {
        self.hasher.config()
    }

    /// Labels: non-empty, bounded, no control characters, no address delimiter
    pub fn validate_label(&self, ib: &str) -> Vec<ValidationIssue> {
        self.config()
            .label_problems(ib)
            .into_iter()
            .map(|reason| ValidationIssue::InvalidLabel {
                label: ib.to_string(),
                reason,
            })
            .collect()
    }

    /// `gib`, a 32/64-char hex digest, or `<hex><compound delim><valid gib>`
    pub fn validate_gib(&self, gib: &str) -> Vec<ValidationIssue> {
        match self.gib_problem(gib) {
            None => Vec::new(),
            Some(reason) => vec![ValidationIssue::InvalidGib {
                gib: gib.to_string(),
                reason,
            }],
        }
    }

    fn gib_problem(&self, gib: &str) -> Option<String> {
        if gib == PRIMITIVE_GIB {
            return None;
        }
        if gib.is_empty() {
            return Some("empty".into());
        }
        match gib.split_once(self.config().compound_delimiter.as_str()) {
            Some((punctiliar, timeline)) => {
                if !is_hex_gib(punctiliar) {
                    return Some(format!("punctiliar part '{}' is not a hex digest", punctiliar));
                }
                self.gib_problem(timeline)
                    .map(|reason| format!("timeline part '{}': {}", timeline, reason))
            }
            None if is_hex_gib(gib) => None,
            None => Some(format!(
                "expected '{}' or a hex digest of length {:?}",
                PRIMITIVE_GIB, HEX_GIB_LENGTHS
            )),
        }
    }

    /// Delimiter present and not at either end, label clean, gib well-formed
    pub fn validate_address(&self, addr: &str) -> Vec<ValidationIssue> {
        let delimiter = self.config().address_delimiter.as_str();
        let invalid = |reason: String| ValidationIssue::InvalidAddress {
            address: addr.to_string(),
            reason,
        };
        let Some((ib, gib)) = addr.rsplit_once(delimiter) else {
            return vec![invalid(format!("missing delimiter '{}'", delimiter))];
        };
        if ib.is_empty() {
            return vec![invalid("delimiter at start (empty ib)".into())];
        }
        if gib.is_empty() {
            return vec![invalid("delimiter at end (empty gib)".into())];
        }
        let mut issues: Vec<ValidationIssue> = self
            .validate_label(ib)
            .into_iter()
            .map(|issue| invalid(issue.to_string()))
            .collect();
        issues.extend(
            self.validate_gib(gib)
                .into_iter()
                .map(|issue| invalid(issue.to_string())),
        );
        issues
    }

    /// Every relation name is label-shaped and every address is valid
    pub fn validate_relations(&self, rel8ns: &Rel8ns) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (name, addrs) in rel8ns {
            for issue in self.validate_label(name) {
                issues.push(ValidationIssue::InvalidRelation {
                    name: name.clone(),
                    reason: issue.to_string(),
                });
            }
            for addr in addrs {
                issues.extend(self.validate_address(addr));
            }
        }
        issues
    }

    /// Recompute the gib (timeline-aware) and compare. Primitives pass.
    pub fn validate_intrinsic(&self, record: &IbGib) -> Vec<ValidationIssue> {
        if record.is_primitive() {
            return Vec::new();
        }
        match self.hasher.gib(record) {
            Ok(computed) if computed == record.gib => Vec::new(),
            Ok(computed) => {
                log::debug!("gib mismatch on '{}': {} != {}", record.ib, record.gib, computed);
                vec![ValidationIssue::GibMismatch {
                    ib: record.ib.clone(),
                    stored: record.gib.clone(),
                    computed,
                }]
            }
            Err(e) => vec![ValidationIssue::Unhashable {
                ib: record.ib.clone(),
                reason: e.to_string(),
            }],
        }
    }

    /// Label, gib shape, relations and intrinsic hash in one pass
    pub fn validate_ibgib(&self, record: &IbGib) -> Vec<ValidationIssue> {
        let mut issues = self.validate_label(&record.ib);
        issues.extend(self.validate_gib(&record.gib));
        if let Some(rel8ns) = &record.rel8ns {
            issues.extend(self.validate_relations(rel8ns));
        }
        issues.extend(self.validate_intrinsic(record));
        issues
    }

    /// Validate many records; only records with issues are reported
    pub fn validate_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a IbGib>,
    ) -> Vec<(String, Vec<ValidationIssue>)> {
        records
            .into_iter()
            .filter_map(|record| {
                let issues = self.validate_ibgib(record);
                if issues.is_empty() {
                    None
                } else {
                    Some((record.addr_with(&self.config().address_delimiter), issues))
                }
            })
            .collect()
    }
}

fn is_hex_gib(s: &str) -> bool {
    HEX_GIB_LENGTHS.contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TJP_REL8N_NAME;
    use crate::transform::{ForkOptions, Mut8Options, TjpOptions, Transformer};
    use serde_json::json;

    const HEX64: &str = "765DBB8C38A58A5DC019D7B3133DFFB251D643CB291328AD8E86D4F05655E68B";

    #[test]
    fn test_validate_address_shapes() {
        let v = Validator::default();
        assert!(v.validate_address("ib^gib").is_empty());
        assert!(v.validate_address(&format!("x^{}", HEX64)).is_empty());
        assert!(v.validate_address(&format!("x^{}", &HEX64[..32])).is_empty());
        assert!(v.validate_address(&format!("x^{}.{}", HEX64, HEX64)).is_empty());
        assert!(v.validate_address(&format!("x^{}.{}.{}", HEX64, HEX64, HEX64)).is_empty());

        for bad in [
            "nodelim".to_string(),
            "^gib".to_string(),
            "x^".to_string(),
            format!("a^b^{}", HEX64),
            "x^ABC".to_string(),
            format!("x^{}.", HEX64),
            format!("x^{}.XYZ", HEX64),
            format!("x^{}", &HEX64[..40]),
        ] {
            assert_eq!(v.validate_address(&bad).len(), 1, "{}", bad);
        }
    }

    #[test]
    fn test_validate_label() {
        let v = Validator::default();
        assert!(v.validate_label("comment hello world").is_empty());
        assert_eq!(v.validate_label("").len(), 1);
        assert_eq!(v.validate_label("a\nb").len(), 1);
        assert_eq!(v.validate_label(&"x".repeat(156)).len(), 1);
    }

    #[test]
    fn test_validate_relations() {
        let v = Validator::default();
        let mut rel8ns = Rel8ns::new();
        rel8ns.insert("good".into(), vec!["ib^gib".into()]);
        assert!(v.validate_relations(&rel8ns).is_empty());
        rel8ns.insert("bad^name".into(), vec!["oops".into(), "ib^gib".into()]);
        let issues = v.validate_relations(&rel8ns);
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], ValidationIssue::InvalidRelation { .. }));
        assert!(matches!(issues[1], ValidationIssue::InvalidAddress { .. }));
    }

    #[test]
    fn test_intrinsic_detects_tampering() {
        let t = Transformer::default();
        let v = Validator::new(t.hasher().clone());
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
        let frame = t
            .mut8(
                &origin,
                &Mut8Options { data_to_add_or_patch: json!({"a": 1}).as_object().cloned(), ..Default::default() },
            )
            .unwrap()
            .new_ibgib;
        assert!(v.validate_ibgib(&origin).is_empty());
        assert!(v.validate_ibgib(&frame).is_empty());

        let mut tampered = frame.clone();
        tampered.data = Some(json!({"a": 2}));
        let issues = v.validate_intrinsic(&tampered);
        assert!(matches!(issues.as_slice(), [ValidationIssue::GibMismatch { .. }]));

        let mut broken_tjp = frame.clone();
        if let Some(rel8ns) = broken_tjp.rel8ns.as_mut() {
            rel8ns.insert(TJP_REL8N_NAME.into(), vec!["nodelimiter".into()]);
        }
        let issues = v.validate_intrinsic(&broken_tjp);
        assert!(matches!(issues.as_slice(), [ValidationIssue::Unhashable { .. }]));

        // primitives carry no guarantee to check
        assert!(v.validate_intrinsic(&IbGib::new("anything", "gib")).is_empty());
    }

    #[test]
    fn test_validate_all_reports_only_bad_records() {
        let t = Transformer::default();
        let v = Validator::default();
        let good = t
            .fork(&IbGib::new("ib", "gib"), &ForkOptions { dest_ib: Some("good".into()), ..Default::default() })
            .unwrap()
            .new_ibgib;
        let mut bad = good.clone();
        bad.ib = "bad".into();
        let report = v.validate_all([&good, &bad]);
        assert_eq!(report.len(), 1);
        assert!(report[0].0.starts_with("bad^"));
    }
}
