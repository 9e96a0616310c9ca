//! Primitive registry
//!
//! Primitives are records whose gib is the literal `gib`. They carry no
//! cryptographic guarantee: anything may relate to them, nothing may mutate
//! or relate from them. `ib^gib` is the universal root.

use crate::address::Address;
use crate::config::ProtocolConfig;
use crate::error::{IbGibError, Result};
use crate::model::{IbGib, PRIMITIVE_GIB, ROOT_IB};
use crate::transform::TransformType;
use std::collections::BTreeMap;

/// Known primitives, keyed by label
#[derive(Debug, Clone)]
pub struct PrimitiveRegistry {
    config: ProtocolConfig,
    known: BTreeMap<String, IbGib>,
}

impl Default for PrimitiveRegistry {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

impl PrimitiveRegistry {
    /// Registry pre-populated with the root and the transform-type roots
    /// that DNA records descend from
    pub fn new(config: ProtocolConfig) -> Self {
        let mut known = BTreeMap::new();
        let labels = [
            ROOT_IB,
            TransformType::Fork.as_str(),
            TransformType::Mut8.as_str(),
            TransformType::Rel8.as_str(),
        ];
        for label in labels {
            known.insert(label.to_string(), IbGib::new(label, PRIMITIVE_GIB));
        }
        Self { config, known }
    }

    pub fn root() -> IbGib {
        IbGib::new(ROOT_IB, PRIMITIVE_GIB)
    }

    /// Build a primitive for any well-formed label
    pub fn primitive(&self, ib: &str) -> Result<IbGib> {
        if ib.is_empty() {
            return Err(IbGibError::Precondition("primitive ib required".into()));
        }
        if ib.contains(&self.config.address_delimiter) {
            return Err(IbGibError::Precondition(format!(
                "primitive ib '{}' contains the address delimiter",
                ib
            )));
        }
        Ok(IbGib::new(ib, PRIMITIVE_GIB))
    }

    pub fn primitives(&self, ibs: &[&str]) -> Result<Vec<IbGib>> {
        ibs.iter().map(|ib| self.primitive(ib)).collect()
    }

    /// Add a label to the well-known set
    pub fn register(&mut self, ib: &str) -> Result<&IbGib> {
        let primitive = self.primitive(ib)?;
        Ok(self.known.entry(ib.to_string()).or_insert(primitive))
    }

    pub fn get(&self, ib: &str) -> Option<&IbGib> {
        self.known.get(ib)
    }

    /// Look up a well-known primitive by its address
    pub fn get_by_addr(&self, addr: &str) -> Option<&IbGib> {
        let parsed = Address::parse_with(addr, &self.config.address_delimiter).ok()?;
        if !parsed.is_primitive() {
            return None;
        }
        self.known.get(&parsed.ib)
    }

    pub fn well_known(&self) -> impl Iterator<Item = &IbGib> {
        self.known.values()
    }

    pub fn is_primitive(record: &IbGib) -> bool {
        record.is_primitive()
    }

    pub fn is_root(record: &IbGib) -> bool {
        record.is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_primitives() {
        let registry = PrimitiveRegistry::default();
        let labels: Vec<&str> = registry.well_known().map(|p| p.ib.as_str()).collect();
        assert_eq!(labels, ["fork", "ib", "mut8", "rel8"]);
        assert!(registry.well_known().all(PrimitiveRegistry::is_primitive));
        assert_eq!(registry.get_by_addr("ib^gib"), Some(&PrimitiveRegistry::root()));
        assert!(registry.get_by_addr("ib^ABC").is_none());
    }

    #[test]
    fn test_primitive_construction() {
        let registry = PrimitiveRegistry::default();
        let tag = registry.primitive("tag").unwrap();
        assert_eq!(tag.addr(), "tag^gib");
        assert!(!PrimitiveRegistry::is_root(&tag));
        assert!(registry.primitive("").is_err());
        assert!(registry.primitive("a^b").is_err());

        let many = registry.primitives(&["a", "b"]).unwrap();
        assert_eq!(many.len(), 2);
        assert!(registry.primitives(&["a", ""]).is_err());
    }

    #[test]
    fn test_register() {
        let mut registry = PrimitiveRegistry::default();
        assert!(registry.get("comment").is_none());
        registry.register("comment").unwrap();
        assert_eq!(registry.get("comment").map(|p| p.gib.as_str()), Some("gib"));
    }
}
