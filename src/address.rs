//! Address codec
//!
//! An address is `<ib><delimiter><gib>`, the global identity of a record.
//! A gib may itself be compound: `<punctiliar gib><compound delimiter><tjp gib>`.

use crate::config::{DEFAULT_ADDRESS_DELIMITER, DEFAULT_COMPOUND_DELIMITER};
use crate::error::{IbGibError, Result};
use crate::model::{IbGib, PRIMITIVE_GIB};
use std::fmt;
use std::str::FromStr;

/// A parsed address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub ib: String,
    pub gib: String,
}

impl Address {
    pub fn new(ib: impl Into<String>, gib: impl Into<String>) -> Self {
        Self {
            ib: ib.into(),
            gib: gib.into(),
        }
    }

    pub fn of(record: &IbGib) -> Self {
        Self::new(record.ib.clone(), record.gib.clone())
    }

    pub fn parse(addr: &str) -> Result<Self> {
        Self::parse_with(addr, DEFAULT_ADDRESS_DELIMITER)
    }

    /// Split at the last delimiter. Both sides must be non-empty.
    pub fn parse_with(addr: &str, delimiter: &str) -> Result<Self> {
        let (ib, gib) = addr.rsplit_once(delimiter).ok_or_else(|| {
            IbGibError::Precondition(format!(
                "address '{}' has no '{}' delimiter",
                addr, delimiter
            ))
        })?;
        if ib.is_empty() {
            return Err(IbGibError::Precondition(format!(
                "address '{}' has an empty ib",
                addr
            )));
        }
        if gib.is_empty() {
            return Err(IbGibError::Precondition(format!(
                "address '{}' has an empty gib",
                addr
            )));
        }
        Ok(Self::new(ib, gib))
    }

    pub fn to_string_with(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.ib, delimiter, self.gib)
    }

    pub fn is_primitive(&self) -> bool {
        self.gib == PRIMITIVE_GIB
    }

    pub fn gib_info(&self) -> GibInfo {
        GibInfo::parse(&self.gib)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.ib, DEFAULT_ADDRESS_DELIMITER, self.gib)
    }
}

impl FromStr for Address {
    type Err = IbGibError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Components of a gib
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GibInfo {
    /// Hash of this frame's own content
    pub punctiliar_gib: String,
    /// Gib of the timeline origin, for compound gibs
    pub tjp_gib: Option<String>,
    pub is_primitive: bool,
}

impl GibInfo {
    pub fn parse(gib: &str) -> Self {
        Self::parse_with(gib, DEFAULT_COMPOUND_DELIMITER)
    }

    /// Split at the first compound delimiter; the remainder is the tjp gib
    pub fn parse_with(gib: &str, compound_delimiter: &str) -> Self {
        if gib == PRIMITIVE_GIB {
            return Self {
                punctiliar_gib: gib.to_string(),
                tjp_gib: None,
                is_primitive: true,
            };
        }
        match gib.split_once(compound_delimiter) {
            Some((punctiliar, tjp)) => Self {
                punctiliar_gib: punctiliar.to_string(),
                tjp_gib: Some(tjp.to_string()),
                is_primitive: false,
            },
            None => Self {
                punctiliar_gib: gib.to_string(),
                tjp_gib: None,
                is_primitive: false,
            },
        }
    }

    pub fn is_compound(&self) -> bool {
        self.tjp_gib.is_some()
    }
}

/// The cheap shape check rel8 applies to incoming addresses: the delimiter
/// is present and the ib before it is non-empty
pub fn is_minimally_well_formed(addr: &str, delimiter: &str) -> bool {
    matches!(addr.split_once(delimiter), Some((ib, _)) if !ib.is_empty())
}
