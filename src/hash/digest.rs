//! Digest strategy
//!
//! The hash algorithm is a plug-in. Everything above this trait only sees
//! bytes in and uppercase hex out.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Debug;

/// A deterministic, collision-resistant digest over raw bytes
pub trait GibDigest: Debug + Send + Sync {
    /// Algorithm name, for logs and diagnostics
    fn name(&self) -> &str;

    fn digest(&self, bytes: &[u8]) -> Vec<u8>;

    /// Uppercase hex of the digest. Empty input maps to the empty string,
    /// so an absent component contributes nothing to a concatenation.
    fn hex_upper(&self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        hex::encode_upper(self.digest(bytes))
    }
}

/// SHA-256, the default digest
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl GibDigest for Sha256Digest {
    fn name(&self) -> &str {
        "sha256"
    }

    fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.finalize().to_vec()
    }
}

/// Version tag for the hashing/normalization scheme.
///
/// Only the normalized scheme is implemented. Records hashed under the
/// earlier non-normalized scheme do not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum HashScheme {
    /// Sorted keys, null-valued keys dropped, compact JSON, hex digest per part
    #[default]
    Sha256V1,
}

impl HashScheme {
    pub fn name(&self) -> &str {
        match self {
            HashScheme::Sha256V1 => "sha256v1",
        }
    }
}
