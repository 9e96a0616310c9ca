//! Content hashing for records
//!
//! - `GibDigest`: the injected cryptographic digest strategy
//! - `Hasher`: normalization, canonical text and gib derivation

mod digest;
mod gib;

pub use digest::{GibDigest, HashScheme, Sha256Digest};
pub use gib::{Hasher, Payload};
