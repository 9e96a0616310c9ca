//! ibgib-core: a content-addressed, immutable record graph
//!
//! Every record is addressed by a deterministic hash of its own content.
//! New records only come from transforms (fork, mut8, rel8), which can record
//! their own options as replayable DNA, and a validator re-derives hashes to
//! check integrity.

pub mod address;
pub mod config;
pub mod error;
pub mod factory;
pub mod hash;
pub mod model;
pub mod primitive;
pub mod transform;
pub mod validate;

pub use address::{Address, GibInfo};
pub use config::ProtocolConfig;
pub use error::{IbGibError, Result, ValidationIssue};
pub use factory::{Factory, FirstGenOptions};
pub use hash::{GibDigest, HashScheme, Hasher, Sha256Digest};
pub use model::{IbGib, Rel8ns};
pub use primitive::PrimitiveRegistry;
pub use transform::{
    ForkOptions, Mut8Options, Rel8Options, TjpOptions, TransformOptions, TransformResult,
    Transformer,
};
pub use validate::Validator;
