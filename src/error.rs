//! Error types for the record graph core
//!
//! Transforms fail fast with an `IbGibError`. Validation never fails fast:
//! it collects `ValidationIssue`s so a whole graph can be checked in one pass.

/// Errors raised by hashing, transforms and the factory
#[derive(Debug, thiserror::Error)]
pub enum IbGibError {
    /// Missing required input, malformed label/address, primitive source,
    /// or conflicting options
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Editing a protected relation or renaming onto a reserved field
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A bookkeeping field holds a value the protocol never produces
    #[error("integrity assumption violated: {0}")]
    IntegrityAssumption(String),

    /// Malformed record shape detected while transforming
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IbGibError>;

/// A single diagnostic produced by the validator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("invalid label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("invalid gib '{gib}': {reason}")]
    InvalidGib { gib: String, reason: String },

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid relation '{name}': {reason}")]
    InvalidRelation { name: String, reason: String },

    #[error("gib mismatch for '{ib}': stored {stored}, computed {computed}")]
    GibMismatch {
        ib: String,
        stored: String,
        computed: String,
    },

    #[error("could not recompute gib for '{ib}': {reason}")]
    Unhashable { ib: String, reason: String },
}
