//! Record model: the ibgib record and its structured payloads
//!
//! A record = label (`ib`) + content hash (`gib`) + optional data document
//! + optional named relations to other records' addresses.

mod document;
mod ibgib;

pub use document::{has_content, normalize, patch, remove_keys, rename_keys};
pub use ibgib::*;
