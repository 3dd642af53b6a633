//! Externally visible models and their storage-record mapping.
//!
//! # Responsibility
//! - Define the model-to-record mapping capability repositories consume.
//! - Ship the `Entry` sample model used by the CLI and tests.
//!
//! # Invariants
//! - Mapping is a structural copy; it never touches storage.

pub mod entry;

use crate::schema::Record;

/// Externally visible type exchanged with callers.
///
/// Each model names exactly one storage record and converts both ways.
pub trait Model: Sized {
    type Record: Record;

    fn to_record(&self) -> Self::Record;

    fn from_record(record: Self::Record) -> Self;
}
