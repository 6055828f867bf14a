//! Record Decoding Engine
//!
//! Turns generic wire envelopes into strongly-typed native records:
//!
//! - [`error`] - the decode error taxonomy and wire-facing failures
//! - [`unwrap`] - shape-checked value unwrapping with a typed derived
//!   side-table
//! - [`record`] - the simple/compound data record decoder
//! - [`sleep`] - the ordered-stage session decoder
//! - [`workout`] - the composite session decoder with nested isolation
//! - [`provenance`] - provenance metadata building
//! - [`batch`] - the order-preserving batch entrypoint
//!
//! Decoding is pure and CPU-bound; the only shared state is the read-only
//! type registry, so records of a batch decode safely in parallel.

pub mod batch;
pub mod error;
pub mod provenance;
pub mod record;
pub mod sleep;
pub mod unwrap;
pub mod workout;


use crate::models::native::NativeRecord;

pub use batch::{decode_batch, decode_batch_parallel, decode_record, BatchDecodeResult, ItemFailure};
pub use error::{DecodeError, Failure, FailureKind};

/// A successfully decoded record plus its non-fatal nested failures
///
/// Nested failure index paths are relative to the record's own sub-item
/// list (`stages` or `subRecords`); [`BatchDecodeResult::failures`] anchors
/// them under the batch index.
///
/// [`BatchDecodeResult::failures`]: batch::BatchDecodeResult::failures
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub record: NativeRecord,
    pub nested_failures: Vec<Failure>,
}

impl DecodedRecord {
    /// Wrap a plain record with no nested failures
    pub fn plain(record: NativeRecord) -> Self {
        Self {
            record,
            nested_failures: Vec::new(),
        }
    }
}

/// A record-level failure plus whatever nested failures were collected
/// before the record failed
///
/// Lets callers of a failed session still inspect its partial per-stage
/// failures, per the isolation policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFailure {
    pub error: DecodeError,
    pub nested_failures: Vec<Failure>,
}

impl SessionFailure {
    pub fn new(error: DecodeError, nested_failures: Vec<Failure>) -> Self {
        Self {
            error,
            nested_failures,
        }
    }
}

impl From<DecodeError> for SessionFailure {
    fn from(error: DecodeError) -> Self {
        Self::new(error, Vec::new())
    }
}
