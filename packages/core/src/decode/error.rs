//! Decode Error Taxonomy
//!
//! [`DecodeError`] is the internal error type every decoder propagates with
//! `?`. At the batch boundary each error is flattened into a wire-facing
//! [`Failure`] carrying an index path, a message, and a coarse
//! [`FailureKind`] the cross-platform side understands.
//!
//! Propagation policy: a failure in one batch item never aborts sibling
//! items, and a failure in one nested sub-record never aborts its parent
//! session. No decoder unwinds past its own record boundary.

use crate::registry::UnsupportedType;
use crate::units::UnitError;
use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong while decoding a single record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The type registry refused the record's type id
    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedType),

    /// A declared required field is absent
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field is present but carries the wrong payload or value type
    #[error("invalid type for field '{field}': expected {expected}, got {actual}")]
    InvalidFieldType {
        field: String,
        expected: String,
        actual: String,
    },

    /// A quantity carried an unrecognized unit for its dimension
    #[error(transparent)]
    InvalidUnit(#[from] UnitError),

    /// A discriminator category label was unrecognized
    #[error("invalid {family} value: '{label}'")]
    InvalidCategoryValue { family: String, label: String },

    /// The record's end precedes its start
    #[error("record time range is inverted: end {end_millis} precedes start {start_millis}")]
    InvalidTimeOrder { start_millis: i64, end_millis: i64 },

    /// A session sub-item lies outside the session's time range
    #[error("sub-item {index} lies outside the session time range")]
    OutOfBoundsSubItem { index: usize },

    /// Two session sub-items overlap in time
    #[error("sub-items {first} and {second} overlap in time")]
    OverlappingSubItem { first: usize, second: usize },

    /// The recording method requires a device descriptor that is absent
    #[error("recording method '{method}' requires a device descriptor")]
    MissingDeviceForRecordingMethod { method: String },

    /// Catch-all for defensive paths; always logged with full context
    #[error("unexpected decode failure: {context}")]
    Unexpected { context: String },
}

impl DecodeError {
    /// Create a missing required field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create an invalid field type error
    pub fn invalid_field_type(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldType {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid category value error
    pub fn invalid_category(family: impl Into<String>, label: impl Into<String>) -> Self {
        Self::InvalidCategoryValue {
            family: family.into(),
            label: label.into(),
        }
    }

    /// Create an unexpected error
    pub fn unexpected(context: impl Into<String>) -> Self {
        Self::Unexpected {
            context: context.into(),
        }
    }

    /// The wire-facing failure kind this error flattens into
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingRequiredField { .. } | Self::InvalidFieldType { .. } => {
                FailureKind::InvalidFormat
            }
            Self::UnsupportedType(_)
            | Self::InvalidUnit(_)
            | Self::InvalidCategoryValue { .. }
            | Self::InvalidTimeOrder { .. }
            | Self::OutOfBoundsSubItem { .. }
            | Self::OverlappingSubItem { .. }
            | Self::MissingDeviceForRecordingMethod { .. } => FailureKind::Decode,
            Self::Unexpected { .. } => FailureKind::Unexpected,
        }
    }
}

/// Coarse failure classification shared with the cross-platform side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The envelope or a payload had the wrong shape
    InvalidFormat,
    /// The envelope was well-formed but could not be decoded
    Decode,
    /// A defensive path fired; details are in the log
    Unexpected,
    /// A nested sub-record inside a session had the wrong shape or type
    DuringSessionInvalidType,
    /// A nested sub-record inside a session failed to decode
    DuringSessionDecode,
}

/// A structured per-item failure, addressable by index path
///
/// The index path is the positional address of the failed item: `[i]` for
/// batch item `i`, `[i, j]` for sub-item `j` nested inside batch item `i`.
/// Paths produced inside a session decoder are relative to that session's
/// own sub-item list until [`Failure::prefixed`] anchors them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub index_path: Vec<usize>,
    pub message: String,
    pub kind: FailureKind,
}

impl Failure {
    /// Failure for a top-level batch item
    pub fn at(index: usize, error: &DecodeError) -> Self {
        Self {
            index_path: vec![index],
            message: error.to_string(),
            kind: error.failure_kind(),
        }
    }

    /// Failure for a session sub-item, relative to the session's own list
    ///
    /// The kind is forced into the during-session variants so callers can
    /// tell nested failures from their parents': shape errors become
    /// [`FailureKind::DuringSessionInvalidType`], everything else
    /// [`FailureKind::DuringSessionDecode`].
    pub fn during_session(index: usize, error: &DecodeError) -> Self {
        let kind = match error.failure_kind() {
            FailureKind::InvalidFormat => FailureKind::DuringSessionInvalidType,
            _ => FailureKind::DuringSessionDecode,
        };
        Self {
            index_path: vec![index],
            message: error.to_string(),
            kind,
        }
    }

    /// Session sub-item shape failure from a raw message (no `DecodeError`
    /// exists when the entry cannot even be parsed as an envelope)
    pub fn malformed_sub_item(index: usize, message: impl Into<String>) -> Self {
        Self {
            index_path: vec![index],
            message: message.into(),
            kind: FailureKind::DuringSessionInvalidType,
        }
    }

    /// Re-anchor a relative failure under its parent's batch index
    pub fn prefixed(mut self, parent_index: usize) -> Self {
        self.index_path.insert(0, parent_index);
        self
    }
}

/// Per-batch failure accumulator
///
/// Collects failures in submission order and surfaces them as
/// `Option<Vec<Failure>>` - `None` when nothing failed - so callers can
/// cheaply test for full success.
#[derive(Debug, Default)]
pub struct FailureAggregator {
    failures: Vec<Failure>,
}

impl FailureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        self.failures.extend(failures);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Consume the accumulator; `None` when no failure was recorded
    pub fn into_option(self) -> Option<Vec<Failure>> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Dimension, UnitError};

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            DecodeError::missing_field("systolic").failure_kind(),
            FailureKind::InvalidFormat
        );
        assert_eq!(
            DecodeError::from(UnitError::new(Dimension::Mass, "stone")).failure_kind(),
            FailureKind::Decode
        );
        assert_eq!(
            DecodeError::unexpected("boom").failure_kind(),
            FailureKind::Unexpected
        );
    }

    #[test]
    fn test_during_session_kind_is_forced() {
        let shape_error = DecodeError::invalid_field_type("value", "quantity", "label");
        assert_eq!(
            Failure::during_session(3, &shape_error).kind,
            FailureKind::DuringSessionInvalidType
        );

        let unit_error = DecodeError::from(UnitError::new(Dimension::Energy, "furlongs"));
        assert_eq!(
            Failure::during_session(0, &unit_error).kind,
            FailureKind::DuringSessionDecode
        );
    }

    #[test]
    fn test_prefixed_index_path() {
        let failure = Failure::malformed_sub_item(1, "not a record").prefixed(4);
        assert_eq!(failure.index_path, vec![4, 1]);
    }

    #[test]
    fn test_aggregator_empty_is_none() {
        assert!(FailureAggregator::new().into_option().is_none());
    }

    #[test]
    fn test_aggregator_preserves_order() {
        let mut aggregator = FailureAggregator::new();
        aggregator.push(Failure::at(0, &DecodeError::missing_field("a")));
        aggregator.push(Failure::at(2, &DecodeError::missing_field("b")));
        let failures = aggregator.into_option().unwrap();
        assert_eq!(failures[0].index_path, vec![0]);
        assert_eq!(failures[1].index_path, vec![2]);
    }

    #[test]
    fn test_failure_serializes_camel_case() {
        let failure = Failure::at(0, &DecodeError::missing_field("level"));
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("indexPath").is_some());
        assert_eq!(json["kind"], "invalidFormat");
    }
}
