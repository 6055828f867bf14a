//! Composite Session Decoder
//!
//! Decodes workout sessions: the top-level fields (time range, exercise
//! kind, title, provenance) decode unconditionally, then each nested
//! sub-record payload is handed to the plain data decoder on its own. A
//! malformed or undecodable sub-record becomes a failure at its index and
//! is excluded from the output; it never aborts the parent session.

use crate::decode::error::{DecodeError, Failure};
use crate::decode::provenance::provenance_for;
use crate::decode::record::{RecordDecoder, TimeRange};
use crate::decode::DecodedRecord;
use crate::models::envelope::RecordEnvelope;
use crate::models::native::{ExerciseType, NativeRecord};
use crate::registry::Timing;

/// Decode a workout envelope.
///
/// Nested failures in the returned [`DecodedRecord`] carry index paths
/// relative to the envelope's `subRecords` list.
pub fn decode_workout(
    decoder: &RecordDecoder<'_>,
    envelope: &RecordEnvelope,
) -> Result<DecodedRecord, DecodeError> {
    let range = TimeRange::from_envelope(envelope, Timing::Interval)?;
    let metadata = provenance_for(envelope)?;

    // The exercise kind defines what the session means; no fallback
    let label = envelope
        .activity_type
        .as_deref()
        .ok_or_else(|| DecodeError::missing_field("activityType"))?;
    let exercise_type = ExerciseType::parse_label(label)
        .ok_or_else(|| DecodeError::invalid_category("activityType", label))?;

    let mut nested = Vec::new();
    let mut nested_failures = Vec::new();
    for (index, raw) in envelope.sub_records.iter().flatten().enumerate() {
        match decode_sub_record(decoder, raw) {
            Ok(record) => nested.push(record),
            Err(SubRecordFailure::Malformed(message)) => {
                nested_failures.push(Failure::malformed_sub_item(index, message));
            }
            Err(SubRecordFailure::Decode(error)) => {
                nested_failures.push(Failure::during_session(index, &error));
            }
        }
    }

    let record = NativeRecord::ExerciseSession {
        start_time: range.start_time,
        end_time: range.end_time,
        start_zone_offset: range.start_zone_offset,
        end_zone_offset: range.end_zone_offset,
        exercise_type,
        title: envelope.title.clone(),
        notes: envelope.notes.clone(),
        nested,
        metadata,
    };

    Ok(DecodedRecord {
        record,
        nested_failures,
    })
}

enum SubRecordFailure {
    /// The entry is not even a record envelope
    Malformed(String),
    /// The entry parsed but failed to decode
    Decode(DecodeError),
}

fn decode_sub_record(
    decoder: &RecordDecoder<'_>,
    raw: &serde_json::Value,
) -> Result<NativeRecord, SubRecordFailure> {
    let envelope: RecordEnvelope = serde_json::from_value(raw.clone()).map_err(|err| {
        SubRecordFailure::Malformed(format!("sub-record is not a valid record envelope: {}", err))
    })?;

    // Sessions cannot nest; the shape is wrong, not merely undecodable
    match decoder.registry().resolve(&envelope.record_type) {
        Ok(resolved) if resolved.kind.is_session() => {
            return Err(SubRecordFailure::Malformed(format!(
                "session record '{}' cannot nest inside a workout",
                resolved.kind
            )));
        }
        _ => {}
    }

    decoder
        .decode_data(&envelope)
        .map_err(SubRecordFailure::Decode)
}
