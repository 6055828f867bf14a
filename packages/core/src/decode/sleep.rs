//! Ordered-Stage Session Decoder
//!
//! Decodes sleep sessions: a time range, optional title/notes, and a list
//! of stage entries. Each stage is decoded independently - a bad stage is
//! recorded as a failure and dropped without taking the session down. The
//! surviving stages must then be sequential and non-overlapping and lie
//! within the session range; a violation degrades to a session-level
//! failure return (the per-stage failures stay inspectable), never a
//! panic.

use crate::categories::SleepStageType;
use crate::decode::error::{DecodeError, Failure};
use crate::decode::provenance::provenance_for;
use crate::decode::record::TimeRange;
use crate::decode::unwrap::unwrap_value;
use crate::decode::{DecodedRecord, SessionFailure};
use crate::models::envelope::RecordEnvelope;
use crate::models::native::{NativeRecord, SleepStage};
use crate::registry::{Shape, Timing};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Wire shape of one stage entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageEntry {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    end_time: DateTime<Utc>,
    stage: String,
}

/// Decode a sleep session envelope.
///
/// On success the returned [`DecodedRecord`] carries the session plus any
/// per-stage failures (index paths relative to the envelope's `stages`
/// list). On a session-level failure the per-stage failures collected up
/// to that point ride along in the [`SessionFailure`].
pub fn decode_sleep_session(envelope: &RecordEnvelope) -> Result<DecodedRecord, SessionFailure> {
    let mut stage_failures = Vec::new();

    let range = TimeRange::from_envelope(envelope, Timing::Interval)
        .map_err(|error| SessionFailure::new(error, Vec::new()))?;
    unwrap_value(&envelope.value, Shape::None)
        .map_err(|error| SessionFailure::new(error, Vec::new()))?;
    let metadata =
        provenance_for(envelope).map_err(|error| SessionFailure::new(error, Vec::new()))?;

    // Each stage decodes on its own; failures exclude just that stage
    let mut stages: Vec<(usize, SleepStage)> = Vec::new();
    for (index, raw) in envelope.stages.iter().flatten().enumerate() {
        match decode_stage(raw) {
            Ok(stage) => stages.push((index, stage)),
            Err(failure) => stage_failures.push(failure.with_index(index)),
        }
    }

    if let Err(error) = validate_sequence(&mut stages, &range) {
        return Err(SessionFailure::new(error, stage_failures));
    }

    let record = NativeRecord::SleepSession {
        start_time: range.start_time,
        end_time: range.end_time,
        start_zone_offset: range.start_zone_offset,
        end_zone_offset: range.end_zone_offset,
        title: envelope.title.clone(),
        notes: envelope.notes.clone(),
        stages: stages.into_iter().map(|(_, stage)| stage).collect(),
        metadata,
    };

    Ok(DecodedRecord {
        record,
        nested_failures: stage_failures,
    })
}

/// A stage failure before its index is known
struct StageFailure {
    error: Option<DecodeError>,
    message: String,
}

impl StageFailure {
    fn with_index(self, index: usize) -> Failure {
        match self.error {
            Some(error) => Failure::during_session(index, &error),
            None => Failure::malformed_sub_item(index, self.message),
        }
    }
}

fn decode_stage(raw: &serde_json::Value) -> Result<SleepStage, StageFailure> {
    let entry: StageEntry = serde_json::from_value(raw.clone()).map_err(|err| StageFailure {
        error: None,
        message: format!("stage entry is not a valid stage object: {}", err),
    })?;

    if entry.end_time < entry.start_time {
        let error = DecodeError::InvalidTimeOrder {
            start_millis: entry.start_time.timestamp_millis(),
            end_millis: entry.end_time.timestamp_millis(),
        };
        return Err(StageFailure {
            message: error.to_string(),
            error: Some(error),
        });
    }

    // Stage kind is an annotation, not a discriminator: unrecognized labels
    // fall back to unknown
    let stage = SleepStageType::parse_label(&entry.stage).unwrap_or(SleepStageType::Unknown);

    Ok(SleepStage {
        start_time: entry.start_time,
        end_time: entry.end_time,
        stage,
    })
}

/// Sort the surviving stages by start and check the sequence invariant:
/// pairwise non-overlapping, each stage within the session range.
///
/// Errors reference the stages' original wire indices.
fn validate_sequence(
    stages: &mut [(usize, SleepStage)],
    range: &TimeRange,
) -> Result<(), DecodeError> {
    stages.sort_by_key(|(_, stage)| stage.start_time);

    for (original_index, stage) in stages.iter() {
        if stage.start_time < range.start_time || stage.end_time > range.end_time {
            return Err(DecodeError::OutOfBoundsSubItem {
                index: *original_index,
            });
        }
    }

    for pair in stages.windows(2) {
        let (first_index, first) = &pair[0];
        let (second_index, second) = &pair[1];
        if second.start_time < first.end_time {
            return Err(DecodeError::OverlappingSubItem {
                first: *first_index,
                second: *second_index,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::error::FailureKind;
    use serde_json::json;

    const HOUR_MILLIS: i64 = 3_600_000;
    const START: i64 = 1_700_000_000_000;

    fn sleep_envelope(stages: serde_json::Value) -> RecordEnvelope {
        serde_json::from_value(json!({
            "type": "sleepSession",
            "startTime": START,
            "endTime": START + 8 * HOUR_MILLIS,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" },
            "title": "Night sleep",
            "stages": stages
        }))
        .unwrap()
    }

    fn stage(start_offset_hours: i64, end_offset_hours: i64, stage: &str) -> serde_json::Value {
        json!({
            "startTime": START + start_offset_hours * HOUR_MILLIS,
            "endTime": START + end_offset_hours * HOUR_MILLIS,
            "stage": stage
        })
    }

    #[test]
    fn test_well_formed_session() {
        let outcome = decode_sleep_session(&sleep_envelope(json!([
            stage(0, 2, "light"),
            stage(2, 4, "deep"),
            stage(4, 5, "rem"),
        ])))
        .unwrap();

        assert!(outcome.nested_failures.is_empty());
        match outcome.record {
            NativeRecord::SleepSession { ref stages, ref title, .. } => {
                assert_eq!(stages.len(), 3);
                assert_eq!(stages[1].stage, SleepStageType::Deep);
                assert_eq!(title.as_deref(), Some("Night sleep"));
            }
            other => panic!("expected sleep session, got {:?}", other),
        }
    }

    #[test]
    fn test_stages_are_sorted_by_start() {
        let outcome = decode_sleep_session(&sleep_envelope(json!([
            stage(4, 5, "rem"),
            stage(0, 2, "light"),
        ])))
        .unwrap();
        match outcome.record {
            NativeRecord::SleepSession { ref stages, .. } => {
                assert_eq!(stages[0].stage, SleepStageType::Light);
                assert_eq!(stages[1].stage, SleepStageType::Rem);
            }
            other => panic!("expected sleep session, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_stage_is_excluded_not_fatal() {
        let outcome = decode_sleep_session(&sleep_envelope(json!([
            stage(0, 2, "light"),
            "not a stage object",
            stage(2, 4, "deep"),
        ])))
        .unwrap();

        assert_eq!(outcome.nested_failures.len(), 1);
        assert_eq!(outcome.nested_failures[0].index_path, vec![1]);
        assert_eq!(
            outcome.nested_failures[0].kind,
            FailureKind::DuringSessionInvalidType
        );
        match outcome.record {
            NativeRecord::SleepSession { ref stages, .. } => assert_eq!(stages.len(), 2),
            other => panic!("expected sleep session, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_stage_label_falls_back() {
        let outcome =
            decode_sleep_session(&sleep_envelope(json!([stage(0, 1, "micronap")]))).unwrap();
        match outcome.record {
            NativeRecord::SleepSession { ref stages, .. } => {
                assert_eq!(stages[0].stage, SleepStageType::Unknown);
            }
            other => panic!("expected sleep session, got {:?}", other),
        }
    }

    #[test]
    fn test_overlap_is_a_session_failure_not_a_panic() {
        let failure = decode_sleep_session(&sleep_envelope(json!([
            stage(0, 3, "light"),
            stage(2, 4, "deep"),
        ])))
        .unwrap_err();

        match failure.error {
            DecodeError::OverlappingSubItem { first, second } => {
                assert_eq!((first, second), (0, 1));
            }
            other => panic!("expected overlap failure, got {:?}", other),
        }
    }

    #[test]
    fn test_overlap_references_original_indices_after_sorting() {
        // Entry 0 starts later than entry 1; after sorting the overlapping
        // pair is (1, 0) in original indices
        let failure = decode_sleep_session(&sleep_envelope(json!([
            stage(2, 4, "deep"),
            stage(0, 3, "light"),
        ])))
        .unwrap_err();

        match failure.error {
            DecodeError::OverlappingSubItem { first, second } => {
                assert_eq!((first, second), (1, 0));
            }
            other => panic!("expected overlap failure, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_bounds_stage_is_a_session_failure() {
        let failure = decode_sleep_session(&sleep_envelope(json!([
            stage(0, 2, "light"),
            stage(7, 9, "rem"), // extends one hour past session end
        ])))
        .unwrap_err();

        assert!(matches!(
            failure.error,
            DecodeError::OutOfBoundsSubItem { index: 1 }
        ));
    }

    #[test]
    fn test_session_failure_keeps_partial_stage_failures() {
        let failure = decode_sleep_session(&sleep_envelope(json!([
            "garbage",
            stage(0, 3, "light"),
            stage(2, 4, "deep"),
        ])))
        .unwrap_err();

        assert!(matches!(failure.error, DecodeError::OverlappingSubItem { .. }));
        assert_eq!(failure.nested_failures.len(), 1);
        assert_eq!(failure.nested_failures[0].index_path, vec![0]);
    }

    #[test]
    fn test_inverted_stage_excluded_as_failure() {
        let outcome = decode_sleep_session(&sleep_envelope(json!([
            stage(2, 1, "light"),
            stage(3, 4, "deep"),
        ])))
        .unwrap();

        assert_eq!(outcome.nested_failures.len(), 1);
        assert_eq!(
            outcome.nested_failures[0].kind,
            FailureKind::DuringSessionDecode
        );
    }

    #[test]
    fn test_session_without_stages() {
        let envelope: RecordEnvelope = serde_json::from_value(json!({
            "type": "sleepSession",
            "startTime": START,
            "endTime": START + 8 * HOUR_MILLIS,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" }
        }))
        .unwrap();

        let outcome = decode_sleep_session(&envelope).unwrap();
        match outcome.record {
            NativeRecord::SleepSession { ref stages, .. } => assert!(stages.is_empty()),
            other => panic!("expected sleep session, got {:?}", other),
        }
    }
}
