//! Batch Decode Entrypoint
//!
//! Decodes a batch of envelopes with per-item isolation: every item
//! produces either a decoded record or a structured failure, output order
//! matches input order exactly, and failure index paths let callers
//! correlate each failure back to its submission - including within nested
//! sub-record lists.
//!
//! [`decode_batch_parallel`] fans the same work out across blocking tasks;
//! decoding mutates no shared state, so no lock discipline is needed and
//! the results are identical to the sequential form.

use crate::decode::error::{Failure, FailureAggregator, FailureKind};
use crate::decode::record::RecordDecoder;
use crate::decode::{sleep, workout, DecodedRecord, SessionFailure};
use crate::models::envelope::RecordEnvelope;
use crate::models::native::{NativeRecord, RecordKind};
use crate::registry::TypeRegistry;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// A batch item failure: the primary cause plus any nested failures
/// collected before the item failed
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub primary: Failure,
    pub nested_failures: Vec<Failure>,
}

/// Result of decoding a batch, order-preserving
#[derive(Debug)]
pub struct BatchDecodeResult {
    pub items: Vec<Result<DecodedRecord, ItemFailure>>,
}

impl BatchDecodeResult {
    /// Successfully decoded records, in submission order
    pub fn records(&self) -> impl Iterator<Item = &NativeRecord> {
        self.items
            .iter()
            .filter_map(|item| item.as_ref().ok())
            .map(|decoded| &decoded.record)
    }

    /// All failures, flattened and anchored under their batch indices;
    /// `None` when every item (and every nested sub-item) decoded
    pub fn failures(&self) -> Option<Vec<Failure>> {
        let mut aggregator = FailureAggregator::new();
        for (index, item) in self.items.iter().enumerate() {
            match item {
                Ok(decoded) => aggregator.extend(
                    decoded
                        .nested_failures
                        .iter()
                        .cloned()
                        .map(|failure| failure.prefixed(index)),
                ),
                Err(failed) => {
                    aggregator.push(failed.primary.clone());
                    aggregator.extend(
                        failed
                            .nested_failures
                            .iter()
                            .cloned()
                            .map(|failure| failure.prefixed(index)),
                    );
                }
            }
        }
        aggregator.into_option()
    }
}

/// Decode a single envelope, dispatching on its resolved kind.
pub fn decode_record(
    registry: &TypeRegistry,
    envelope: &RecordEnvelope,
) -> Result<DecodedRecord, SessionFailure> {
    let decoder = RecordDecoder::new(registry);
    decode_dispatch(&decoder, envelope)
}

fn decode_dispatch(
    decoder: &RecordDecoder<'_>,
    envelope: &RecordEnvelope,
) -> Result<DecodedRecord, SessionFailure> {
    let resolved = decoder
        .registry()
        .resolve(&envelope.record_type)
        .map_err(crate::decode::error::DecodeError::from)?;
    match resolved.kind {
        RecordKind::SleepSession => sleep::decode_sleep_session(envelope),
        RecordKind::Workout => Ok(workout::decode_workout(decoder, envelope)?),
        _ => Ok(DecodedRecord::plain(
            decoder.decode_resolved(envelope, resolved)?,
        )),
    }
}

/// Decode a batch sequentially, preserving submission order.
pub fn decode_batch(registry: &TypeRegistry, envelopes: &[RecordEnvelope]) -> BatchDecodeResult {
    let decoder = RecordDecoder::new(registry);
    let items = envelopes
        .iter()
        .enumerate()
        .map(|(index, envelope)| decode_item(&decoder, index, envelope))
        .collect();
    BatchDecodeResult { items }
}

/// Decode a batch with one blocking task per envelope.
///
/// Results are awaited in submission order, so output ordering and index
/// paths are identical to [`decode_batch`].
pub async fn decode_batch_parallel(
    registry: Arc<TypeRegistry>,
    envelopes: Vec<RecordEnvelope>,
) -> BatchDecodeResult {
    let handles: Vec<_> = envelopes
        .into_iter()
        .enumerate()
        .map(|(index, envelope)| {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                let decoder = RecordDecoder::new(&registry);
                decode_item(&decoder, index, &envelope)
            })
        })
        .collect();

    let mut items = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(item) => items.push(item),
            Err(join_error) => {
                warn!(index, %join_error, "decode task died; recording as unexpected failure");
                items.push(Err(ItemFailure {
                    primary: Failure {
                        index_path: vec![index],
                        message: format!("decode task failed: {}", join_error),
                        kind: FailureKind::Unexpected,
                    },
                    nested_failures: Vec::new(),
                }));
            }
        }
    }
    BatchDecodeResult { items }
}

fn decode_item(
    decoder: &RecordDecoder<'_>,
    index: usize,
    envelope: &RecordEnvelope,
) -> Result<DecodedRecord, ItemFailure> {
    // No decoder may unwind past its own record boundary; a panic in one
    // item degrades to an unexpected failure for that item alone
    let outcome = catch_unwind(AssertUnwindSafe(|| decode_dispatch(decoder, envelope)));

    match outcome {
        Ok(Ok(decoded)) => {
            debug!(index, record_type = %envelope.record_type, "record decoded");
            Ok(decoded)
        }
        Ok(Err(session_failure)) => {
            let primary = Failure::at(index, &session_failure.error);
            if primary.kind == FailureKind::Unexpected {
                warn!(
                    index,
                    record_type = %envelope.record_type,
                    error = %session_failure.error,
                    "unexpected decode failure"
                );
            }
            Err(ItemFailure {
                primary,
                nested_failures: session_failure.nested_failures,
            })
        }
        Err(_) => {
            warn!(
                index,
                record_type = %envelope.record_type,
                "decoder panicked; recording as unexpected failure"
            );
            Err(ItemFailure {
                primary: Failure {
                    index_path: vec![index],
                    message: format!(
                        "decoder panicked on record type '{}'",
                        envelope.record_type
                    ),
                    kind: FailureKind::Unexpected,
                },
                nested_failures: Vec::new(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AllAvailable, PlatformContext};
    use serde_json::json;

    const START: i64 = 1_700_000_000_000;
    const END: i64 = START + 3_600_000;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(PlatformContext::new(36, Arc::new(AllAvailable)))
    }

    fn envelope(value: serde_json::Value) -> RecordEnvelope {
        serde_json::from_value(value).unwrap()
    }

    fn weight_envelope(unit: &str) -> RecordEnvelope {
        envelope(json!({
            "type": "weight",
            "startTime": START,
            "endTime": START,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "quantity", "value": 72.0, "unit": unit }
        }))
    }

    fn workout_envelope() -> RecordEnvelope {
        envelope(json!({
            "type": "workout",
            "startTime": START,
            "endTime": END,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" },
            "activityType": "running",
            "subRecords": [
                {
                    "type": "distance",
                    "startTime": START,
                    "endTime": END,
                    "startZoneOffsetSeconds": 0,
                    "endZoneOffsetSeconds": 0,
                    "value": { "kind": "quantity", "value": 5.0, "unit": "km" }
                },
                "malformed"
            ]
        }))
    }

    #[test]
    fn test_batch_order_and_isolation() {
        let registry = registry();
        let batch = vec![
            weight_envelope("kg"),
            weight_envelope("stone"),
            workout_envelope(),
        ];
        let result = decode_batch(&registry, &batch);

        assert_eq!(result.items.len(), 3);
        assert!(result.items[0].is_ok());

        let failed = result.items[1].as_ref().unwrap_err();
        assert_eq!(failed.primary.index_path, vec![1]);
        assert_eq!(failed.primary.kind, FailureKind::Decode);
        assert!(failed.primary.message.contains("stone"));

        let workout = result.items[2].as_ref().unwrap();
        assert_eq!(workout.nested_failures.len(), 1);
        assert_eq!(workout.nested_failures[0].index_path, vec![1]);
    }

    #[test]
    fn test_flattened_failures_prefix_nested_paths() {
        let registry = registry();
        let batch = vec![
            weight_envelope("kg"),
            weight_envelope("stone"),
            workout_envelope(),
        ];
        let failures = decode_batch(&registry, &batch).failures().unwrap();

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index_path, vec![1]);
        assert_eq!(failures[1].index_path, vec![2, 1]);
    }

    #[test]
    fn test_all_success_yields_no_failures() {
        let registry = registry();
        let batch = vec![weight_envelope("kg"), weight_envelope("lb")];
        let result = decode_batch(&registry, &batch);
        assert!(result.failures().is_none());
        assert_eq!(result.records().count(), 2);
    }

    #[test]
    fn test_session_failure_keeps_nested_failures() {
        let registry = registry();
        let batch = vec![envelope(json!({
            "type": "sleepSession",
            "startTime": START,
            "endTime": START + 8 * 3_600_000_i64,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" },
            "stages": [
                "garbage",
                { "startTime": START, "endTime": START + 2 * 3_600_000_i64, "stage": "light" },
                { "startTime": START + 3_600_000_i64, "endTime": START + 3 * 3_600_000_i64, "stage": "deep" }
            ]
        }))];

        let result = decode_batch(&registry, &batch);
        let failed = result.items[0].as_ref().unwrap_err();
        assert!(failed.primary.message.contains("overlap"));
        assert_eq!(failed.nested_failures.len(), 1);

        // Flattened: primary at [0], nested anchored at [0, 0]
        let failures = result.failures().unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index_path, vec![0]);
        assert_eq!(failures[1].index_path, vec![0, 0]);
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let registry = Arc::new(registry());
        let batch = vec![
            weight_envelope("kg"),
            weight_envelope("stone"),
            workout_envelope(),
        ];

        let sequential = decode_batch(&registry, &batch);
        let parallel = decode_batch_parallel(Arc::clone(&registry), batch).await;

        assert_eq!(sequential.items.len(), parallel.items.len());
        for (left, right) in sequential.items.iter().zip(parallel.items.iter()) {
            assert_eq!(left, right);
        }
    }
}
