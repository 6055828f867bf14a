//! Integration tests for the batch decode entrypoint
//!
//! Tests cover:
//! - Wire-JSON envelopes through the public decode API
//! - Batch-level isolation and order preservation
//! - Nested sub-record failure index paths
//! - Sequential/parallel equivalence

use healthbridge_core::decode::FailureKind;
use healthbridge_core::models::{NativeRecord, RecordKind};
use healthbridge_core::registry::{AllAvailable, PlatformContext};
use healthbridge_core::{decode_batch, decode_batch_parallel, RecordEnvelope, TypeRegistry};
use serde_json::json;
use std::sync::Arc;

const START: i64 = 1_700_000_000_000;
const HOUR: i64 = 3_600_000;

fn registry() -> TypeRegistry {
    TypeRegistry::new(PlatformContext::new(36, Arc::new(AllAvailable)))
}

fn envelope(value: serde_json::Value) -> RecordEnvelope {
    serde_json::from_value(value).unwrap()
}

/// The three-record scenario from the wire contract: a valid instant
/// quantity, a quantity with an unrecognized unit, and a composite with one
/// valid and one malformed nested item.
fn mixed_batch() -> Vec<RecordEnvelope> {
    vec![
        envelope(json!({
            "type": "weight",
            "startTime": START,
            "endTime": START,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "quantity", "value": 72.5, "unit": "kg" }
        })),
        envelope(json!({
            "type": "weight",
            "startTime": START,
            "endTime": START,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "quantity", "value": 11.0, "unit": "stone" }
        })),
        envelope(json!({
            "type": "workout",
            "startTime": START,
            "endTime": START + HOUR,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" },
            "activityType": "running",
            "subRecords": [
                {
                    "type": "distance",
                    "startTime": START,
                    "endTime": START + HOUR,
                    "startZoneOffsetSeconds": 0,
                    "endZoneOffsetSeconds": 0,
                    "value": { "kind": "quantity", "value": 5.0, "unit": "km" }
                },
                { "thisIs": "notARecord" }
            ]
        })),
    ]
}

// =========================================================================
// Batch isolation and ordering
// =========================================================================

#[test]
fn test_mixed_batch_partial_success() {
    let registry = registry();
    let result = decode_batch(&registry, &mixed_batch());

    assert_eq!(result.items.len(), 3);

    // Item 1: plain success
    let first = result.items[0].as_ref().unwrap();
    assert_eq!(first.record.kind(), RecordKind::Weight);
    assert!(first.nested_failures.is_empty());

    // Item 2: invalid unit, named in the message
    let second = result.items[1].as_ref().unwrap_err();
    assert_eq!(second.primary.index_path, vec![1]);
    assert_eq!(second.primary.kind, FailureKind::Decode);
    assert!(second.primary.message.contains("stone"));

    // Item 3: parent decodes, one nested record survives, one fails at
    // relative index [1]
    let third = result.items[2].as_ref().unwrap();
    match &third.record {
        NativeRecord::ExerciseSession { nested, .. } => assert_eq!(nested.len(), 1),
        other => panic!("expected exercise session, got {:?}", other),
    }
    assert_eq!(third.nested_failures.len(), 1);
    assert_eq!(third.nested_failures[0].index_path, vec![1]);
    assert_eq!(
        third.nested_failures[0].kind,
        FailureKind::DuringSessionInvalidType
    );
}

#[test]
fn test_flattened_failures_are_anchored() {
    let registry = registry();
    let failures = decode_batch(&registry, &mixed_batch()).failures().unwrap();

    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].index_path, vec![1]);
    assert_eq!(failures[1].index_path, vec![2, 1]);
}

#[test]
fn test_output_order_matches_input_order() {
    let registry = registry();
    let batch = mixed_batch();
    let result = decode_batch(&registry, &batch);

    let decoded_kinds: Vec<RecordKind> = result.records().map(|record| record.kind()).collect();
    assert_eq!(decoded_kinds, vec![RecordKind::Weight, RecordKind::Workout]);
}

#[test]
fn test_sleep_overlap_does_not_crash_siblings() {
    let registry = registry();
    let batch = vec![
        envelope(json!({
            "type": "sleepSession",
            "startTime": START,
            "endTime": START + 8 * HOUR,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" },
            "stages": [
                { "startTime": START, "endTime": START + 3 * HOUR, "stage": "light" },
                { "startTime": START + 2 * HOUR, "endTime": START + 4 * HOUR, "stage": "deep" }
            ]
        })),
        envelope(json!({
            "type": "steps",
            "startTime": START,
            "endTime": START + HOUR,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "quantity", "value": 4200.0, "unit": "count" }
        })),
    ];

    let result = decode_batch(&registry, &batch);

    // The overlap is a structural failure referencing both stage indices
    let failed = result.items[0].as_ref().unwrap_err();
    assert_eq!(failed.primary.kind, FailureKind::Decode);
    assert!(failed.primary.message.contains('0'));
    assert!(failed.primary.message.contains('1'));

    // The sibling still decoded
    assert!(result.items[1].is_ok());
}

#[test]
fn test_unsupported_type_has_reason() {
    let registry = registry();
    let result = decode_batch(
        &registry,
        &[envelope(json!({
            "type": "chakraAlignment",
            "startTime": START,
            "endTime": START,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "none" }
        }))],
    );

    let failed = result.items[0].as_ref().unwrap_err();
    assert!(failed.primary.message.contains("chakraAlignment"));
    assert!(!registry.unsupported_reason("chakraAlignment").is_empty());
}

// =========================================================================
// Parallel decode
// =========================================================================

#[tokio::test]
async fn test_parallel_decode_equals_sequential() {
    let registry = Arc::new(registry());
    let batch = mixed_batch();

    let sequential = decode_batch(&registry, &batch);
    let parallel = decode_batch_parallel(Arc::clone(&registry), batch).await;

    assert_eq!(sequential.items, parallel.items);
}

#[tokio::test]
async fn test_parallel_decode_preserves_order_for_large_batches() {
    let registry = Arc::new(registry());
    let batch: Vec<RecordEnvelope> = (0..64)
        .map(|i| {
            envelope(json!({
                "type": "steps",
                "startTime": START + i * HOUR,
                "endTime": START + (i + 1) * HOUR,
                "startZoneOffsetSeconds": 0,
                "endZoneOffsetSeconds": 0,
                "value": { "kind": "quantity", "value": (i * 100) as f64, "unit": "count" }
            }))
        })
        .collect();

    let result = decode_batch_parallel(Arc::clone(&registry), batch).await;
    assert_eq!(result.items.len(), 64);
    for (i, item) in result.items.iter().enumerate() {
        match &item.as_ref().unwrap().record {
            NativeRecord::Interval { start_time, .. } => {
                assert_eq!(start_time.timestamp_millis(), START + i as i64 * HOUR);
            }
            other => panic!("expected interval record, got {:?}", other),
        }
    }
}
