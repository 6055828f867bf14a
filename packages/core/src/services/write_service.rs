//! Write Orchestration Service
//!
//! Bridges the decode engine to the native store's writer: decode the
//! batch, hand everything that decoded to the [`RecordWriter`], and return
//! one report correlating assigned ids and failures back to the original
//! submission by index. A store-level error never surfaces as a crash - it
//! is folded into per-item failures for the records that were submitted.

use crate::decode::batch::decode_batch;
use crate::decode::error::{Failure, FailureAggregator, FailureKind};
use crate::models::envelope::RecordEnvelope;
use crate::models::native::NativeRecord;
use crate::registry::TypeRegistry;
use crate::services::error::WriteError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// The native store's write surface (external collaborator)
///
/// Implementations persist the given records and return the assigned ids
/// positionally aligned with the input.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn insert_records(&self, records: Vec<NativeRecord>) -> Result<Vec<String>, WriteError>;
}

/// Outcome of a batch write
///
/// `record_ids` are the store-assigned ids of the successfully written
/// records, in decode order. `failures` carries every decode failure plus
/// any store-level failure, each addressed by the original batch index.
#[derive(Debug)]
pub struct WriteReport {
    pub record_ids: Vec<String>,
    pub failures: Option<Vec<Failure>>,
}

/// Decode-then-write orchestration over a [`RecordWriter`]
pub struct WriteService<W> {
    registry: Arc<TypeRegistry>,
    writer: W,
}

impl<W: RecordWriter> WriteService<W> {
    pub fn new(registry: Arc<TypeRegistry>, writer: W) -> Self {
        Self { registry, writer }
    }

    /// Decode the batch and write whatever decoded successfully.
    pub async fn write_batch(&self, envelopes: &[RecordEnvelope]) -> WriteReport {
        let result = decode_batch(&self.registry, envelopes);

        let mut aggregator = FailureAggregator::new();
        if let Some(failures) = result.failures() {
            aggregator.extend(failures);
        }

        // Indices of the batch items actually submitted to the store
        let submitted_indices: Vec<usize> = result
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.is_ok().then_some(index))
            .collect();
        let records: Vec<NativeRecord> = result.records().cloned().collect();

        if records.is_empty() {
            return WriteReport {
                record_ids: Vec::new(),
                failures: aggregator.into_option(),
            };
        }

        let submitted = records.len();
        match self.writer.insert_records(records).await {
            Ok(ids) if ids.len() == submitted => {
                info!(written = ids.len(), "batch write completed");
                WriteReport {
                    record_ids: ids,
                    failures: aggregator.into_option(),
                }
            }
            Ok(ids) => {
                let error = WriteError::IdCountMismatch {
                    submitted,
                    returned: ids.len(),
                };
                warn!(%error, "writer broke positional alignment; discarding ids");
                fail_submitted(&mut aggregator, &submitted_indices, &error);
                WriteReport {
                    record_ids: Vec::new(),
                    failures: aggregator.into_option(),
                }
            }
            Err(error) => {
                warn!(%error, "store write failed for the whole batch");
                fail_submitted(&mut aggregator, &submitted_indices, &error);
                WriteReport {
                    record_ids: Vec::new(),
                    failures: aggregator.into_option(),
                }
            }
        }
    }
}

fn fail_submitted(
    aggregator: &mut FailureAggregator,
    submitted_indices: &[usize],
    error: &WriteError,
) {
    for &index in submitted_indices {
        aggregator.push(Failure {
            index_path: vec![index],
            message: error.to_string(),
            kind: FailureKind::Unexpected,
        });
    }
}

#[async_trait]
impl<W: RecordWriter + ?Sized> RecordWriter for Arc<W> {
    async fn insert_records(&self, records: Vec<NativeRecord>) -> Result<Vec<String>, WriteError> {
        (**self).insert_records(records).await
    }
}

/// In-memory writer for tests and store-less tooling
///
/// Assigns a fresh v4 id per record and keeps everything written for
/// inspection.
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    records: Mutex<Vec<NativeRecord>>,
}

impl InMemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, in write order
    pub fn written(&self) -> Vec<NativeRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RecordWriter for InMemoryWriter {
    async fn insert_records(&self, records: Vec<NativeRecord>) -> Result<Vec<String>, WriteError> {
        let ids = records.iter().map(|_| Uuid::new_v4().to_string()).collect();
        self.records
            .lock()
            .map_err(|_| WriteError::store_unavailable("writer mutex poisoned"))?
            .extend(records);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AllAvailable, PlatformContext};
    use serde_json::json;

    const START: i64 = 1_700_000_000_000;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::new(PlatformContext::new(
            36,
            Arc::new(AllAvailable),
        )))
    }

    fn weight_envelope(unit: &str) -> RecordEnvelope {
        serde_json::from_value(json!({
            "type": "weight",
            "startTime": START,
            "endTime": START,
            "startZoneOffsetSeconds": 0,
            "endZoneOffsetSeconds": 0,
            "value": { "kind": "quantity", "value": 70.0, "unit": unit }
        }))
        .unwrap()
    }

    struct FailingWriter;

    #[async_trait]
    impl RecordWriter for FailingWriter {
        async fn insert_records(
            &self,
            _records: Vec<NativeRecord>,
        ) -> Result<Vec<String>, WriteError> {
            Err(WriteError::store_unavailable("store not bound"))
        }
    }

    struct MiscountingWriter;

    #[async_trait]
    impl RecordWriter for MiscountingWriter {
        async fn insert_records(
            &self,
            _records: Vec<NativeRecord>,
        ) -> Result<Vec<String>, WriteError> {
            Ok(vec!["only-one".to_string()])
        }
    }

    #[tokio::test]
    async fn test_write_batch_happy_path() {
        let service = WriteService::new(registry(), InMemoryWriter::new());
        let report = service
            .write_batch(&[weight_envelope("kg"), weight_envelope("lb")])
            .await;

        assert_eq!(report.record_ids.len(), 2);
        assert!(report.failures.is_none());
        assert_eq!(service.writer.written().len(), 2);
    }

    #[tokio::test]
    async fn test_decode_failures_do_not_block_siblings() {
        let service = WriteService::new(registry(), InMemoryWriter::new());
        let report = service
            .write_batch(&[
                weight_envelope("kg"),
                weight_envelope("stone"),
                weight_envelope("lb"),
            ])
            .await;

        assert_eq!(report.record_ids.len(), 2);
        let failures = report.failures.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index_path, vec![1]);
    }

    #[tokio::test]
    async fn test_store_error_fails_submitted_items_only() {
        let service = WriteService::new(registry(), FailingWriter);
        let report = service
            .write_batch(&[weight_envelope("kg"), weight_envelope("stone")])
            .await;

        assert!(report.record_ids.is_empty());
        let failures = report.failures.unwrap();
        // One decode failure at [1], one store failure at [0]
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index_path, vec![1]);
        assert_eq!(failures[1].index_path, vec![0]);
        assert_eq!(failures[1].kind, FailureKind::Unexpected);
    }

    #[tokio::test]
    async fn test_misaligned_ids_are_discarded() {
        let service = WriteService::new(registry(), MiscountingWriter);
        let report = service
            .write_batch(&[weight_envelope("kg"), weight_envelope("lb")])
            .await;

        assert!(report.record_ids.is_empty());
        let failures = report.failures.unwrap();
        assert_eq!(failures.len(), 2);
        assert!(failures[0].message.contains("2 records"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let service = WriteService::new(registry(), InMemoryWriter::new());
        let report = service.write_batch(&[]).await;
        assert!(report.record_ids.is_empty());
        assert!(report.failures.is_none());
    }
}
