//! Provenance Building
//!
//! Turns the envelope's optional [`SourceDescriptor`] and open metadata map
//! into the [`Provenance`] every native record carries. Device-backed
//! recording methods require a device descriptor; everything else defaults
//! gracefully.

use crate::decode::error::DecodeError;
use crate::models::envelope::{RecordEnvelope, RecordingMethod, SourceDescriptor};
use crate::models::native::Provenance;

/// Build provenance metadata from a caller-supplied source descriptor.
///
/// `activelyRecorded` and `autoRecorded` describe measurements taken by a
/// device, so the descriptor must name one - absence is
/// [`DecodeError::MissingDeviceForRecordingMethod`]. `manual`, `unknown`
/// and an absent source produce provenance without a device, carrying
/// whatever sync id/version was supplied.
pub fn build_provenance(source: Option<&SourceDescriptor>) -> Result<Provenance, DecodeError> {
    let Some(source) = source else {
        return Ok(Provenance::default());
    };

    match source.recording_method {
        RecordingMethod::ActivelyRecorded | RecordingMethod::AutoRecorded => {
            if source.device.is_none() {
                return Err(DecodeError::MissingDeviceForRecordingMethod {
                    method: source.recording_method.to_string(),
                });
            }
        }
        RecordingMethod::Manual | RecordingMethod::Unknown => {}
    }

    Ok(Provenance {
        recording_method: source.recording_method,
        device: source.device.clone(),
        client_record_id: source.client_record_id.clone(),
        client_record_version: source.client_record_version,
        extra: serde_json::Map::new(),
    })
}

/// Build provenance for an envelope, folding in its open metadata map.
pub fn provenance_for(envelope: &RecordEnvelope) -> Result<Provenance, DecodeError> {
    let mut provenance = build_provenance(envelope.source.as_ref())?;
    if let Some(metadata) = &envelope.metadata {
        provenance.extra = metadata.clone();
    }
    Ok(provenance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::envelope::DeviceInfo;

    #[test]
    fn test_absent_source_defaults() {
        let provenance = build_provenance(None).unwrap();
        assert_eq!(provenance.recording_method, RecordingMethod::Unknown);
        assert!(provenance.device.is_none());
        assert!(provenance.client_record_id.is_none());
    }

    #[test]
    fn test_manual_without_device_is_fine() {
        let source = SourceDescriptor {
            recording_method: RecordingMethod::Manual,
            client_record_id: Some("sync-1".to_string()),
            client_record_version: Some(3),
            ..Default::default()
        };
        let provenance = build_provenance(Some(&source)).unwrap();
        assert_eq!(provenance.client_record_id.as_deref(), Some("sync-1"));
        assert_eq!(provenance.client_record_version, Some(3));
    }

    #[test]
    fn test_actively_recorded_requires_device() {
        let source = SourceDescriptor {
            recording_method: RecordingMethod::ActivelyRecorded,
            ..Default::default()
        };
        let err = build_provenance(Some(&source)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingDeviceForRecordingMethod { ref method } if method == "activelyRecorded"
        ));
    }

    #[test]
    fn test_auto_recorded_with_device() {
        let source = SourceDescriptor {
            recording_method: RecordingMethod::AutoRecorded,
            device: Some(DeviceInfo {
                manufacturer: Some("Acme".to_string()),
                model: Some("Band 4".to_string()),
                device_type: Some("fitnessBand".to_string()),
            }),
            ..Default::default()
        };
        let provenance = build_provenance(Some(&source)).unwrap();
        assert_eq!(
            provenance.device.unwrap().manufacturer.as_deref(),
            Some("Acme")
        );
    }
}
