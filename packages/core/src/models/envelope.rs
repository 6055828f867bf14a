//! Generic Record Envelope
//!
//! Wire-transmitted description of a health measurement or session, as
//! produced by the cross-platform layer. Field names are the cross-platform
//! compatibility surface and are bit-exact; renaming any of them breaks the
//! wire contract and must be versioned explicitly.
//!
//! # Examples
//!
//! ```rust
//! use healthbridge_core::models::RecordEnvelope;
//! use serde_json::json;
//!
//! let envelope: RecordEnvelope = serde_json::from_value(json!({
//!     "type": "weight",
//!     "startTime": 1700000000000_i64,
//!     "endTime": 1700000000000_i64,
//!     "startZoneOffsetSeconds": 3600,
//!     "endZoneOffsetSeconds": 3600,
//!     "value": { "kind": "quantity", "value": 72.5, "unit": "kg" }
//! }))
//! .unwrap();
//! assert_eq!(envelope.record_type, "weight");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic record envelope (wire input)
///
/// `start_time`/`end_time` travel as epoch milliseconds; zone offsets as
/// seconds east of UTC. Instantaneous record kinds read `start_time` only.
///
/// Session kinds carry extra optional fields: `title`/`notes` for both
/// session families, `stages` for ordered-stage (sleep) sessions,
/// `activity_type` and `sub_records` for composite (workout) sessions.
/// `stages` and `sub_records` stay loosely typed so one malformed entry can
/// fail on its own without taking the enclosing session down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEnvelope {
    /// Optional caller-side identifier, echoed in diagnostics only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Generic type identifier (e.g. "weight", "bloodPressure", "workout")
    #[serde(rename = "type")]
    pub record_type: String,

    /// Range start, epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,

    /// Range end, epoch milliseconds (equals start for instantaneous kinds)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,

    /// Zone offset at range start, seconds east of UTC
    pub start_zone_offset_seconds: i32,

    /// Zone offset at range end, seconds east of UTC
    pub end_zone_offset_seconds: i32,

    /// The value payload; `{"kind": "none"}` for flag-only records
    pub value: ValuePayload,

    /// Provenance of the measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceDescriptor>,

    /// Open metadata map, passed through to the native record untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,

    /// Session title (session kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Session notes (session kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Exercise kind label (composite sessions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,

    /// Ordered stage entries (sleep sessions only); each entry is parsed
    /// independently so a bad stage fails alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<serde_json::Value>>,

    /// Nested sub-record envelopes (composite sessions only); each entry is
    /// parsed independently so a bad sub-record fails alone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_records: Option<Vec<serde_json::Value>>,
}

/// The generic value payload, tagged on `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValuePayload {
    /// A numeric value with its wire unit
    Quantity { value: f64, unit: String },

    /// A labeled constant from a named category family
    #[serde(rename_all = "camelCase")]
    Category {
        category_family: String,
        label: String,
    },

    /// A compound value; sub-fields are themselves payloads
    Multiple {
        fields: BTreeMap<String, ValuePayload>,
    },

    /// A time series relative to the record's start; never empty
    Samples {
        points: Vec<SamplePoint>,
        unit: String,
    },

    /// A free-form label
    Label { text: String },

    /// No value carried (flag-only records)
    None,
}

impl ValuePayload {
    /// Wire tag of this payload, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Quantity { .. } => "quantity",
            Self::Category { .. } => "category",
            Self::Multiple { .. } => "multiple",
            Self::Samples { .. } => "samples",
            Self::Label { .. } => "label",
            Self::None => "none",
        }
    }
}

/// One point of a time-series payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    /// Offset from the record's start time, milliseconds
    pub offset_millis: i64,

    /// Sample value in the series' wire unit
    pub value: f64,
}

/// How a record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingMethod {
    /// Entered by hand
    Manual,
    /// Recorded by a device during an active measurement
    ActivelyRecorded,
    /// Recorded passively in the background
    AutoRecorded,
    #[default]
    Unknown,
}

impl std::fmt::Display for RecordingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Manual => "manual",
            Self::ActivelyRecorded => "activelyRecorded",
            Self::AutoRecorded => "autoRecorded",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Provenance descriptor supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    #[serde(default)]
    pub recording_method: RecordingMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,

    /// Caller-side sync identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_record_id: Option<String>,

    /// Caller-side sync version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_record_version: Option<i64>,
}

/// Descriptor of the device that produced a measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Free-form device kind label (e.g. "watch", "phone", "scale")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}
