//! Data Models
//!
//! This module contains the two halves of the bridge's data model:
//!
//! - `envelope` - the generic wire envelope submitted by the cross-platform
//!   layer (camelCase field names, bit-exact)
//! - `native` - the strongly-typed records the decode engine produces for
//!   the native store

pub mod envelope;
pub mod native;

pub use envelope::{
    DeviceInfo, RecordEnvelope, RecordingMethod, SamplePoint, SourceDescriptor, ValuePayload,
};
pub use native::{
    ExerciseType, NativeRecord, PowerSample, Provenance, RecordKind, SeriesSample, SleepStage,
    SpeedSample, TemperatureDeltaSample, TypedValue,
};
