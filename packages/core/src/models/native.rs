//! Native Record Model
//!
//! Strongly-typed records ready for persistence in the native health store.
//! The model is a closed tagged union: every record kind the bridge can
//! produce is a [`RecordKind`] variant, and every typed payload is a
//! [`TypedValue`] variant. Adding a kind is a compile-checked match
//! addition; there is no runtime "recognized but not implemented" fallback
//! and no dynamic value leaks past the decoder boundary.

use crate::categories::{
    BloodPressureBodyPosition, BloodPressureLocation, BodyTemperatureLocation,
    CervicalMucusAppearance, CervicalMucusSensation, MealType, MenstruationFlow,
    OvulationTestResult, Protection, RelationToMeal, SkinTemperatureLocation, SleepStageType,
    SpecimenSource, Vo2MaxMethod,
};
use crate::models::envelope::{DeviceInfo, RecordingMethod};
use crate::units::{
    BloodGlucose, Energy, Length, Mass, Power, Pressure, Temperature, TemperatureDelta, Velocity,
    Volume,
};
use chrono::{DateTime, FixedOffset, Utc};

/// Closed set of record kinds the bridge can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Weight,
    Height,
    BodyFatPercentage,
    BodyWaterMass,
    BoneMass,
    LeanBodyMass,
    HeartRate,
    RestingHeartRate,
    HeartRateVariabilityRmssd,
    RespiratoryRate,
    OxygenSaturation,
    BloodGlucose,
    BloodPressure,
    BodyTemperature,
    BasalBodyTemperature,
    SkinTemperature,
    BasalMetabolicRate,
    Vo2Max,
    Steps,
    Distance,
    ActiveCaloriesBurned,
    TotalCaloriesBurned,
    FloorsClimbed,
    ElevationGained,
    Hydration,
    WheelchairPushes,
    Speed,
    Power,
    CyclingPedalingCadence,
    StepsCadence,
    MenstruationFlow,
    MenstruationPeriod,
    IntermenstrualBleeding,
    OvulationTest,
    CervicalMucus,
    SexualActivity,
    MindfulnessSession,
    SleepSession,
    Workout,
}

impl RecordKind {
    /// Generic type identifier this kind answers to on the wire
    pub fn type_id(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Height => "height",
            Self::BodyFatPercentage => "bodyFatPercentage",
            Self::BodyWaterMass => "bodyWaterMass",
            Self::BoneMass => "boneMass",
            Self::LeanBodyMass => "leanBodyMass",
            Self::HeartRate => "heartRate",
            Self::RestingHeartRate => "restingHeartRate",
            Self::HeartRateVariabilityRmssd => "heartRateVariabilityRmssd",
            Self::RespiratoryRate => "respiratoryRate",
            Self::OxygenSaturation => "oxygenSaturation",
            Self::BloodGlucose => "bloodGlucose",
            Self::BloodPressure => "bloodPressure",
            Self::BodyTemperature => "bodyTemperature",
            Self::BasalBodyTemperature => "basalBodyTemperature",
            Self::SkinTemperature => "skinTemperature",
            Self::BasalMetabolicRate => "basalMetabolicRate",
            Self::Vo2Max => "vo2Max",
            Self::Steps => "steps",
            Self::Distance => "distance",
            Self::ActiveCaloriesBurned => "activeCaloriesBurned",
            Self::TotalCaloriesBurned => "totalCaloriesBurned",
            Self::FloorsClimbed => "floorsClimbed",
            Self::ElevationGained => "elevationGained",
            Self::Hydration => "hydration",
            Self::WheelchairPushes => "wheelchairPushes",
            Self::Speed => "speed",
            Self::Power => "power",
            Self::CyclingPedalingCadence => "cyclingPedalingCadence",
            Self::StepsCadence => "stepsCadence",
            Self::MenstruationFlow => "menstruationFlow",
            Self::MenstruationPeriod => "menstruationPeriod",
            Self::IntermenstrualBleeding => "intermenstrualBleeding",
            Self::OvulationTest => "ovulationTest",
            Self::CervicalMucus => "cervicalMucus",
            Self::SexualActivity => "sexualActivity",
            Self::MindfulnessSession => "mindfulnessSession",
            Self::SleepSession => "sleepSession",
            Self::Workout => "workout",
        }
    }

    /// Whether this kind produces a session record (decoded by a session
    /// decoder rather than the plain data decoder)
    pub fn is_session(&self) -> bool {
        matches!(self, Self::SleepSession | Self::Workout)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_id())
    }
}

/// One point of a decoded time series, anchored to absolute time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSample {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// One point of a skin-temperature delta series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureDeltaSample {
    pub time: DateTime<Utc>,
    pub delta: TemperatureDelta,
}

/// The strongly-typed payload of a decoded record
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Weight { mass: Mass },
    Height { length: Length },
    BodyFatPercentage { percentage: f64 },
    BodyWaterMass { mass: Mass },
    BoneMass { mass: Mass },
    LeanBodyMass { mass: Mass },
    /// Beats-per-minute series
    HeartRate { samples: Vec<SeriesSample> },
    RestingHeartRate { beats_per_minute: i64 },
    HeartRateVariabilityRmssd { millis: f64 },
    RespiratoryRate { breaths_per_minute: f64 },
    OxygenSaturation { percentage: f64 },
    BloodGlucose {
        level: BloodGlucose,
        specimen_source: SpecimenSource,
        meal_type: MealType,
        relation_to_meal: RelationToMeal,
    },
    BloodPressure {
        systolic: Pressure,
        diastolic: Pressure,
        body_position: BloodPressureBodyPosition,
        measurement_location: BloodPressureLocation,
    },
    BodyTemperature {
        temperature: Temperature,
        measurement_location: BodyTemperatureLocation,
    },
    BasalBodyTemperature {
        temperature: Temperature,
        measurement_location: BodyTemperatureLocation,
    },
    SkinTemperature {
        deltas: Vec<TemperatureDeltaSample>,
        baseline: Option<Temperature>,
        measurement_location: SkinTemperatureLocation,
    },
    BasalMetabolicRate { power: Power },
    Vo2Max {
        milliliters_per_minute_kilogram: f64,
        measurement_method: Vo2MaxMethod,
    },
    Steps { count: u64 },
    Distance { length: Length },
    ActiveCaloriesBurned { energy: Energy },
    TotalCaloriesBurned { energy: Energy },
    FloorsClimbed { floors: f64 },
    ElevationGained { length: Length },
    Hydration { volume: Volume },
    WheelchairPushes { count: u64 },
    /// Meters-per-second series
    Speed { samples: Vec<SpeedSample> },
    /// Watt series
    Power { samples: Vec<PowerSample> },
    /// Revolutions-per-minute series
    CyclingPedalingCadence { samples: Vec<SeriesSample> },
    /// Steps-per-minute series
    StepsCadence { samples: Vec<SeriesSample> },
    MenstruationFlow { flow: MenstruationFlow },
    OvulationTest { result: OvulationTestResult },
    CervicalMucus {
        appearance: CervicalMucusAppearance,
        sensation: CervicalMucusSensation,
    },
    SexualActivity { protection_used: Protection },
    /// Flag-only kinds (menstruation period, intermenstrual bleeding,
    /// mindfulness session) carry no value
    Marker,
}

/// One point of a decoded speed series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub time: DateTime<Utc>,
    pub speed: Velocity,
}

/// One point of a decoded power series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub time: DateTime<Utc>,
    pub power: Power,
}

/// Provenance metadata attached to every native record
///
/// Built by the metadata builder from the envelope's [`SourceDescriptor`];
/// the envelope's open metadata map rides along untouched in `extra`.
///
/// [`SourceDescriptor`]: crate::models::SourceDescriptor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub recording_method: RecordingMethod,
    pub device: Option<DeviceInfo>,
    pub client_record_id: Option<String>,
    pub client_record_version: Option<i64>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One stage of a decoded sleep session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepStage {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub stage: SleepStageType,
}

/// Exercise kinds for composite (workout) sessions
///
/// Resolved from the wire label by a direct table ([`ExerciseType::parse_label`]);
/// an unrecognized label is a decode failure, not a fallback, because the
/// exercise kind defines what the session means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseType {
    Badminton,
    Baseball,
    Basketball,
    Biking,
    Boxing,
    Calisthenics,
    Cricket,
    Dancing,
    Elliptical,
    Golf,
    Gymnastics,
    Hiking,
    HighIntensityIntervalTraining,
    MartialArts,
    Pilates,
    RockClimbing,
    Rowing,
    Running,
    Skating,
    Skiing,
    Snowboarding,
    Soccer,
    StairClimbing,
    StrengthTraining,
    Surfing,
    SwimmingOpenWater,
    SwimmingPool,
    TableTennis,
    Tennis,
    Volleyball,
    Walking,
    Wheelchair,
    Yoga,
    OtherWorkout,
}

impl ExerciseType {
    /// Direct wire-label lookup; `None` when the label is unrecognized.
    pub fn parse_label(label: &str) -> Option<Self> {
        let kind = match label {
            "badminton" => Self::Badminton,
            "baseball" => Self::Baseball,
            "basketball" => Self::Basketball,
            "biking" => Self::Biking,
            "boxing" => Self::Boxing,
            "calisthenics" => Self::Calisthenics,
            "cricket" => Self::Cricket,
            "dancing" => Self::Dancing,
            "elliptical" => Self::Elliptical,
            "golf" => Self::Golf,
            "gymnastics" => Self::Gymnastics,
            "hiking" => Self::Hiking,
            "highIntensityIntervalTraining" => Self::HighIntensityIntervalTraining,
            "martialArts" => Self::MartialArts,
            "pilates" => Self::Pilates,
            "rockClimbing" => Self::RockClimbing,
            "rowing" => Self::Rowing,
            "running" => Self::Running,
            "skating" => Self::Skating,
            "skiing" => Self::Skiing,
            "snowboarding" => Self::Snowboarding,
            "soccer" => Self::Soccer,
            "stairClimbing" => Self::StairClimbing,
            "strengthTraining" => Self::StrengthTraining,
            "surfing" => Self::Surfing,
            "swimmingOpenWater" => Self::SwimmingOpenWater,
            "swimmingPool" => Self::SwimmingPool,
            "tableTennis" => Self::TableTennis,
            "tennis" => Self::Tennis,
            "volleyball" => Self::Volleyball,
            "walking" => Self::Walking,
            "wheelchair" => Self::Wheelchair,
            "yoga" => Self::Yoga,
            "otherWorkout" => Self::OtherWorkout,
            _ => return None,
        };
        Some(kind)
    }
}

/// A decoded record ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub enum NativeRecord {
    /// A point-in-time measurement
    Instant {
        kind: RecordKind,
        time: DateTime<Utc>,
        zone_offset: FixedOffset,
        value: TypedValue,
        metadata: Provenance,
    },

    /// A measurement over a time range
    Interval {
        kind: RecordKind,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        start_zone_offset: FixedOffset,
        end_zone_offset: FixedOffset,
        value: TypedValue,
        metadata: Provenance,
    },

    /// A sleep session with ordered, non-overlapping stages
    SleepSession {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        start_zone_offset: FixedOffset,
        end_zone_offset: FixedOffset,
        title: Option<String>,
        notes: Option<String>,
        stages: Vec<SleepStage>,
        metadata: Provenance,
    },

    /// A workout session with independently decoded nested records
    ExerciseSession {
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        start_zone_offset: FixedOffset,
        end_zone_offset: FixedOffset,
        exercise_type: ExerciseType,
        title: Option<String>,
        notes: Option<String>,
        nested: Vec<NativeRecord>,
        metadata: Provenance,
    },
}

impl NativeRecord {
    /// Record kind, uniform across the four shapes
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Instant { kind, .. } | Self::Interval { kind, .. } => *kind,
            Self::SleepSession { .. } => RecordKind::SleepSession,
            Self::ExerciseSession { .. } => RecordKind::Workout,
        }
    }

    /// Provenance metadata, uniform across the four shapes
    pub fn metadata(&self) -> &Provenance {
        match self {
            Self::Instant { metadata, .. }
            | Self::Interval { metadata, .. }
            | Self::SleepSession { metadata, .. }
            | Self::ExerciseSession { metadata, .. } => metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_id_round_trip_is_stable() {
        assert_eq!(RecordKind::BloodPressure.type_id(), "bloodPressure");
        assert_eq!(RecordKind::SleepSession.type_id(), "sleepSession");
    }

    #[test]
    fn test_session_kinds() {
        assert!(RecordKind::SleepSession.is_session());
        assert!(RecordKind::Workout.is_session());
        assert!(!RecordKind::Steps.is_session());
        assert!(!RecordKind::MindfulnessSession.is_session());
    }

    #[test]
    fn test_exercise_type_lookup() {
        assert_eq!(ExerciseType::parse_label("running"), Some(ExerciseType::Running));
        assert_eq!(
            ExerciseType::parse_label("swimmingPool"),
            Some(ExerciseType::SwimmingPool)
        );
        assert_eq!(ExerciseType::parse_label("parkour"), None);
    }

    #[test]
    fn test_record_kind_accessor() {
        let record = NativeRecord::Instant {
            kind: RecordKind::Weight,
            time: Utc::now(),
            zone_offset: FixedOffset::east_opt(0).unwrap(),
            value: TypedValue::Weight {
                mass: crate::units::Mass::from_grams(72_500.0),
            },
            metadata: Provenance::default(),
        };
        assert_eq!(record.kind(), RecordKind::Weight);
        assert_eq!(record.metadata().client_record_id, None);
    }
}
