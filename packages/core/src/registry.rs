//! Type Registry
//!
//! Resolves generic type identifier strings to native record kinds, gated
//! by the platform API level and by optional-feature availability. The
//! table is built once per process from a [`PlatformContext`] and never
//! mutated afterwards; decoders share it by reference.
//!
//! # Examples
//!
//! ```rust
//! use healthbridge_core::registry::{
//!     AllAvailable, PlatformContext, TypeRegistry,
//! };
//! use healthbridge_core::models::RecordKind;
//! use std::sync::Arc;
//!
//! let registry = TypeRegistry::new(PlatformContext::new(34, Arc::new(AllAvailable)));
//! let resolved = registry.resolve("weight").unwrap();
//! assert_eq!(resolved.kind, RecordKind::Weight);
//! assert!(registry.resolve("chakraAlignment").is_err());
//! ```

use crate::models::RecordKind;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Declared payload shape for a registered type
///
/// The unwrapper checks the wire payload against this declaration before
/// any per-kind mapping runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Quantity,
    Category,
    /// Compound payload with the given required sub-fields
    Multiple(&'static [FieldSpec]),
    Samples,
    Label,
    None,
}

impl Shape {
    /// Diagnostic name matching the wire tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::Category => "category",
            Self::Multiple(_) => "multiple",
            Self::Samples => "samples",
            Self::Label => "label",
            Self::None => "none",
        }
    }
}

/// A required sub-field of a [`Shape::Multiple`] payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: Shape,
}

/// Whether a kind is anchored to a point in time or a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Instant,
    Interval,
}

/// Optional store features a type may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureId {
    SkinTemperature,
    MindfulnessSession,
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SkinTemperature => "skinTemperature",
            Self::MindfulnessSession => "mindfulnessSession",
        };
        write!(f, "{}", name)
    }
}

/// Availability of an optional store feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureStatus {
    Available,
    Unavailable,
    /// The store could not answer; treated as unavailable
    Unknown,
}

/// Error raised by a capability query itself
#[derive(Error, Debug, Clone)]
#[error("capability query failed: {0}")]
pub struct CapabilityError(pub String);

/// The native store's capability query surface (external collaborator)
///
/// A query error and a `FeatureStatus::Unknown` answer are both treated as
/// the feature being unavailable; resolution never propagates the error.
pub trait CapabilityProvider: Send + Sync {
    fn feature_status(&self, feature: FeatureId) -> Result<FeatureStatus, CapabilityError>;
}

/// Capability provider that reports every feature available
///
/// Useful for tests and for dev tooling that decodes without a live store.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllAvailable;

impl CapabilityProvider for AllAvailable {
    fn feature_status(&self, _feature: FeatureId) -> Result<FeatureStatus, CapabilityError> {
        Ok(FeatureStatus::Available)
    }
}

/// Platform facts the registry is built from
#[derive(Clone)]
pub struct PlatformContext {
    pub api_level: u32,
    capabilities: Arc<dyn CapabilityProvider>,
}

impl PlatformContext {
    pub fn new(api_level: u32, capabilities: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            api_level,
            capabilities,
        }
    }

    /// Feature availability with query failures folded into `false`
    fn feature_available(&self, feature: FeatureId) -> bool {
        matches!(
            self.capabilities.feature_status(feature),
            Ok(FeatureStatus::Available)
        )
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("api_level", &self.api_level)
            .finish_non_exhaustive()
    }
}

/// A successfully resolved type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub kind: RecordKind,
    pub shape: Shape,
    pub timing: Timing,
}

/// Resolution failure, with a human-readable reason
///
/// The reason string is for diagnostics only; control flow branches on the
/// error's presence, never its text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unsupported record type '{type_id}': {reason}")]
pub struct UnsupportedType {
    pub type_id: String,
    pub reason: String,
}

impl UnsupportedType {
    fn new(type_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            reason: reason.into(),
        }
    }
}

struct Entry {
    kind: RecordKind,
    shape: Shape,
    timing: Timing,
    min_api: u32,
    feature: Option<FeatureId>,
}

const BLOOD_PRESSURE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "systolic",
        shape: Shape::Quantity,
    },
    FieldSpec {
        name: "diastolic",
        shape: Shape::Quantity,
    },
];

const BLOOD_GLUCOSE_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "level",
    shape: Shape::Quantity,
}];

const BODY_TEMPERATURE_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "temperature",
    shape: Shape::Quantity,
}];

const SKIN_TEMPERATURE_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "deltas",
    shape: Shape::Samples,
}];

const VO2_MAX_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "vo2",
    shape: Shape::Quantity,
}];

const CERVICAL_MUCUS_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "appearance",
    shape: Shape::Category,
}];

/// Baseline API level at which the structured-record store exists at all
const BASE_API: u32 = 26;

/// API level introducing the feature-gated record kinds
const FEATURE_API: u32 = 35;

/// Process-wide, read-only table of supported types
pub struct TypeRegistry {
    entries: HashMap<&'static str, Entry>,
    platform: PlatformContext,
}

impl TypeRegistry {
    /// Build the registry for the given platform.
    ///
    /// Capability queries are *not* issued here; they run on each resolve
    /// so a store restart cannot leave stale availability behind.
    pub fn new(platform: PlatformContext) -> Self {
        use RecordKind as K;
        use Timing::{Instant, Interval};

        let mut entries = HashMap::new();
        let mut register = |kind: K,
                            shape: Shape,
                            timing: Timing,
                            min_api: u32,
                            feature: Option<FeatureId>| {
            entries.insert(
                kind.type_id(),
                Entry {
                    kind,
                    shape,
                    timing,
                    min_api,
                    feature,
                },
            );
        };

        register(K::Weight, Shape::Quantity, Instant, BASE_API, None);
        register(K::Height, Shape::Quantity, Instant, BASE_API, None);
        register(K::BodyFatPercentage, Shape::Quantity, Instant, BASE_API, None);
        register(K::BodyWaterMass, Shape::Quantity, Instant, BASE_API, None);
        register(K::BoneMass, Shape::Quantity, Instant, BASE_API, None);
        register(K::LeanBodyMass, Shape::Quantity, Instant, BASE_API, None);
        register(K::HeartRate, Shape::Samples, Interval, BASE_API, None);
        register(K::RestingHeartRate, Shape::Quantity, Instant, BASE_API, None);
        register(
            K::HeartRateVariabilityRmssd,
            Shape::Quantity,
            Instant,
            BASE_API,
            None,
        );
        register(K::RespiratoryRate, Shape::Quantity, Instant, BASE_API, None);
        register(K::OxygenSaturation, Shape::Quantity, Instant, BASE_API, None);
        register(
            K::BloodGlucose,
            Shape::Multiple(BLOOD_GLUCOSE_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(
            K::BloodPressure,
            Shape::Multiple(BLOOD_PRESSURE_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(
            K::BodyTemperature,
            Shape::Multiple(BODY_TEMPERATURE_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(
            K::BasalBodyTemperature,
            Shape::Multiple(BODY_TEMPERATURE_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(
            K::SkinTemperature,
            Shape::Multiple(SKIN_TEMPERATURE_FIELDS),
            Interval,
            FEATURE_API,
            Some(FeatureId::SkinTemperature),
        );
        register(K::BasalMetabolicRate, Shape::Quantity, Instant, BASE_API, None);
        register(
            K::Vo2Max,
            Shape::Multiple(VO2_MAX_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(K::Steps, Shape::Quantity, Interval, BASE_API, None);
        register(K::Distance, Shape::Quantity, Interval, BASE_API, None);
        register(K::ActiveCaloriesBurned, Shape::Quantity, Interval, BASE_API, None);
        register(K::TotalCaloriesBurned, Shape::Quantity, Interval, BASE_API, None);
        register(K::FloorsClimbed, Shape::Quantity, Interval, BASE_API, None);
        register(K::ElevationGained, Shape::Quantity, Interval, BASE_API, None);
        register(K::Hydration, Shape::Quantity, Interval, BASE_API, None);
        register(K::WheelchairPushes, Shape::Quantity, Interval, BASE_API, None);
        register(K::Speed, Shape::Samples, Interval, BASE_API, None);
        register(K::Power, Shape::Samples, Interval, BASE_API, None);
        register(K::CyclingPedalingCadence, Shape::Samples, Interval, BASE_API, None);
        register(K::StepsCadence, Shape::Samples, Interval, BASE_API, None);
        register(K::MenstruationFlow, Shape::Category, Instant, BASE_API, None);
        register(K::MenstruationPeriod, Shape::None, Interval, BASE_API, None);
        register(K::IntermenstrualBleeding, Shape::None, Instant, BASE_API, None);
        register(K::OvulationTest, Shape::Category, Instant, BASE_API, None);
        register(
            K::CervicalMucus,
            Shape::Multiple(CERVICAL_MUCUS_FIELDS),
            Instant,
            BASE_API,
            None,
        );
        register(K::SexualActivity, Shape::Category, Instant, BASE_API, None);
        register(
            K::MindfulnessSession,
            Shape::None,
            Interval,
            FEATURE_API,
            Some(FeatureId::MindfulnessSession),
        );
        register(K::SleepSession, Shape::None, Interval, BASE_API, None);
        register(K::Workout, Shape::None, Interval, BASE_API, None);

        Self { entries, platform }
    }

    /// Resolve a generic type id into its native kind, shape and timing.
    ///
    /// Fails when the id is unknown, the platform API level is below the
    /// entry's minimum, or a required feature is unavailable (a failed
    /// capability query counts as unavailable).
    pub fn resolve(&self, type_id: &str) -> Result<ResolvedType, UnsupportedType> {
        let entry = self
            .entries
            .get(type_id)
            .ok_or_else(|| UnsupportedType::new(type_id, "unknown record type"))?;

        if self.platform.api_level < entry.min_api {
            return Err(UnsupportedType::new(
                type_id,
                format!(
                    "requires API level {} (platform is {})",
                    entry.min_api, self.platform.api_level
                ),
            ));
        }

        if let Some(feature) = entry.feature {
            if !self.platform.feature_available(feature) {
                return Err(UnsupportedType::new(
                    type_id,
                    format!("store feature '{}' is unavailable", feature),
                ));
            }
        }

        Ok(ResolvedType {
            kind: entry.kind,
            shape: entry.shape,
            timing: entry.timing,
        })
    }

    /// Human-readable cause for a type being unsupported.
    ///
    /// Diagnostics only - callers must branch on [`resolve`](Self::resolve),
    /// never on this string.
    pub fn unsupported_reason(&self, type_id: &str) -> String {
        match self.resolve(type_id) {
            Ok(_) => format!("record type '{}' is supported", type_id),
            Err(err) => err.reason,
        }
    }

    /// All registered type ids, for diagnostics and tooling
    pub fn type_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Provider with a configurable per-feature answer
    struct Scripted {
        skin_temperature: Result<FeatureStatus, CapabilityError>,
    }

    impl CapabilityProvider for Scripted {
        fn feature_status(
            &self,
            feature: FeatureId,
        ) -> Result<FeatureStatus, CapabilityError> {
            match feature {
                FeatureId::SkinTemperature => self.skin_temperature.clone(),
                FeatureId::MindfulnessSession => Ok(FeatureStatus::Available),
            }
        }
    }

    fn registry_at(api_level: u32) -> TypeRegistry {
        TypeRegistry::new(PlatformContext::new(api_level, Arc::new(AllAvailable)))
    }

    #[test]
    fn test_resolve_known_type() {
        let registry = registry_at(34);
        let resolved = registry.resolve("bloodPressure").unwrap();
        assert_eq!(resolved.kind, RecordKind::BloodPressure);
        assert_eq!(resolved.timing, Timing::Instant);
        assert!(matches!(resolved.shape, Shape::Multiple(_)));
    }

    #[test]
    fn test_resolve_unknown_type() {
        let registry = registry_at(34);
        let err = registry.resolve("auraColor").unwrap_err();
        assert_eq!(err.type_id, "auraColor");
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn test_resolve_respects_api_level() {
        let registry = registry_at(30);
        // skinTemperature needs API 35
        let err = registry.resolve("skinTemperature").unwrap_err();
        assert!(err.reason.contains("API level"));
        // baseline kinds resolve fine at 30
        assert!(registry.resolve("steps").is_ok());
    }

    #[test]
    fn test_resolve_respects_feature_gate() {
        let registry = TypeRegistry::new(PlatformContext::new(
            36,
            Arc::new(Scripted {
                skin_temperature: Ok(FeatureStatus::Unavailable),
            }),
        ));
        let err = registry.resolve("skinTemperature").unwrap_err();
        assert!(err.reason.contains("skinTemperature"));
        // Sibling feature-gated kind is still fine
        assert!(registry.resolve("mindfulnessSession").is_ok());
    }

    #[test]
    fn test_capability_query_failure_counts_as_unavailable() {
        let registry = TypeRegistry::new(PlatformContext::new(
            36,
            Arc::new(Scripted {
                skin_temperature: Err(CapabilityError("store not bound".to_string())),
            }),
        ));
        assert!(registry.resolve("skinTemperature").is_err());
    }

    #[test]
    fn test_unknown_feature_status_counts_as_unavailable() {
        let registry = TypeRegistry::new(PlatformContext::new(
            36,
            Arc::new(Scripted {
                skin_temperature: Ok(FeatureStatus::Unknown),
            }),
        ));
        assert!(registry.resolve("skinTemperature").is_err());
    }

    #[test]
    fn test_unsupported_reason_is_never_empty() {
        let registry = registry_at(20);
        for type_id in ["weight", "skinTemperature", "noSuchThing"] {
            assert!(!registry.unsupported_reason(type_id).is_empty());
        }
    }

    #[test]
    fn test_every_registered_id_resolves_when_gates_pass() {
        let registry = registry_at(36);
        let ids: Vec<_> = registry.type_ids().collect();
        assert!(ids.len() >= 38);
        for id in ids {
            assert!(registry.resolve(id).is_ok(), "{} failed to resolve", id);
        }
    }
}
