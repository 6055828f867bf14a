//! Simple/Compound Data Record Decoder
//!
//! Decodes one generic envelope into one strongly-typed native record:
//! resolve the type, extract the time range, unwrap the value against the
//! declared shape, build provenance, then map the typed leaf (plus derived
//! sub-fields) into the record kind's constructor fields. Unit conversion
//! runs for every physical quantity; category translation runs for every
//! enumerated sub-field, falling back to `Unknown` except for a record's
//! defining discriminator.
//!
//! The decoder holds no mutable state, so the composite session decoder
//! reuses it for nested sub-records.

use crate::categories::{
    BloodPressureBodyPosition, BloodPressureLocation, BodyTemperatureLocation,
    CervicalMucusAppearance, CervicalMucusSensation, MealType, MenstruationFlow,
    OvulationTestResult, Protection, RelationToMeal, SkinTemperatureLocation, SpecimenSource,
    Vo2MaxMethod,
};
use crate::decode::error::DecodeError;
use crate::decode::provenance::provenance_for;
use crate::decode::unwrap::{unwrap_value, Unwrapped, UnwrappedValue};
use crate::models::envelope::{RecordEnvelope, SamplePoint};
use crate::models::native::{
    NativeRecord, PowerSample, RecordKind, SeriesSample, SpeedSample, TemperatureDeltaSample,
    TypedValue,
};
use crate::registry::{ResolvedType, Timing, TypeRegistry};
use crate::units::{
    BloodGlucose, Energy, Length, Mass, Power, Pressure, Temperature, TemperatureDelta, Velocity,
    Volume,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Validated time range of an envelope
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimeRange {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub start_zone_offset: FixedOffset,
    pub end_zone_offset: FixedOffset,
}

impl TimeRange {
    /// Extract and validate the envelope's time range.
    ///
    /// Interval kinds require `end >= start`; instantaneous kinds read the
    /// start side only, so an inverted range cannot occur for them.
    pub(crate) fn from_envelope(
        envelope: &RecordEnvelope,
        timing: Timing,
    ) -> Result<Self, DecodeError> {
        let start_zone_offset = zone_offset(
            "startZoneOffsetSeconds",
            envelope.start_zone_offset_seconds,
        )?;
        let end_zone_offset =
            zone_offset("endZoneOffsetSeconds", envelope.end_zone_offset_seconds)?;

        if timing == Timing::Interval && envelope.end_time < envelope.start_time {
            return Err(DecodeError::InvalidTimeOrder {
                start_millis: envelope.start_time.timestamp_millis(),
                end_millis: envelope.end_time.timestamp_millis(),
            });
        }

        Ok(Self {
            start_time: envelope.start_time,
            end_time: envelope.end_time,
            start_zone_offset,
            end_zone_offset,
        })
    }
}

fn zone_offset(field: &str, seconds: i32) -> Result<FixedOffset, DecodeError> {
    FixedOffset::east_opt(seconds).ok_or_else(|| {
        DecodeError::invalid_field_type(
            field,
            "zone offset within +/-86400 seconds",
            seconds.to_string(),
        )
    })
}

/// Stateless decoder for simple and compound data records
///
/// Session kinds are rejected here; the batch entrypoint routes them to the
/// session decoders.
pub struct RecordDecoder<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    pub(crate) fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Decode a non-session envelope into a native record.
    pub fn decode_data(&self, envelope: &RecordEnvelope) -> Result<NativeRecord, DecodeError> {
        let resolved = self.registry.resolve(&envelope.record_type)?;
        if resolved.kind.is_session() {
            return Err(DecodeError::invalid_field_type(
                "type",
                "data record type",
                resolved.kind.type_id(),
            ));
        }
        self.decode_resolved(envelope, resolved)
    }

    pub(crate) fn decode_resolved(
        &self,
        envelope: &RecordEnvelope,
        resolved: ResolvedType,
    ) -> Result<NativeRecord, DecodeError> {
        let range = TimeRange::from_envelope(envelope, resolved.timing)?;
        let unwrapped = unwrap_value(&envelope.value, resolved.shape)?;
        let metadata = provenance_for(envelope)?;
        let value = map_typed_value(resolved.kind, &unwrapped, &range)?;

        Ok(match resolved.timing {
            Timing::Instant => NativeRecord::Instant {
                kind: resolved.kind,
                time: range.start_time,
                zone_offset: range.start_zone_offset,
                value,
                metadata,
            },
            Timing::Interval => NativeRecord::Interval {
                kind: resolved.kind,
                start_time: range.start_time,
                end_time: range.end_time,
                start_zone_offset: range.start_zone_offset,
                end_zone_offset: range.end_zone_offset,
                value,
                metadata,
            },
        })
    }
}

/// Map the unwrapped value into the kind's typed payload.
fn map_typed_value(
    kind: RecordKind,
    unwrapped: &Unwrapped,
    range: &TimeRange,
) -> Result<TypedValue, DecodeError> {
    use RecordKind as K;

    Ok(match kind {
        K::Weight => TypedValue::Weight {
            mass: leaf_mass(unwrapped)?,
        },
        K::BodyWaterMass => TypedValue::BodyWaterMass {
            mass: leaf_mass(unwrapped)?,
        },
        K::BoneMass => TypedValue::BoneMass {
            mass: leaf_mass(unwrapped)?,
        },
        K::LeanBodyMass => TypedValue::LeanBodyMass {
            mass: leaf_mass(unwrapped)?,
        },
        K::Height => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::Height {
                length: Length::from_wire(value, unit)?,
            }
        }
        K::Distance => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::Distance {
                length: Length::from_wire(value, unit)?,
            }
        }
        K::ElevationGained => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::ElevationGained {
                length: Length::from_wire(value, unit)?,
            }
        }
        K::BodyFatPercentage => TypedValue::BodyFatPercentage {
            percentage: leaf_percentage(unwrapped)?,
        },
        K::OxygenSaturation => TypedValue::OxygenSaturation {
            percentage: leaf_percentage(unwrapped)?,
        },
        K::ActiveCaloriesBurned => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::ActiveCaloriesBurned {
                energy: Energy::from_wire(value, unit)?,
            }
        }
        K::TotalCaloriesBurned => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::TotalCaloriesBurned {
                energy: Energy::from_wire(value, unit)?,
            }
        }
        K::Hydration => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::Hydration {
                volume: Volume::from_wire(value, unit)?,
            }
        }
        K::BasalMetabolicRate => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            TypedValue::BasalMetabolicRate {
                power: Power::from_wire(value, unit)?,
            }
        }
        K::RestingHeartRate => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            expect_unit(unit, &["bpm", "count/min"])?;
            TypedValue::RestingHeartRate {
                beats_per_minute: non_negative(value)?.round() as i64,
            }
        }
        K::HeartRateVariabilityRmssd => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            expect_unit(unit, &["ms", "millis"])?;
            TypedValue::HeartRateVariabilityRmssd {
                millis: non_negative(value)?,
            }
        }
        K::RespiratoryRate => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            expect_unit(unit, &["count/min", "breaths/min"])?;
            TypedValue::RespiratoryRate {
                breaths_per_minute: non_negative(value)?,
            }
        }
        K::Steps => TypedValue::Steps {
            count: leaf_count(unwrapped)?,
        },
        K::WheelchairPushes => TypedValue::WheelchairPushes {
            count: leaf_count(unwrapped)?,
        },
        K::FloorsClimbed => {
            let (value, unit) = leaf_quantity(unwrapped)?;
            expect_unit(unit, &["count", "floors"])?;
            TypedValue::FloorsClimbed {
                floors: non_negative(value)?,
            }
        }
        K::HeartRate => {
            let (points, unit) = leaf_samples(unwrapped)?;
            expect_unit(unit, &["bpm", "count/min"])?;
            TypedValue::HeartRate {
                samples: plain_series(points, range),
            }
        }
        K::CyclingPedalingCadence => {
            let (points, unit) = leaf_samples(unwrapped)?;
            expect_unit(unit, &["rpm", "count/min"])?;
            TypedValue::CyclingPedalingCadence {
                samples: plain_series(points, range),
            }
        }
        K::StepsCadence => {
            let (points, unit) = leaf_samples(unwrapped)?;
            expect_unit(unit, &["spm", "count/min"])?;
            TypedValue::StepsCadence {
                samples: plain_series(points, range),
            }
        }
        K::Speed => {
            let (points, unit) = leaf_samples(unwrapped)?;
            let samples = points
                .iter()
                .map(|point| {
                    Ok(SpeedSample {
                        time: sample_time(range, point),
                        speed: Velocity::from_wire(point.value, unit)?,
                    })
                })
                .collect::<Result<_, DecodeError>>()?;
            TypedValue::Speed { samples }
        }
        K::Power => {
            let (points, unit) = leaf_samples(unwrapped)?;
            let samples = points
                .iter()
                .map(|point| {
                    Ok(PowerSample {
                        time: sample_time(range, point),
                        power: Power::from_wire(point.value, unit)?,
                    })
                })
                .collect::<Result<_, DecodeError>>()?;
            TypedValue::Power { samples }
        }
        K::BloodGlucose => {
            let (value, unit) = field_quantity(unwrapped, "level")?;
            TypedValue::BloodGlucose {
                level: BloodGlucose::from_wire(value, unit)?,
                specimen_source: derived_category(unwrapped, "specimenSource")
                    .and_then(SpecimenSource::parse_label)
                    .unwrap_or(SpecimenSource::Unknown),
                meal_type: derived_category(unwrapped, "mealType")
                    .and_then(MealType::parse_label)
                    .unwrap_or(MealType::Unknown),
                relation_to_meal: derived_category(unwrapped, "relationToMeal")
                    .and_then(RelationToMeal::parse_label)
                    .unwrap_or(RelationToMeal::Unknown),
            }
        }
        K::BloodPressure => {
            let (systolic, systolic_unit) = field_quantity(unwrapped, "systolic")?;
            let (diastolic, diastolic_unit) = field_quantity(unwrapped, "diastolic")?;
            TypedValue::BloodPressure {
                systolic: Pressure::from_wire(systolic, systolic_unit)?,
                diastolic: Pressure::from_wire(diastolic, diastolic_unit)?,
                body_position: derived_category(unwrapped, "bodyPosition")
                    .and_then(BloodPressureBodyPosition::parse_label)
                    .unwrap_or(BloodPressureBodyPosition::Unknown),
                measurement_location: derived_category(unwrapped, "measurementLocation")
                    .and_then(BloodPressureLocation::parse_label)
                    .unwrap_or(BloodPressureLocation::Unknown),
            }
        }
        K::BodyTemperature => {
            let (value, unit) = field_quantity(unwrapped, "temperature")?;
            TypedValue::BodyTemperature {
                temperature: Temperature::from_wire(value, unit)?,
                measurement_location: body_temperature_location(unwrapped),
            }
        }
        K::BasalBodyTemperature => {
            let (value, unit) = field_quantity(unwrapped, "temperature")?;
            TypedValue::BasalBodyTemperature {
                temperature: Temperature::from_wire(value, unit)?,
                measurement_location: body_temperature_location(unwrapped),
            }
        }
        K::SkinTemperature => {
            let (points, unit) = field_samples(unwrapped, "deltas")?;
            let deltas = points
                .iter()
                .map(|point| {
                    Ok(TemperatureDeltaSample {
                        time: sample_time(range, point),
                        delta: TemperatureDelta::from_wire(point.value, unit)?,
                    })
                })
                .collect::<Result<_, DecodeError>>()?;
            let baseline = match unwrapped.derived_field("baseline") {
                Some(UnwrappedValue::Quantity { value, unit }) => {
                    Some(Temperature::from_wire(*value, unit)?)
                }
                _ => None,
            };
            TypedValue::SkinTemperature {
                deltas,
                baseline,
                measurement_location: derived_category(unwrapped, "measurementLocation")
                    .and_then(SkinTemperatureLocation::parse_label)
                    .unwrap_or(SkinTemperatureLocation::Unknown),
            }
        }
        K::Vo2Max => {
            let (value, unit) = field_quantity(unwrapped, "vo2")?;
            expect_unit(unit, &["mL/kg/min"])?;
            TypedValue::Vo2Max {
                milliliters_per_minute_kilogram: non_negative(value)?,
                measurement_method: derived_category(unwrapped, "measurementMethod")
                    .and_then(Vo2MaxMethod::parse_label)
                    .unwrap_or(Vo2MaxMethod::Other),
            }
        }
        K::MenstruationFlow => TypedValue::MenstruationFlow {
            flow: discriminator(unwrapped.leaf_category()?, "menstruationFlow", |label| {
                MenstruationFlow::parse_label(label)
            })?,
        },
        K::OvulationTest => TypedValue::OvulationTest {
            result: discriminator(unwrapped.leaf_category()?, "ovulationTestResult", |label| {
                OvulationTestResult::parse_label(label)
            })?,
        },
        K::SexualActivity => {
            // Protection is annotation, not discriminator: fall back to unknown
            let (_, label) = unwrapped.leaf_category()?;
            TypedValue::SexualActivity {
                protection_used: Protection::parse_label(label).unwrap_or(Protection::Unknown),
            }
        }
        K::CervicalMucus => {
            let appearance_field = unwrapped.required_field("appearance")?;
            let appearance = appearance_field
                .as_category()
                .ok_or_else(|| {
                    DecodeError::invalid_field_type(
                        "appearance",
                        "category",
                        appearance_field.kind_name(),
                    )
                })?;
            TypedValue::CervicalMucus {
                appearance: discriminator(appearance, "cervicalMucusAppearance", |label| {
                    CervicalMucusAppearance::parse_label(label)
                })?,
                sensation: derived_category(unwrapped, "sensation")
                    .and_then(CervicalMucusSensation::parse_label)
                    .unwrap_or(CervicalMucusSensation::Unknown),
            }
        }
        K::MenstruationPeriod | K::IntermenstrualBleeding | K::MindfulnessSession => {
            TypedValue::Marker
        }
        K::SleepSession | K::Workout => {
            // Routed to the session decoders before this point
            return Err(DecodeError::unexpected(format!(
                "session kind '{}' reached the data decoder",
                kind
            )));
        }
    })
}

impl Unwrapped {
    /// Category leaf as a `(family, label)` pair
    fn leaf_category(&self) -> Result<(&str, &str), DecodeError> {
        self.leaf.as_category().ok_or_else(|| {
            DecodeError::invalid_field_type("value", "category", self.leaf.kind_name())
        })
    }

    /// Required sub-field of a compound leaf
    fn required_field(&self, name: &str) -> Result<&UnwrappedValue, DecodeError> {
        match &self.leaf {
            UnwrappedValue::Fields(fields) => fields
                .get(name)
                .ok_or_else(|| DecodeError::missing_field(name)),
            other => Err(DecodeError::invalid_field_type(
                "value",
                "multiple",
                other.kind_name(),
            )),
        }
    }
}

fn leaf_quantity(unwrapped: &Unwrapped) -> Result<(f64, &str), DecodeError> {
    unwrapped.leaf.as_quantity().ok_or_else(|| {
        DecodeError::invalid_field_type("value", "quantity", unwrapped.leaf.kind_name())
    })
}

fn leaf_samples(unwrapped: &Unwrapped) -> Result<(&[SamplePoint], &str), DecodeError> {
    unwrapped.leaf.as_samples().ok_or_else(|| {
        DecodeError::invalid_field_type("value", "samples", unwrapped.leaf.kind_name())
    })
}

fn leaf_mass(unwrapped: &Unwrapped) -> Result<Mass, DecodeError> {
    let (value, unit) = leaf_quantity(unwrapped)?;
    Ok(Mass::from_wire(value, unit)?)
}

fn leaf_percentage(unwrapped: &Unwrapped) -> Result<f64, DecodeError> {
    let (value, unit) = leaf_quantity(unwrapped)?;
    expect_unit(unit, &["%", "percent"])?;
    if !(0.0..=100.0).contains(&value) {
        return Err(DecodeError::invalid_field_type(
            "value",
            "percentage in [0, 100]",
            value.to_string(),
        ));
    }
    Ok(value)
}

fn leaf_count(unwrapped: &Unwrapped) -> Result<u64, DecodeError> {
    let (value, unit) = leaf_quantity(unwrapped)?;
    expect_unit(unit, &["count"])?;
    Ok(non_negative(value)?.round() as u64)
}

fn field_quantity<'u>(unwrapped: &'u Unwrapped, name: &str) -> Result<(f64, &'u str), DecodeError> {
    let field = unwrapped.required_field(name)?;
    field
        .as_quantity()
        .ok_or_else(|| DecodeError::invalid_field_type(name, "quantity", field.kind_name()))
}

fn field_samples<'u>(
    unwrapped: &'u Unwrapped,
    name: &str,
) -> Result<(&'u [SamplePoint], &'u str), DecodeError> {
    let field = unwrapped.required_field(name)?;
    field
        .as_samples()
        .ok_or_else(|| DecodeError::invalid_field_type(name, "samples", field.kind_name()))
}

/// Derived category/label sub-field as a bare label, if present
fn derived_category<'u>(unwrapped: &'u Unwrapped, key: &str) -> Option<&'u str> {
    match unwrapped.derived_field(key)? {
        UnwrappedValue::Category { label, .. } => Some(label.as_str()),
        UnwrappedValue::Label(text) => Some(text.as_str()),
        _ => None,
    }
}

fn body_temperature_location(unwrapped: &Unwrapped) -> BodyTemperatureLocation {
    derived_category(unwrapped, "measurementLocation")
        .and_then(BodyTemperatureLocation::parse_label)
        .unwrap_or(BodyTemperatureLocation::Unknown)
}

/// Parse a record's defining discriminator; a miss is a hard failure.
fn discriminator<T>(
    (family, label): (&str, &str),
    expected_family: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, DecodeError> {
    if family != expected_family {
        return Err(DecodeError::invalid_field_type(
            "categoryFamily",
            expected_family,
            family,
        ));
    }
    parse(label).ok_or_else(|| DecodeError::invalid_category(expected_family, label))
}

fn expect_unit(unit: &str, allowed: &[&str]) -> Result<(), DecodeError> {
    if allowed.contains(&unit) {
        Ok(())
    } else {
        Err(DecodeError::invalid_field_type(
            "unit",
            allowed.join(" or "),
            unit,
        ))
    }
}

fn non_negative(value: f64) -> Result<f64, DecodeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DecodeError::invalid_field_type(
            "value",
            "finite non-negative number",
            value.to_string(),
        ))
    }
}

fn plain_series(points: &[SamplePoint], range: &TimeRange) -> Vec<SeriesSample> {
    points
        .iter()
        .map(|point| SeriesSample {
            time: sample_time(range, point),
            value: point.value,
        })
        .collect()
}

fn sample_time(range: &TimeRange, point: &SamplePoint) -> DateTime<Utc> {
    range.start_time + Duration::milliseconds(point.offset_millis)
}
