//! Category Mapping
//!
//! Maps generic wire labels to native enumerated constants, one enum per
//! category family. Lookup is match-based over process-wide, read-only
//! tables; an unrecognized label yields `None` from [`decode_category`]
//! rather than an error, and each family carries an `Unknown` constant for
//! callers that fall back instead of failing.
//!
//! Whether a miss is acceptable is the caller's decision: auxiliary fields
//! (measurement location, body position) fall back to `Unknown`, while a
//! record's defining discriminator (menstrual flow level, ovulation result)
//! escalates a miss to a decode failure.

use std::str::FromStr;

macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Parse a wire label; `None` when unrecognized.
            pub fn parse_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Wire label for this constant.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }
    };
}

category_enum!(
    /// Sleep stage kinds for ordered sleep-session stages
    SleepStageType {
        Unknown => "unknown",
        Awake => "awake",
        AwakeInBed => "awakeInBed",
        OutOfBed => "outOfBed",
        Sleeping => "sleeping",
        Light => "light",
        Deep => "deep",
        Rem => "rem",
    }
);

category_enum!(
    /// Menstrual flow level - the defining discriminator of a
    /// menstruation-flow record
    MenstruationFlow {
        Unknown => "unknown",
        Light => "light",
        Medium => "medium",
        Heavy => "heavy",
    }
);

category_enum!(
    /// Where a body temperature was measured
    BodyTemperatureLocation {
        Unknown => "unknown",
        Armpit => "armpit",
        Ear => "ear",
        Finger => "finger",
        Forehead => "forehead",
        Mouth => "mouth",
        Rectum => "rectum",
        TemporalArtery => "temporalArtery",
        Toe => "toe",
        Vagina => "vagina",
        Wrist => "wrist",
    }
);

category_enum!(
    /// Where a skin temperature series was measured
    SkinTemperatureLocation {
        Unknown => "unknown",
        Finger => "finger",
        Toe => "toe",
        Wrist => "wrist",
    }
);

category_enum!(
    /// Body position during a blood pressure measurement
    BloodPressureBodyPosition {
        Unknown => "unknown",
        StandingUp => "standingUp",
        SittingDown => "sittingDown",
        LyingDown => "lyingDown",
        Reclining => "reclining",
    }
);

category_enum!(
    /// Arm and site of a blood pressure measurement
    BloodPressureLocation {
        Unknown => "unknown",
        LeftWrist => "leftWrist",
        RightWrist => "rightWrist",
        LeftUpperArm => "leftUpperArm",
        RightUpperArm => "rightUpperArm",
    }
);

category_enum!(
    /// Specimen a blood glucose reading was taken from
    SpecimenSource {
        Unknown => "unknown",
        InterstitialFluid => "interstitialFluid",
        CapillaryBlood => "capillaryBlood",
        Plasma => "plasma",
        Serum => "serum",
        Tears => "tears",
        WholeBlood => "wholeBlood",
    }
);

category_enum!(
    /// Meal associated with a reading
    MealType {
        Unknown => "unknown",
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
    }
);

category_enum!(
    /// Temporal relation of a reading to a meal
    RelationToMeal {
        Unknown => "unknown",
        General => "general",
        Fasting => "fasting",
        BeforeMeal => "beforeMeal",
        AfterMeal => "afterMeal",
    }
);

category_enum!(
    /// Ovulation test outcome - the defining discriminator of an
    /// ovulation-test record
    OvulationTestResult {
        Inconclusive => "inconclusive",
        Positive => "positive",
        High => "high",
        Negative => "negative",
    }
);

category_enum!(
    /// Cervical mucus appearance - the defining discriminator of a
    /// cervical-mucus record
    CervicalMucusAppearance {
        Unknown => "unknown",
        Dry => "dry",
        Sticky => "sticky",
        Creamy => "creamy",
        Watery => "watery",
        EggWhite => "eggWhite",
        Unusual => "unusual",
    }
);

category_enum!(
    /// Cervical mucus sensation
    CervicalMucusSensation {
        Unknown => "unknown",
        Light => "light",
        Medium => "medium",
        Heavy => "heavy",
    }
);

category_enum!(
    /// Whether protection was used during sexual activity
    Protection {
        Unknown => "unknown",
        Protected => "protected",
        Unprotected => "unprotected",
    }
);

category_enum!(
    /// How a VO2 max value was obtained
    Vo2MaxMethod {
        Other => "other",
        MetabolicCart => "metabolicCart",
        HeartRateRatio => "heartRateRatio",
        CooperTest => "cooperTest",
        MultistageFitnessTest => "multistageFitnessTest",
        RockportFitnessTest => "rockportFitnessTest",
    }
);

/// Category families addressable from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFamily {
    SleepStage,
    MenstruationFlow,
    BodyTemperatureMeasurementLocation,
    SkinTemperatureMeasurementLocation,
    BloodPressureBodyPosition,
    BloodPressureMeasurementLocation,
    BloodGlucoseSpecimenSource,
    MealType,
    RelationToMeal,
    OvulationTestResult,
    CervicalMucusAppearance,
    CervicalMucusSensation,
    ProtectionUsed,
    Vo2MaxMeasurementMethod,
}

impl FromStr for CategoryFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sleepStage" => Ok(Self::SleepStage),
            "menstruationFlow" => Ok(Self::MenstruationFlow),
            "bodyTemperatureMeasurementLocation" => Ok(Self::BodyTemperatureMeasurementLocation),
            "skinTemperatureMeasurementLocation" => Ok(Self::SkinTemperatureMeasurementLocation),
            "bloodPressureBodyPosition" => Ok(Self::BloodPressureBodyPosition),
            "bloodPressureMeasurementLocation" => Ok(Self::BloodPressureMeasurementLocation),
            "bloodGlucoseSpecimenSource" => Ok(Self::BloodGlucoseSpecimenSource),
            "mealType" => Ok(Self::MealType),
            "relationToMeal" => Ok(Self::RelationToMeal),
            "ovulationTestResult" => Ok(Self::OvulationTestResult),
            "cervicalMucusAppearance" => Ok(Self::CervicalMucusAppearance),
            "cervicalMucusSensation" => Ok(Self::CervicalMucusSensation),
            "protectionUsed" => Ok(Self::ProtectionUsed),
            "vo2MaxMeasurementMethod" => Ok(Self::Vo2MaxMeasurementMethod),
            _ => Err(format!("Unknown category family: {}", s)),
        }
    }
}

/// A native category constant from any family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCategory {
    SleepStage(SleepStageType),
    MenstruationFlow(MenstruationFlow),
    BodyTemperatureLocation(BodyTemperatureLocation),
    SkinTemperatureLocation(SkinTemperatureLocation),
    BloodPressureBodyPosition(BloodPressureBodyPosition),
    BloodPressureLocation(BloodPressureLocation),
    SpecimenSource(SpecimenSource),
    MealType(MealType),
    RelationToMeal(RelationToMeal),
    OvulationTestResult(OvulationTestResult),
    CervicalMucusAppearance(CervicalMucusAppearance),
    CervicalMucusSensation(CervicalMucusSensation),
    Protection(Protection),
    Vo2MaxMethod(Vo2MaxMethod),
}

/// Decode a `(family, label)` pair into a native category constant.
///
/// Returns `None` when either the family or the label is unrecognized.
/// Callers decide per field whether `None` falls back to the family's
/// `Unknown` constant or escalates to a decode failure.
pub fn decode_category(family: &str, label: &str) -> Option<NativeCategory> {
    let family: CategoryFamily = family.parse().ok()?;
    match family {
        CategoryFamily::SleepStage => {
            SleepStageType::parse_label(label).map(NativeCategory::SleepStage)
        }
        CategoryFamily::MenstruationFlow => {
            MenstruationFlow::parse_label(label).map(NativeCategory::MenstruationFlow)
        }
        CategoryFamily::BodyTemperatureMeasurementLocation => {
            BodyTemperatureLocation::parse_label(label)
                .map(NativeCategory::BodyTemperatureLocation)
        }
        CategoryFamily::SkinTemperatureMeasurementLocation => {
            SkinTemperatureLocation::parse_label(label)
                .map(NativeCategory::SkinTemperatureLocation)
        }
        CategoryFamily::BloodPressureBodyPosition => {
            BloodPressureBodyPosition::parse_label(label)
                .map(NativeCategory::BloodPressureBodyPosition)
        }
        CategoryFamily::BloodPressureMeasurementLocation => {
            BloodPressureLocation::parse_label(label).map(NativeCategory::BloodPressureLocation)
        }
        CategoryFamily::BloodGlucoseSpecimenSource => {
            SpecimenSource::parse_label(label).map(NativeCategory::SpecimenSource)
        }
        CategoryFamily::MealType => MealType::parse_label(label).map(NativeCategory::MealType),
        CategoryFamily::RelationToMeal => {
            RelationToMeal::parse_label(label).map(NativeCategory::RelationToMeal)
        }
        CategoryFamily::OvulationTestResult => {
            OvulationTestResult::parse_label(label).map(NativeCategory::OvulationTestResult)
        }
        CategoryFamily::CervicalMucusAppearance => {
            CervicalMucusAppearance::parse_label(label)
                .map(NativeCategory::CervicalMucusAppearance)
        }
        CategoryFamily::CervicalMucusSensation => {
            CervicalMucusSensation::parse_label(label)
                .map(NativeCategory::CervicalMucusSensation)
        }
        CategoryFamily::ProtectionUsed => {
            Protection::parse_label(label).map(NativeCategory::Protection)
        }
        CategoryFamily::Vo2MaxMeasurementMethod => {
            Vo2MaxMethod::parse_label(label).map(NativeCategory::Vo2MaxMethod)
        }
    }
}
