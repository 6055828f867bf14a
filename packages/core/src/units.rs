//! Unit Conversion
//!
//! Pure conversions from wire-supplied `(value, unit)` pairs into canonical
//! internal quantities, one function per physical dimension. Each dimension
//! accepts a closed set of recognized unit strings (SI plus common imperial
//! and medical units) and rejects anything else with [`UnitError`] naming
//! the offending unit and dimension - never a silent default.
//!
//! Canonical quantities: grams, meters, kilocalories, watts, liters,
//! degrees Celsius, Celsius delta, millimoles per liter, meters per second.
//! Conversions are exact rational where possible (km -> m is x1000) and
//! IEEE-754 double otherwise; no rounding beyond native double precision.

use serde::Serialize;
use thiserror::Error;

/// Physical dimensions recognized by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Mass,
    Length,
    Energy,
    Power,
    Volume,
    Temperature,
    TemperatureDelta,
    BloodGlucose,
    Velocity,
    Pressure,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mass => "mass",
            Self::Length => "length",
            Self::Energy => "energy",
            Self::Power => "power",
            Self::Volume => "volume",
            Self::Temperature => "temperature",
            Self::TemperatureDelta => "temperature delta",
            Self::BloodGlucose => "blood glucose",
            Self::Velocity => "velocity",
            Self::Pressure => "pressure",
        };
        write!(f, "{}", name)
    }
}

/// Unrecognized unit string for a dimension
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unrecognized {dimension} unit: '{unit}'")]
pub struct UnitError {
    pub dimension: Dimension,
    pub unit: String,
}

impl UnitError {
    pub fn new(dimension: Dimension, unit: impl Into<String>) -> Self {
        Self {
            dimension,
            unit: unit.into(),
        }
    }
}

/// A canonical quantity, tagged by dimension
///
/// Returned by [`to_canonical`]; decoders that already know the dimension
/// use the typed constructors (`Mass::from_wire` etc.) directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanonicalQuantity {
    Mass(Mass),
    Length(Length),
    Energy(Energy),
    Power(Power),
    Volume(Volume),
    Temperature(Temperature),
    TemperatureDelta(TemperatureDelta),
    BloodGlucose(BloodGlucose),
    Velocity(Velocity),
    Pressure(Pressure),
}

/// Convert a wire `(value, unit)` pair into the canonical quantity for
/// `dimension`.
pub fn to_canonical(
    dimension: Dimension,
    value: f64,
    unit: &str,
) -> Result<CanonicalQuantity, UnitError> {
    Ok(match dimension {
        Dimension::Mass => CanonicalQuantity::Mass(Mass::from_wire(value, unit)?),
        Dimension::Length => CanonicalQuantity::Length(Length::from_wire(value, unit)?),
        Dimension::Energy => CanonicalQuantity::Energy(Energy::from_wire(value, unit)?),
        Dimension::Power => CanonicalQuantity::Power(Power::from_wire(value, unit)?),
        Dimension::Volume => CanonicalQuantity::Volume(Volume::from_wire(value, unit)?),
        Dimension::Temperature => {
            CanonicalQuantity::Temperature(Temperature::from_wire(value, unit)?)
        }
        Dimension::TemperatureDelta => {
            CanonicalQuantity::TemperatureDelta(TemperatureDelta::from_wire(value, unit)?)
        }
        Dimension::BloodGlucose => {
            CanonicalQuantity::BloodGlucose(BloodGlucose::from_wire(value, unit)?)
        }
        Dimension::Velocity => CanonicalQuantity::Velocity(Velocity::from_wire(value, unit)?),
        Dimension::Pressure => CanonicalQuantity::Pressure(Pressure::from_wire(value, unit)?),
    })
}

/// Mass, canonically in grams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Mass {
    grams: f64,
}

impl Mass {
    pub fn from_grams(grams: f64) -> Self {
        Self { grams }
    }

    pub fn grams(&self) -> f64 {
        self.grams
    }

    pub fn kilograms(&self) -> f64 {
        self.grams / 1000.0
    }

    /// Recognized units: g, kg, mg, ug, lb, oz
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let grams = match unit {
            "g" => value,
            "kg" => value * 1000.0,
            "mg" => value / 1000.0,
            "ug" => value / 1_000_000.0,
            // International avoirdupois pound: exactly 453.59237 g
            "lb" => value * 453.592_37,
            "oz" => value * (453.592_37 / 16.0),
            _ => return Err(UnitError::new(Dimension::Mass, unit)),
        };
        Ok(Self { grams })
    }
}

/// Length, canonically in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Length {
    meters: f64,
}

impl Length {
    pub fn from_meters(meters: f64) -> Self {
        Self { meters }
    }

    pub fn meters(&self) -> f64 {
        self.meters
    }

    /// Recognized units: m, km, cm, mm, mi, in, ft
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let meters = match unit {
            "m" => value,
            "km" => value * 1000.0,
            "cm" => value / 100.0,
            "mm" => value / 1000.0,
            // International mile: exactly 1609.344 m
            "mi" => value * 1609.344,
            "in" => value * 0.0254,
            "ft" => value * 0.3048,
            _ => return Err(UnitError::new(Dimension::Length, unit)),
        };
        Ok(Self { meters })
    }
}

/// Energy, canonically in kilocalories
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Energy {
    kilocalories: f64,
}

impl Energy {
    pub fn from_kilocalories(kilocalories: f64) -> Self {
        Self { kilocalories }
    }

    pub fn kilocalories(&self) -> f64 {
        self.kilocalories
    }

    /// Recognized units: kcal, cal, kJ, J (thermochemical calorie, 4.184 J)
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let kilocalories = match unit {
            "kcal" => value,
            "cal" => value / 1000.0,
            "kJ" => value / 4.184,
            "J" => value / 4184.0,
            _ => return Err(UnitError::new(Dimension::Energy, unit)),
        };
        Ok(Self { kilocalories })
    }
}

/// Power, canonically in watts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Power {
    watts: f64,
}

impl Power {
    pub fn from_watts(watts: f64) -> Self {
        Self { watts }
    }

    pub fn watts(&self) -> f64 {
        self.watts
    }

    /// Recognized units: W, mW, kcal/day
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let watts = match unit {
            "W" => value,
            "mW" => value / 1000.0,
            // 1 kcal/day = 4184 J / 86400 s
            "kcal/day" => value * (4184.0 / 86_400.0),
            _ => return Err(UnitError::new(Dimension::Power, unit)),
        };
        Ok(Self { watts })
    }
}

/// Volume, canonically in liters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Volume {
    liters: f64,
}

impl Volume {
    pub fn from_liters(liters: f64) -> Self {
        Self { liters }
    }

    pub fn liters(&self) -> f64 {
        self.liters
    }

    /// Recognized units: L, mL, fl_oz_us, cup_us
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let liters = match unit {
            "L" => value,
            "mL" => value / 1000.0,
            // US fluid ounce: exactly 29.5735295625 mL
            "fl_oz_us" => value * 0.029_573_529_562_5,
            // US customary cup: 8 US fluid ounces
            "cup_us" => value * (0.029_573_529_562_5 * 8.0),
            _ => return Err(UnitError::new(Dimension::Volume, unit)),
        };
        Ok(Self { liters })
    }
}

/// Temperature, canonically in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Temperature {
    celsius: f64,
}

impl Temperature {
    pub fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    /// Recognized units: C, F, K
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let celsius = match unit {
            "C" => value,
            "F" => (value - 32.0) * (5.0 / 9.0),
            "K" => value - 273.15,
            _ => return Err(UnitError::new(Dimension::Temperature, unit)),
        };
        Ok(Self { celsius })
    }
}

/// Temperature difference, canonically in Celsius degrees
///
/// Distinct from [`Temperature`]: a delta has no absolute zero point, so
/// Fahrenheit deltas scale by 5/9 without the 32-degree shift.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct TemperatureDelta {
    celsius: f64,
}

impl TemperatureDelta {
    pub fn from_celsius(celsius: f64) -> Self {
        Self { celsius }
    }

    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    /// Recognized units: C, F
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let celsius = match unit {
            "C" => value,
            "F" => value * (5.0 / 9.0),
            _ => return Err(UnitError::new(Dimension::TemperatureDelta, unit)),
        };
        Ok(Self { celsius })
    }
}

/// Blood glucose concentration, canonically in millimoles per liter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct BloodGlucose {
    millimoles_per_liter: f64,
}

impl BloodGlucose {
    pub fn from_millimoles_per_liter(millimoles_per_liter: f64) -> Self {
        Self {
            millimoles_per_liter,
        }
    }

    pub fn millimoles_per_liter(&self) -> f64 {
        self.millimoles_per_liter
    }

    /// Recognized units: mmol/L, mg/dL (molar mass of glucose: 18.0156 g/mol)
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let millimoles_per_liter = match unit {
            "mmol/L" => value,
            "mg/dL" => value / 18.015_6,
            _ => return Err(UnitError::new(Dimension::BloodGlucose, unit)),
        };
        Ok(Self {
            millimoles_per_liter,
        })
    }
}

/// Velocity, canonically in meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Velocity {
    meters_per_second: f64,
}

impl Velocity {
    pub fn from_meters_per_second(meters_per_second: f64) -> Self {
        Self { meters_per_second }
    }

    pub fn meters_per_second(&self) -> f64 {
        self.meters_per_second
    }

    /// Recognized units: m/s, km/h, mph
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        let meters_per_second = match unit {
            "m/s" => value,
            "km/h" => value / 3.6,
            "mph" => value * (1609.344 / 3600.0),
            _ => return Err(UnitError::new(Dimension::Velocity, unit)),
        };
        Ok(Self { meters_per_second })
    }
}

/// Pressure, canonically in millimeters of mercury
///
/// Blood pressure is the only consumer; the wire contract fixes mmHg as the
/// sole recognized unit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Pressure {
    millimeters_of_mercury: f64,
}

impl Pressure {
    pub fn from_millimeters_of_mercury(millimeters_of_mercury: f64) -> Self {
        Self {
            millimeters_of_mercury,
        }
    }

    pub fn millimeters_of_mercury(&self) -> f64 {
        self.millimeters_of_mercury
    }

    /// Recognized units: mmHg
    pub fn from_wire(value: f64, unit: &str) -> Result<Self, UnitError> {
        match unit {
            "mmHg" => Ok(Self {
                millimeters_of_mercury: value,
            }),
            _ => Err(UnitError::new(Dimension::Pressure, unit)),
        }
    }
}
