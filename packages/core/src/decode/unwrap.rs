//! Value Unwrapping
//!
//! Checks a wire [`ValuePayload`] against the shape its record type
//! declares in the registry and produces a typed leaf plus a side-table of
//! derived named sub-fields. Everything downstream works on
//! [`UnwrappedValue`] - a closed union - so no decoder ever casts a dynamic
//! value and no miss can silently produce a null.

use crate::decode::error::DecodeError;
use crate::models::envelope::{SamplePoint, ValuePayload};
use crate::registry::{FieldSpec, Shape};
use std::collections::BTreeMap;

/// A typed leaf produced by unwrapping
#[derive(Debug, Clone, PartialEq)]
pub enum UnwrappedValue {
    Quantity { value: f64, unit: String },
    Category { family: String, label: String },
    Samples { points: Vec<SamplePoint>, unit: String },
    Label(String),
    /// Required sub-fields of a compound payload, keyed by field name
    Fields(BTreeMap<String, UnwrappedValue>),
    /// No value carried
    Empty,
}

impl UnwrappedValue {
    pub fn as_quantity(&self) -> Option<(f64, &str)> {
        match self {
            Self::Quantity { value, unit } => Some((*value, unit.as_str())),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<(&str, &str)> {
        match self {
            Self::Category { family, label } => Some((family.as_str(), label.as_str())),
            _ => None,
        }
    }

    pub fn as_samples(&self) -> Option<(&[SamplePoint], &str)> {
        match self {
            Self::Samples { points, unit } => Some((points.as_slice(), unit.as_str())),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Diagnostic name mirroring the wire payload tags
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Quantity { .. } => "quantity",
            Self::Category { .. } => "category",
            Self::Samples { .. } => "samples",
            Self::Label(_) => "label",
            Self::Fields(_) => "multiple",
            Self::Empty => "none",
        }
    }
}

/// Unwrapping result: the shaped leaf plus derived named sub-fields
///
/// `derived` holds the payload's extra named sub-fields (e.g.
/// `measurementLocation`, `baseline`, `specimenSource`) that specific
/// decoders consume; unrelated extras are simply ignored by them.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwrapped {
    pub leaf: UnwrappedValue,
    pub derived: BTreeMap<String, UnwrappedValue>,
}

impl Unwrapped {
    /// Derived sub-field by name, if present
    pub fn derived_field(&self, name: &str) -> Option<&UnwrappedValue> {
        self.derived.get(name)
    }
}

/// Unwrap a payload against its declared shape.
///
/// For `Multiple` shapes the declared required sub-fields become the leaf
/// (each recursively shape-checked) and every remaining sub-field lands in
/// the derived side-table. For all other shapes the payload tag must match
/// the declaration exactly.
pub fn unwrap_value(payload: &ValuePayload, shape: Shape) -> Result<Unwrapped, DecodeError> {
    match shape {
        Shape::Multiple(required) => unwrap_multiple(payload, required),
        _ => Ok(Unwrapped {
            leaf: unwrap_field("value", payload, shape)?,
            derived: BTreeMap::new(),
        }),
    }
}

/// Shape-check a single field's payload.
fn unwrap_field(
    field: &str,
    payload: &ValuePayload,
    shape: Shape,
) -> Result<UnwrappedValue, DecodeError> {
    let mismatch = || DecodeError::invalid_field_type(field, shape.name(), payload.kind_name());

    match (shape, payload) {
        (Shape::Quantity, ValuePayload::Quantity { value, unit }) => {
            Ok(UnwrappedValue::Quantity {
                value: *value,
                unit: unit.clone(),
            })
        }
        (
            Shape::Category,
            ValuePayload::Category {
                category_family,
                label,
            },
        ) => Ok(UnwrappedValue::Category {
            family: category_family.clone(),
            label: label.clone(),
        }),
        (Shape::Samples, ValuePayload::Samples { points, unit }) => {
            if points.is_empty() {
                return Err(DecodeError::invalid_field_type(
                    field,
                    "non-empty sample list",
                    "empty sample list",
                ));
            }
            Ok(UnwrappedValue::Samples {
                points: points.clone(),
                unit: unit.clone(),
            })
        }
        (Shape::Label, ValuePayload::Label { text }) => Ok(UnwrappedValue::Label(text.clone())),
        (Shape::None, ValuePayload::None) => Ok(UnwrappedValue::Empty),
        (Shape::Multiple(required), ValuePayload::Multiple { .. }) => {
            // Nested compounds keep only their required fields as the leaf
            unwrap_multiple(payload, required).map(|unwrapped| unwrapped.leaf)
        }
        _ => Err(mismatch()),
    }
}

fn unwrap_multiple(
    payload: &ValuePayload,
    required: &'static [FieldSpec],
) -> Result<Unwrapped, DecodeError> {
    let fields = match payload {
        ValuePayload::Multiple { fields } => fields,
        other => {
            return Err(DecodeError::invalid_field_type(
                "value",
                "multiple",
                other.kind_name(),
            ))
        }
    };

    let mut leaf = BTreeMap::new();
    for spec in required {
        let field_payload = fields
            .get(spec.name)
            .ok_or_else(|| DecodeError::missing_field(spec.name))?;
        leaf.insert(
            spec.name.to_string(),
            unwrap_field(spec.name, field_payload, spec.shape)?,
        );
    }

    let mut derived = BTreeMap::new();
    for (name, field_payload) in fields {
        if required.iter().any(|spec| spec.name == name.as_str()) {
            continue;
        }
        derived.insert(name.clone(), interpret_payload(field_payload));
    }

    Ok(Unwrapped {
        leaf: UnwrappedValue::Fields(leaf),
        derived,
    })
}

/// Interpret a derived payload by its own tag, without a shape expectation.
fn interpret_payload(payload: &ValuePayload) -> UnwrappedValue {
    match payload {
        ValuePayload::Quantity { value, unit } => UnwrappedValue::Quantity {
            value: *value,
            unit: unit.clone(),
        },
        ValuePayload::Category {
            category_family,
            label,
        } => UnwrappedValue::Category {
            family: category_family.clone(),
            label: label.clone(),
        },
        ValuePayload::Samples { points, unit } => UnwrappedValue::Samples {
            points: points.clone(),
            unit: unit.clone(),
        },
        ValuePayload::Label { text } => UnwrappedValue::Label(text.clone()),
        ValuePayload::Multiple { fields } => UnwrappedValue::Fields(
            fields
                .iter()
                .map(|(name, payload)| (name.clone(), interpret_payload(payload)))
                .collect(),
        ),
        ValuePayload::None => UnwrappedValue::Empty,
    }
}
