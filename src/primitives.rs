//! Value-coercion primitives shared by the resolver, the validator and the
//! section controller.
//!
//! Field values are open-typed (`serde_json::Value`): the same store slot
//! may hold a string from a text field, a boolean from a radio pair, or an
//! object from a geolocation capture. These helpers give the rest of the
//! engine one set of coercion rules.

use serde_json::Value;

use crate::enums::ComponentKind;
use crate::types::Element;

// ─── Emptiness ──────────────────────────────────────────────────────────────

/// True for the values treated as "not filled in": null and the empty
/// string. `false` is a real answer, not an empty one.
pub fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// ─── Scalar casts ───────────────────────────────────────────────────────────

/// Cast a value to its string form. Null becomes the empty string (the
/// store's default), booleans become "true"/"false".
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Cast a value to a boolean. Only the literal `true` and the string
/// "true" count; everything else, including absent values, is false.
pub fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Numeric parse for number-kind validation. Strings must parse fully;
/// a trailing unit or stray character is a failure, not a truncation.
pub fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// ─── Display ────────────────────────────────────────────────────────────────

/// The human-readable form of a field value: select-like elements show the
/// matching option label rather than the stored value.
pub fn display_value(value: &Value, element: &Element) -> String {
    if value.is_null() {
        return String::new();
    }

    let options = element.options.as_deref().unwrap_or(&[]);

    match &element.component {
        ComponentKind::Dropdown | ComponentKind::RadioButton | ComponentKind::RadioButtonGroup
            if !options.is_empty() =>
        {
            options
                .iter()
                .find(|o| &o.value == value)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| value_to_string(value))
        }
        ComponentKind::MultiDropdown if !options.is_empty() => match value {
            Value::Array(selected) => selected
                .iter()
                .map(|v| {
                    options
                        .iter()
                        .find(|o| &o.value == v)
                        .map(|o| o.label.clone())
                        .unwrap_or_else(|| value_to_string(v))
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => value_to_string(other),
        },
        _ => value_to_string(value),
    }
}

// ─── Sanitization ───────────────────────────────────────────────────────────

/// Drop empty entries and trim string values. Used on pre-fill data coming
/// from earlier workflow stages.
pub fn sanitize_values(
    values: impl IntoIterator<Item = (String, Value)>,
) -> Vec<(String, Value)> {
    values
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some((key, Value::String(trimmed.to_string())))
                }
            }
            other => Some((key, other)),
        })
        .collect()
}
