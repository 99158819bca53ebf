//! Value coercion applied before comparison and storage.

use formchoice_types::{DataType, is_empty_value};
use formchoice_util::{is_truthy, number_to_string, value_to_string};
use serde_json::{Number, Value};

/// Coerce `value` according to `data_type`.
///
/// The canonical empty value passes through untouched under every policy.
pub fn normalize_value(value: &Value, data_type: DataType) -> Value {
    if is_empty_value(value) {
        return value.clone();
    }

    match data_type {
        DataType::Auto => normalize_auto(value),
        DataType::Number => to_number(value),
        DataType::String => match value {
            Value::Null => Value::String("null".to_string()),
            other => Value::String(value_to_string(other)),
        },
        DataType::Boolean => Value::Bool(is_truthy(value) && value_to_string(value) != "false"),
    }
}

/// Whether two values are equal once both are normalized.
pub fn values_match(left: &Value, right: &Value, data_type: DataType) -> bool {
    normalize_value(left, data_type) == normalize_value(right, data_type)
}

fn normalize_auto(value: &Value) -> Value {
    let Value::String(text) = value else {
        return value.clone();
    };
    if let Ok(parsed) = text.parse::<f64>()
        && parsed.is_finite()
        && let Some(number) = canonical_number(parsed)
        && number_to_string(&number) == *text
    {
        return Value::Number(number);
    }
    match text.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => value.clone(),
    }
}

/// Unconditional numeric coercion; values without a numeric reading become `null`.
fn to_number(value: &Value) -> Value {
    let parsed = match value {
        Value::Number(_) => return value.clone(),
        Value::Null => Some(0.0),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() { Some(0.0) } else { trimmed.parse::<f64>().ok() }
        }
        Value::Array(_) | Value::Object(_) => None,
    };
    parsed
        .filter(|float| float.is_finite())
        .and_then(canonical_number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Integral floats become integers so `3` and `3.0` compare equal.
fn canonical_number(float: f64) -> Option<Number> {
    if float.fract() == 0.0 && float.abs() < 9.0e15 {
        return Some(Number::from(float as i64));
    }
    Number::from_f64(float)
}
