//! String conversions for JSON values as the browser form runtime performs them.

use serde_json::{Number, Value};

/// Format a number the way `Number.prototype.toString` does for common values.
///
/// Integral floats lose their fractional part (`3.0` -> `"3"`).
pub fn number_to_string(number: &Number) -> String {
    if let Some(integer) = number.as_i64() {
        return integer.to_string();
    }
    if let Some(unsigned) = number.as_u64() {
        return unsigned.to_string();
    }
    match number.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < 1e21 => format!("{float:.0}"),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

/// Convert a value to display text.
///
/// Strings are returned verbatim, `null` becomes the empty string, numbers and
/// booleans use their canonical text, and containers are serialized as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number_to_string(number),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness of a value in the form runtime.
///
/// `false`, `null`, `0`, `NaN` and `""` are falsy; containers are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0 && !float.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_use_canonical_text() {
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!(3.0)), "3");
        assert_eq!(value_to_string(&json!(2.5)), "2.5");
        assert_eq!(value_to_string(&json!(-7)), "-7");
    }

    #[test]
    fn containers_serialize_as_json() {
        assert_eq!(value_to_string(&json!({ "id": 1 })), r#"{"id":1}"#);
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(true)), "true");
    }

    #[test]
    fn truthiness_matches_runtime() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!({})));
    }
}
