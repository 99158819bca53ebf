//! Response payload normalization for option lists.

use serde_json::Value;

const RESPONSE_ARRAY_PRIORITY_KEYS: &[&str] = &["items", "results", "data", "values", "entries", "list", "rows", "options"];

/// Extract the list of option items from a response payload.
///
/// Extraction order:
/// 1. A top-level array is used directly.
/// 2. Wrapper objects are searched for well-known collection keys.
/// 3. A wrapper holding exactly one array-valued field yields that array.
pub fn extract_collection_items(payload: &Value) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => {
            for key in RESPONSE_ARRAY_PRIORITY_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    return Some(items.clone());
                }
            }

            let mut arrays = map.values().filter_map(|value| match value {
                Value::Array(items) => Some(items.clone()),
                _ => None,
            });
            let first = arrays.next()?;
            if arrays.next().is_none() {
                return Some(first);
            }
            None
        }
        _ => None,
    }
}
