//! Key-path access into JSON documents.
//!
//! Paths use dot notation with optional array indices, e.g.
//! `metadata.listData.grid[1].radio`. Writes create missing intermediate
//! containers: an object for a key segment, an array for an index segment.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        if part.is_empty() {
            continue;
        }
        let mut rest = part;
        // leading key before any `[n]`
        if let Some(bracket) = rest.find('[') {
            if bracket > 0 {
                segments.push(Segment::Key(&rest[..bracket]));
            }
            rest = &rest[bracket..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    segments.push(Segment::Key(stripped));
                    break;
                };
                let inner = &stripped[..close];
                match inner.parse::<usize>() {
                    Ok(index) => segments.push(Segment::Index(index)),
                    Err(_) => segments.push(Segment::Key(inner.trim_matches(|c| c == '"' || c == '\''))),
                }
                rest = &stripped[close + 1..];
            }
        } else {
            segments.push(Segment::Key(rest));
        }
    }
    segments
}

/// Look up the value stored at `path`.
///
/// An empty path returns the root value.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in parse_path(path) {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(index)?,
            (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Store `new_value` at `path`, creating intermediate containers.
///
/// Existing scalars along the path are replaced by containers. Sibling keys
/// are never touched.
pub fn set_path(target: &mut Value, path: &str, new_value: Value) {
    let segments = parse_path(path);
    let Some((last, parents)) = segments.split_last() else {
        *target = new_value;
        return;
    };

    let mut current = target;
    for (position, segment) in parents.iter().enumerate() {
        let next_is_index = matches!(segments.get(position + 1), Some(Segment::Index(_)));
        current = child_slot(current, segment, next_is_index);
    }
    *child_slot(current, last, false) = new_value;
}

fn child_slot<'a>(current: &'a mut Value, segment: &Segment<'_>, next_is_index: bool) -> &'a mut Value {
    let placeholder = || if next_is_index { Value::Array(Vec::new()) } else { Value::Object(Map::new()) };
    match segment {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(map) = current else {
                unreachable!("slot was just replaced by an object");
            };
            let slot = map.entry((*key).to_string()).or_insert_with(placeholder);
            if slot.is_null() {
                *slot = placeholder();
            }
            slot
        }
        Segment::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let Value::Array(items) = current else {
                unreachable!("slot was just replaced by an array");
            };
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            let slot = &mut items[*index];
            if slot.is_null() {
                *slot = placeholder();
            }
            slot
        }
    }
}

/// Copy the values found at `keys` into a new object.
///
/// Keys missing from `source` are skipped.
pub fn pick_paths(source: &Value, keys: &[String]) -> Value {
    let mut picked = Value::Object(Map::new());
    for key in keys {
        if let Some(found) = get_path(source, key) {
            set_path(&mut picked, key, found.clone());
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_follows_keys_and_indices() {
        let document = json!({ "grid": [{ "radio": "a" }, { "radio": { "id": 1 } }] });
        assert_eq!(get_path(&document, "grid[1].radio.id"), Some(&json!(1)));
        assert_eq!(get_path(&document, "grid[0].radio"), Some(&json!("a")));
        assert_eq!(get_path(&document, "grid[2].radio"), None);
        assert_eq!(get_path(&document, ""), Some(&document));
    }

    #[test]
    fn set_path_creates_containers_without_touching_siblings() {
        let mut document = json!({ "listData": { "other": [1, 2] } });
        set_path(&mut document, "listData.grid[1].radio", json!(["x"]));
        assert_eq!(document["listData"]["other"], json!([1, 2]));
        assert_eq!(document["listData"]["grid"][0], Value::Null);
        assert_eq!(document["listData"]["grid"][1]["radio"], json!(["x"]));
    }

    #[test]
    fn set_path_overwrites_existing_leaf() {
        let mut document = json!({ "selectData": { "radio": { "label": "old" } } });
        set_path(&mut document, "selectData.radio", json!({ "label": "new" }));
        assert_eq!(document, json!({ "selectData": { "radio": { "label": "new" } } }));
    }

    #[test]
    fn pick_paths_keeps_nested_shape() {
        let item = json!({ "label": "Alabama", "meta": { "abbr": "AL", "pop": 5 } });
        let picked = pick_paths(&item, &["label".to_string(), "meta.abbr".to_string(), "missing".to_string()]);
        assert_eq!(picked, json!({ "label": "Alabama", "meta": { "abbr": "AL" } }));
    }
}
