//! Loading component definitions and JSON documents from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use formchoice_types::ComponentConfig;
use serde_json::Value;

/// Read a document as YAML when the extension says so, JSON otherwise.
pub fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| matches!(extension.to_ascii_lowercase().as_str(), "yaml" | "yml"));
    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("failed to parse JSON in {}", path.display()))
    }
}

/// Load a component definition.
///
/// The file may hold the component itself or a form with a `components`
/// array, in which case the first component is used.
pub fn load_component(path: &Path) -> Result<ComponentConfig> {
    let mut document = read_document(path)?;
    let first = document
        .get_mut("components")
        .and_then(Value::as_array_mut)
        .map(std::mem::take)
        .map(|components| components.into_iter().next());
    if let Some(first) = first {
        document = first.with_context(|| format!("{} declares no components", path.display()))?;
    }
    serde_json::from_value(document).with_context(|| format!("{} is not a valid component definition", path.display()))
}

/// Read an optional JSON/YAML document, defaulting to `null`.
pub fn read_optional(path: Option<&Path>) -> Result<Value> {
    path.map(read_document).transpose().map(Option::unwrap_or_default)
}
