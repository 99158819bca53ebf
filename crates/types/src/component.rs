//! Component configuration surface.
//!
//! These types mirror the JSON component definitions produced by the form
//! builder. Field names follow the builder's `camelCase` convention so a
//! definition can be deserialized verbatim from a form schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default page size used when a remote source does not configure `limit`.
pub const DEFAULT_LIMIT: u32 = 100;

/// Label template used when the component does not configure one.
pub const DEFAULT_ITEM_TEMPLATE: &str = "<span>{{ item.label }}</span>";

/// Where the component's options come from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSource {
    /// Inline `values` list declared on the component.
    #[default]
    Values,
    /// Inline JSON array stored under `data.json`.
    Json,
    /// Remote URL stored under `data.url`.
    Url,
    /// Submissions of another form resource (`data.resource`).
    Resource,
    /// Any other source; not loadable by this engine.
    Custom(String),
}

impl DataSource {
    /// Whether options have to be fetched before they can be rendered.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url | Self::Resource)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Values => "values",
            Self::Json => "json",
            Self::Url => "url",
            Self::Resource => "resource",
            Self::Custom(other) => other.as_str(),
        }
    }
}

impl From<String> for DataSource {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "values" => Self::Values,
            "json" => Self::Json,
            "url" => Self::Url,
            "resource" => Self::Resource,
            _ => Self::Custom(raw),
        }
    }
}

impl From<DataSource> for String {
    fn from(source: DataSource) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value coercion policy applied before comparison and storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    #[default]
    Auto,
    Number,
    String,
    Boolean,
}

impl From<String> for DataType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            // "auto", "" and unknown policies all fall back to auto detection
            _ => Self::Auto,
        }
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Auto => "auto",
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "boolean",
        }
        .to_string()
    }
}

/// Native input element kind rendered for each option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputKind {
    #[default]
    Radio,
    Checkbox,
}

impl From<String> for InputKind {
    fn from(raw: String) -> Self {
        if raw.trim().eq_ignore_ascii_case("checkbox") {
            Self::Checkbox
        } else {
            Self::Radio
        }
    }
}

impl From<InputKind> for String {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Radio => "radio".to_string(),
            InputKind::Checkbox => "checkbox".to_string(),
        }
    }
}

/// One entry of the inline `values` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticValue {
    #[serde(default)]
    pub label: String,
    #[serde(default = "empty_string_value")]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

impl StaticValue {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            shortcut: None,
        }
    }
}

/// Request header declared on a remote source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Settings nested under the component's `data` key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Inline items; either an array or a string containing a JSON array.
    #[serde(default)]
    pub json: Option<Value>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// Configuration of a single option-list component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub input_type: InputKind,
    #[serde(default)]
    pub data_src: DataSource,
    #[serde(default)]
    pub values: Vec<StaticValue>,
    #[serde(default)]
    pub data: DataSettings,
    /// Key-path into each loaded item selecting the stored value.
    #[serde(default)]
    pub value_property: Option<String>,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub ignore_cache: bool,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub inline: bool,
    /// Send the user's token with remote requests.
    #[serde(default)]
    pub authenticate: bool,
    #[serde(default)]
    pub only_available_items: bool,
    /// Fallback for the persisted selection record.
    #[serde(default)]
    pub select_data: Option<Value>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            label: String::new(),
            input_type: InputKind::Radio,
            data_src: DataSource::Values,
            values: Vec::new(),
            data: DataSettings::default(),
            value_property: None,
            data_type: DataType::Auto,
            limit: None,
            ignore_cache: false,
            template: None,
            default_value: None,
            hidden: false,
            inline: false,
            authenticate: false,
            only_available_items: false,
            select_data: None,
        }
    }
}

impl ComponentConfig {
    /// Page size for remote requests.
    pub fn effective_limit(&self) -> u32 {
        self.limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_LIMIT)
    }

    /// Label template, falling back to [`DEFAULT_ITEM_TEMPLATE`].
    pub fn item_template(&self) -> &str {
        self.template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
            .unwrap_or(DEFAULT_ITEM_TEMPLATE)
    }

    /// `valueProperty` when configured and non-empty.
    pub fn value_property(&self) -> Option<&str> {
        self.value_property.as_deref().filter(|property| !property.is_empty())
    }

    /// Check the definition for settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }
        if self.limit == Some(0) {
            return Err(ConfigError::InvalidLimit { key: self.key.clone() });
        }
        match &self.data_src {
            DataSource::Url if self.data.url.trim().is_empty() => Err(ConfigError::MissingUrl { key: self.key.clone() }),
            DataSource::Resource if self.data.resource.as_deref().is_none_or(|resource| resource.trim().is_empty()) => {
                Err(ConfigError::MissingResource { key: self.key.clone() })
            }
            _ => Ok(()),
        }
    }
}

/// Errors raised when a component definition cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("component definition has no key")]
    MissingKey,

    #[error("component '{key}': limit must be a positive integer")]
    InvalidLimit { key: String },

    #[error("component '{key}': dataSrc is 'url' but data.url is empty")]
    MissingUrl { key: String },

    #[error("component '{key}': dataSrc is 'resource' but data.resource is empty")]
    MissingResource { key: String },
}

fn default_key() -> String {
    "radio".to_string()
}

fn empty_string_value() -> Value {
    Value::String(String::new())
}
