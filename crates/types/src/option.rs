//! Option model and capability set shared by the loader and selection engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::InputKind;

/// Canonical empty data value.
pub const EMPTY_VALUE: &str = "";

/// Returns the canonical empty data value as JSON.
pub fn empty_value() -> Value {
    Value::String(EMPTY_VALUE.to_string())
}

/// Whether `value` is the canonical empty value.
pub fn is_empty_value(value: &Value) -> bool {
    matches!(value, Value::String(text) if text.is_empty())
}

/// One selectable entry in the resolved option list.
///
/// `value` is the element value: the raw value when it can be carried by a
/// string-only input, otherwise a surrogate key issued by the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
            invalid: false,
            shortcut: None,
        }
    }

    pub fn with_shortcut(mut self, shortcut: Option<String>) -> Self {
        self.shortcut = shortcut;
        self
    }
}

/// How option values travel through input elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueEncoding {
    /// Only strings reach the element; anything else is surrogated.
    Scalar,
    /// Elements carry the raw value.
    Structured,
}

/// How many options may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    SingleChoice,
    MultiChoice,
}

/// Capability set parameterizing an option-backed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub encoding: ValueEncoding,
    pub selection: SelectionMode,
}

impl Capabilities {
    pub const RADIO: Self = Self {
        encoding: ValueEncoding::Scalar,
        selection: SelectionMode::SingleChoice,
    };

    pub const CHECKBOX: Self = Self {
        encoding: ValueEncoding::Structured,
        selection: SelectionMode::MultiChoice,
    };

    pub fn for_input(kind: InputKind) -> Self {
        match kind {
            InputKind::Radio => Self::RADIO,
            InputKind::Checkbox => Self::CHECKBOX,
        }
    }

    pub fn is_single_choice(&self) -> bool {
        self.selection == SelectionMode::SingleChoice
    }
}
