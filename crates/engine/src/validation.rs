//! Validity checks exposed to the surrounding validator.

use formchoice_types::{ChoiceOption, DataType, is_empty_value};
use serde_json::Value;
use thiserror::Error;

use crate::options::ValueCodec;
use crate::selection::{InputState, normalize_value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidityIssue {
    /// A checked option carries a value the input cannot store.
    #[error("option '{label}' has a value that cannot be selected")]
    InvalidValueProperty { label: String },

    /// The value matches none of the available options.
    #[error("value is not one of the available options")]
    ValueUnavailable,
}

/// Inputs for a validity pass.
#[derive(Debug, Clone, Copy)]
pub struct ValidityContext<'a> {
    pub options: &'a [ChoiceOption],
    pub inputs: &'a [InputState],
    pub data_value: &'a Value,
    pub data_type: DataType,
    pub only_available_items: bool,
}

pub fn check_validity(context: ValidityContext<'_>, codec: &ValueCodec) -> Vec<ValidityIssue> {
    let mut issues = Vec::new();

    for (option, input) in context.options.iter().zip(context.inputs) {
        if input.checked && option.invalid {
            issues.push(ValidityIssue::InvalidValueProperty {
                label: option.label.clone(),
            });
        }
    }

    if context.only_available_items && !value_is_blank(context.data_value) {
        let available = context
            .options
            .iter()
            .any(|option| normalize_value(&codec.decode_value(&option.value), context.data_type) == *context.data_value);
        if !available {
            issues.push(ValidityIssue::ValueUnavailable);
        }
    }

    issues
}

fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Object(map) => map.is_empty(),
        other => is_empty_value(other),
    }
}
