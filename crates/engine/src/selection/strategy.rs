//! Kind-specific selection behaviour.

use std::fmt;

use formchoice_types::{DataType, SelectionMode, empty_value};
use formchoice_util::is_truthy;
use serde_json::{Map, Value};

use super::{InputState, normalize_value};
use crate::options::{ValueCodec, element_key};

/// Behaviour that differs between single- and multi-choice inputs.
pub trait SelectionStrategy: Send + Sync + fmt::Debug {
    fn mode(&self) -> SelectionMode;

    /// Data value meaning "nothing selected".
    fn empty_value(&self) -> Value;

    /// Value currently expressed by the rendered inputs.
    fn read_value(&self, inputs: &[InputState], codec: &ValueCodec, data_value: &Value) -> Value;

    /// Whether `data_value` selects `input`.
    fn holds(&self, input: &InputState, data_value: &Value, codec: &ValueCodec, data_type: DataType) -> bool;

    /// Whether `input` should be displayed as selected.
    fn is_checked(&self, input: &InputState, data_value: &Value, codec: &ValueCodec, data_type: DataType) -> bool {
        self.holds(input, data_value, codec, data_type)
    }

    /// Apply a click on the input at `index` to the native checked flags.
    fn toggle(&self, inputs: &mut [InputState], index: usize);

    /// Whether a user re-selecting the current value clears it.
    fn resets_on_reselect(&self) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SingleChoice;

impl SelectionStrategy for SingleChoice {
    fn mode(&self) -> SelectionMode {
        SelectionMode::SingleChoice
    }

    fn empty_value(&self) -> Value {
        empty_value()
    }

    /// Decoded value of the checked input, or the committed value when none is checked.
    fn read_value(&self, inputs: &[InputState], codec: &ValueCodec, data_value: &Value) -> Value {
        inputs
            .iter()
            .find(|input| input.checked)
            .map(|input| codec.decode_value(&input.value))
            .unwrap_or_else(|| data_value.clone())
    }

    fn holds(&self, input: &InputState, data_value: &Value, codec: &ValueCodec, data_type: DataType) -> bool {
        normalize_value(&codec.decode_value(&input.value), data_type) == *data_value
    }

    fn toggle(&self, inputs: &mut [InputState], index: usize) {
        for (position, input) in inputs.iter_mut().enumerate() {
            input.checked = position == index;
        }
    }

    fn resets_on_reselect(&self) -> bool {
        true
    }
}

/// Independent toggles accumulated into an object keyed by element value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiChoice;

impl SelectionStrategy for MultiChoice {
    fn mode(&self) -> SelectionMode {
        SelectionMode::MultiChoice
    }

    fn empty_value(&self) -> Value {
        Value::Object(Map::new())
    }

    fn read_value(&self, inputs: &[InputState], _codec: &ValueCodec, _data_value: &Value) -> Value {
        let mut selected = Map::new();
        for input in inputs {
            selected.insert(element_key(&input.value), Value::Bool(input.checked));
        }
        Value::Object(selected)
    }

    fn holds(&self, input: &InputState, data_value: &Value, _codec: &ValueCodec, _data_type: DataType) -> bool {
        data_value.get(element_key(&input.value)).is_some_and(is_truthy)
    }

    fn is_checked(&self, input: &InputState, data_value: &Value, codec: &ValueCodec, data_type: DataType) -> bool {
        self.holds(input, data_value, codec, data_type) || input.checked
    }

    fn toggle(&self, inputs: &mut [InputState], index: usize) {
        if let Some(input) = inputs.get_mut(index) {
            input.checked = !input.checked;
        }
    }

    fn resets_on_reselect(&self) -> bool {
        false
    }
}

/// Strategy implementing `mode`.
pub fn strategy_for(mode: SelectionMode) -> Box<dyn SelectionStrategy> {
    match mode {
        SelectionMode::SingleChoice => Box::new(SingleChoice),
        SelectionMode::MultiChoice => Box::new(MultiChoice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(values: &[Value]) -> Vec<InputState> {
        values.iter().cloned().map(InputState::new).collect()
    }

    #[test]
    fn single_choice_checks_exactly_one_input() {
        let mut inputs = inputs(&[json!("a"), json!("b")]);
        SingleChoice.toggle(&mut inputs, 1);
        SingleChoice.toggle(&mut inputs, 0);
        assert!(inputs[0].checked);
        assert!(!inputs[1].checked);
        assert_eq!(SingleChoice.read_value(&inputs, &ValueCodec::new(), &json!("")), json!("a"));
    }

    #[test]
    fn single_choice_falls_back_to_the_committed_value() {
        let inputs = inputs(&[json!("a")]);
        assert_eq!(SingleChoice.read_value(&inputs, &ValueCodec::new(), &json!("z")), json!("z"));
    }

    #[test]
    fn single_choice_compares_normalized_values() {
        let input = InputState::new(json!("3"));
        let codec = ValueCodec::new();
        assert!(SingleChoice.holds(&input, &json!(3), &codec, DataType::Auto));
        assert!(!SingleChoice.holds(&input, &json!(3), &codec, DataType::String));
    }

    #[test]
    fn multi_choice_accumulates_flags() {
        let mut inputs = inputs(&[json!("a"), json!("b")]);
        MultiChoice.toggle(&mut inputs, 1);
        assert_eq!(MultiChoice.read_value(&inputs, &ValueCodec::new(), &json!({})), json!({ "a": false, "b": true }));

        MultiChoice.toggle(&mut inputs, 1);
        assert!(!inputs[1].checked);
    }

    #[test]
    fn multi_choice_checked_by_value_or_native_flag() {
        let codec = ValueCodec::new();
        let mut input = InputState::new(json!("a"));
        assert!(MultiChoice.is_checked(&input, &json!({ "a": true }), &codec, DataType::Auto));
        assert!(!MultiChoice.is_checked(&input, &json!({ "a": false }), &codec, DataType::Auto));
        input.checked = true;
        assert!(MultiChoice.is_checked(&input, &json!({}), &codec, DataType::Auto));
    }
}
