//! Selection state machine.
//!
//! The engine owns the committed data value and the native state of each
//! rendered input. It commits values read from the inputs or supplied by a
//! caller, detects a user re-selecting the value that is already committed
//! and, for single-choice inputs, turns that re-selection into a reset.

mod normalize;
mod strategy;

pub use normalize::{normalize_value, values_match};
pub use strategy::{MultiChoice, SelectionStrategy, SingleChoice, strategy_for};

use formchoice_types::{ChoiceOption, DataType, SelectionMode, is_empty_value};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::options::ValueCodec;

/// Native state of one rendered input element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputState {
    /// Element value: the raw scalar or a surrogate key.
    pub value: Value,
    /// Native checked flag.
    pub checked: bool,
    /// Whether the wrapper carries the selected class and the element the
    /// persisted `checked` attribute.
    pub selected: bool,
}

impl InputState {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            checked: false,
            selected: false,
        }
    }
}

/// Previous and current committed values, used only to spot re-selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub previous: Value,
    pub current: Value,
}

/// Flags describing where an update came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateFlags {
    /// The update is a direct user interaction.
    pub modified: bool,
    /// No change notification will be emitted for the update.
    pub no_update_event: bool,
}

impl UpdateFlags {
    pub fn user() -> Self {
        Self {
            modified: true,
            no_update_event: false,
        }
    }

    pub fn programmatic() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The initial commit changed the data value.
    pub changed: bool,
    /// The update was a re-selection and the value was reset to empty.
    pub reset: bool,
}

#[derive(Debug)]
pub struct SelectionEngine {
    strategy: Box<dyn SelectionStrategy>,
    data_type: DataType,
    state: SelectionState,
    data_value: Value,
    inputs: Vec<InputState>,
}

impl SelectionEngine {
    pub fn new(mode: SelectionMode, data_type: DataType) -> Self {
        Self::with_strategy(strategy_for(mode), data_type)
    }

    pub fn with_strategy(strategy: Box<dyn SelectionStrategy>, data_type: DataType) -> Self {
        let empty = strategy.empty_value();
        Self {
            strategy,
            data_type,
            state: SelectionState {
                previous: empty.clone(),
                current: empty.clone(),
            },
            data_value: empty,
            inputs: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.strategy.mode()
    }

    pub fn data_value(&self) -> &Value {
        &self.data_value
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn inputs(&self) -> &[InputState] {
        &self.inputs
    }

    /// Whether the committed value is this kind's empty value.
    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.data_value) || self.data_value == self.strategy.empty_value()
    }

    pub fn normalize_value(&self, value: &Value) -> Value {
        normalize_value(value, self.data_type)
    }

    /// Value expressed by the rendered inputs.
    pub fn get_value(&self, codec: &ValueCodec) -> Value {
        self.strategy.read_value(&self.inputs, codec, &self.data_value)
    }

    /// Replace the rendered inputs with one per option, checked according to
    /// the committed value.
    pub fn attach_inputs(&mut self, options: &[ChoiceOption], codec: &ValueCodec) {
        self.inputs = options.iter().map(|option| InputState::new(option.value.clone())).collect();
        self.sync_inputs_from_value(codec);
    }

    /// Apply a click on the input at `index`. Returns `false` when no such input exists.
    pub fn click(&mut self, index: usize) -> bool {
        if index >= self.inputs.len() {
            return false;
        }
        self.strategy.toggle(&mut self.inputs, index);
        true
    }

    /// Commit a value.
    ///
    /// `proposed` of `None` reads the value from the rendered inputs. A user
    /// update on a single-choice input that commits the value already held
    /// resets the data value to empty.
    pub fn update_value(&mut self, proposed: Option<Value>, flags: UpdateFlags, codec: &ValueCodec) -> UpdateOutcome {
        let value = proposed.unwrap_or_else(|| self.get_value(codec));
        let normalized = self.normalize_value(&value);
        let changed = normalized != self.data_value;
        if changed {
            self.data_value = normalized;
            self.set_selected_classes(codec);
        }

        if !flags.modified || !self.strategy.resets_on_reselect() {
            if changed {
                self.state.previous = self.data_value.clone();
            }
            return UpdateOutcome { changed, reset: false };
        }

        self.state.current = self.data_value.clone();
        let reselected = !flags.no_update_event && !self.is_empty() && self.state.previous == self.state.current;
        if reselected {
            debug!(value = %self.state.current, "selected option clicked again, resetting value");
            self.data_value = self.strategy.empty_value();
            self.sync_inputs_from_value(codec);
        }
        self.state.previous = self.data_value.clone();
        UpdateOutcome { changed, reset: reselected }
    }

    /// Clear the committed value without treating it as a user change.
    pub fn reset_value(&mut self, codec: &ValueCodec) {
        self.data_value = self.strategy.empty_value();
        self.state.previous = self.data_value.clone();
        self.state.current = self.data_value.clone();
        self.sync_inputs_from_value(codec);
    }

    /// Set each input's native checked flag from the committed value, then
    /// refresh the selected classes.
    pub fn sync_inputs_from_value(&mut self, codec: &ValueCodec) {
        for input in &mut self.inputs {
            input.checked = self.strategy.holds(input, &self.data_value, codec, self.data_type);
        }
        self.set_selected_classes(codec);
    }

    /// Mirror checked-ness into each input's selected class and attribute.
    pub fn set_selected_classes(&mut self, codec: &ValueCodec) {
        for input in &mut self.inputs {
            input.selected = self.strategy.is_checked(input, &self.data_value, codec, self.data_type);
        }
    }

    /// Index of the first input displayed as selected.
    pub fn selected_index(&self) -> Option<usize> {
        self.inputs.iter().position(|input| input.selected)
    }
}
