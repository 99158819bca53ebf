//! Mapping of loaded items onto options.

use std::collections::HashMap;

use formchoice_types::{ChoiceOption, ComponentConfig, StaticValue, ValueEncoding};
use formchoice_util::{get_path, render_template, strip_markup, value_to_string};
use serde_json::{Map, Value, json};

use super::ValueCodec;

/// Result of mapping one batch of items.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MappedItems {
    pub options: Vec<ChoiceOption>,
    /// Persistable projection of `options`, one `{label, value?}` per option.
    pub list_data: Vec<Value>,
    /// Original items keyed by the element value of their option.
    pub originals: HashMap<String, Value>,
}

/// Turns raw items into options using the component's label template and
/// `valueProperty`.
#[derive(Debug, Clone)]
pub struct ItemMapper {
    template: String,
    value_property: Option<String>,
    encoding: ValueEncoding,
}

impl ItemMapper {
    pub fn new(config: &ComponentConfig, encoding: ValueEncoding) -> Self {
        Self {
            template: config.item_template().to_string(),
            value_property: config.value_property().map(str::to_string),
            encoding,
        }
    }

    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    /// Map loaded items, registering surrogates in `codec`.
    ///
    /// The codec is expected to be in a fresh generation.
    pub fn map(&self, items: &[Value], codec: &mut ValueCodec) -> MappedItems {
        let mut mapped = MappedItems::default();
        for item in items {
            let raw = self.prepare_value(item);
            let element = codec.encode(&raw, self.encoding);
            let label = self.render_label(item);

            let mut option = ChoiceOption::new(label.clone(), element.clone());
            option.invalid = self.encoding == ValueEncoding::Structured && !is_scalar_element(&element);

            let mut entry = Map::new();
            entry.insert("label".to_string(), Value::String(label));
            if matches!(raw, Value::String(_) | Value::Number(_)) {
                entry.insert("value".to_string(), raw);
            }
            mapped.list_data.push(Value::Object(entry));
            mapped.originals.insert(element_key(&element), item.clone());
            mapped.options.push(option);
        }
        mapped
    }

    /// Map the component's inline `values` list.
    pub fn map_static(&self, values: &[StaticValue], codec: &mut ValueCodec) -> Vec<ChoiceOption> {
        values
            .iter()
            .map(|value| ChoiceOption::new(value.label.clone(), codec.encode(&value.value, self.encoding)).with_shortcut(value.shortcut.clone()))
            .collect()
    }

    /// Display label of `item`.
    ///
    /// Renders the label template against `{ item }`; items whose render has
    /// no text fall back to their own string form.
    pub fn render_label(&self, item: &Value) -> String {
        let rendered = strip_markup(&render_template(&self.template, &json!({ "item": item })));
        if rendered.is_empty() { value_to_string(item) } else { rendered }
    }

    /// Value stored when `item` is selected.
    pub fn prepare_value(&self, item: &Value) -> Value {
        match &self.value_property {
            Some(path) => get_path(item, path).cloned().unwrap_or(Value::Null),
            None => item.clone(),
        }
    }
}

/// String key identifying an element value.
pub fn element_key(element: &Value) -> String {
    value_to_string(element)
}

fn is_scalar_element(element: &Value) -> bool {
    matches!(element, Value::String(_) | Value::Number(_))
}
