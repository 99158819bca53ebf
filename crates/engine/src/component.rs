//! Option-backed input component.
//!
//! [`OptionComponent`] composes the loader, the selection engine and the
//! render gate for one component definition. Kind-specific behaviour comes
//! from the [`Capabilities`] derived from the definition's input type.

use std::sync::Arc;

use formchoice_api::OptionFetcher;
use formchoice_types::{Capabilities, ComponentConfig, SelectionMode};
use formchoice_util::{is_truthy, value_to_string};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::ComponentError;
use crate::loader::{GateTicket, LoadArgs, LoadContext, LoadStatus, OptionLoader};
use crate::metadata::SharedMetadata;
use crate::options::element_key;
use crate::render::{RenderGate, RenderOutput, RenderedInput, RenderedOptions};
use crate::selection::{SelectionEngine, UpdateFlags, UpdateOutcome};
use crate::settings::EngineSettings;
use crate::validation::{ValidityContext, ValidityIssue, check_validity};

/// Runtime options of the surrounding form.
#[derive(Debug, Clone, Default)]
pub struct ComponentOptions {
    pub read_only: bool,
    /// Submission data exposed to request templates as `data`.
    pub form_data: Value,
}

/// Change notification emitted when the data value changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub key: String,
    pub value: Value,
    /// The change came from a user interaction.
    pub modified: bool,
}

#[derive(Debug)]
pub struct OptionComponent {
    config: ComponentConfig,
    capabilities: Capabilities,
    loader: OptionLoader,
    render_gate: RenderGate,
    selection: SelectionEngine,
    metadata: SharedMetadata,
    options: ComponentOptions,
    visible: bool,
    attached_generation: Option<u64>,
    listeners: Vec<mpsc::UnboundedSender<ChangeEvent>>,
}

impl OptionComponent {
    /// Build a component from its definition.
    ///
    /// # Arguments
    /// * `config` - Component definition; rejected when [`ComponentConfig::validate`] fails.
    /// * `fetcher` - Fetch collaborator used by remote sources.
    /// * `metadata` - Submission metadata shared with the rest of the form.
    /// * `settings` - Debounce window and base URL.
    /// * `options` - Read-only flag and form data.
    pub fn new(
        config: ComponentConfig,
        fetcher: Arc<dyn OptionFetcher>,
        metadata: SharedMetadata,
        settings: &EngineSettings,
        options: ComponentOptions,
    ) -> Result<Self, ComponentError> {
        config.validate()?;
        let capabilities = Capabilities::for_input(config.input_type);
        let loader = OptionLoader::new(&config, capabilities.encoding, fetcher, metadata.clone(), settings);
        let selection = SelectionEngine::new(capabilities.selection, config.data_type);
        let visible = !config.hidden;
        if !visible {
            loader.gate().resolve_current();
        }

        let mut component = Self {
            render_gate: RenderGate::new(loader.clone()),
            config,
            capabilities,
            loader,
            selection,
            metadata,
            options,
            visible,
            attached_generation: None,
            listeners: Vec::new(),
        };
        if let Some(default_value) = component.config.default_value.clone().filter(|value| !value.is_null()) {
            let selection = &mut component.selection;
            component
                .loader
                .with_codec(|codec| selection.update_value(Some(default_value), UpdateFlags::programmatic(), codec));
        }
        component.sync_inputs();
        component.loader.set_context(component.load_context());
        Ok(component)
    }

    pub fn key(&self) -> &str {
        &self.config.key
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn loader(&self) -> &OptionLoader {
        &self.loader
    }

    pub fn status(&self) -> LoadStatus {
        self.loader.status()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn data_value(&self) -> &Value {
        self.selection.data_value()
    }

    /// Receive a [`ChangeEvent`] for every data value change from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChangeEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listeners.push(sender);
        receiver
    }

    /// Attach to the rendered inputs and start loading options.
    pub fn attach(&mut self) -> GateTicket {
        self.sync_inputs();
        if !self.visible {
            return self.loader.gate().current();
        }
        self.trigger_update(None)
    }

    /// Trigger a (debounced) load, optionally with a new search term.
    pub fn trigger_update(&mut self, search: Option<&str>) -> GateTicket {
        self.loader.set_context(self.load_context());
        self.loader.trigger(search.map(LoadArgs::search))
    }

    /// Reload options even if the arguments are unchanged.
    pub fn refresh(&mut self) -> GateTicket {
        self.loader.set_context(self.load_context());
        self.loader.refresh()
    }

    /// Render the options, or [`RenderOutput::Loading`] while the first load is pending.
    pub fn render(&mut self) -> RenderOutput {
        if self.visible && !self.render_gate.is_open() {
            return RenderOutput::Loading;
        }
        self.sync_inputs();
        RenderOutput::Ready(self.rendered())
    }

    /// Wait for the render gate, then render.
    pub async fn render_when_ready(&mut self) -> RenderedOptions {
        if self.visible {
            self.loader.set_context(self.load_context());
            self.render_gate.wait_open().await;
        }
        self.sync_inputs();
        self.rendered()
    }

    /// Apply a user click on the option at `index`.
    ///
    /// Clicking the option that already holds the value resets a
    /// single-choice component to empty and emits a second change.
    pub fn select_option(&mut self, index: usize) -> Result<UpdateOutcome, ComponentError> {
        self.sync_inputs();
        if !self.selection.click(index) {
            return Err(ComponentError::NoSuchOption {
                index,
                count: self.selection.inputs().len(),
            });
        }

        let selection = &mut self.selection;
        let outcome = self.loader.with_codec(|codec| selection.update_value(None, UpdateFlags::user(), codec));
        debug!(key = %self.config.key, index, changed = outcome.changed, reset = outcome.reset, "option clicked");
        if outcome.changed {
            self.write_select_metadata();
            self.emit_change(true);
        }
        if outcome.reset {
            self.emit_change(true);
        }
        Ok(outcome)
    }

    /// Set the data value programmatically. Returns whether it changed.
    pub fn set_value(&mut self, value: Value) -> bool {
        self.sync_inputs();
        let selection = &mut self.selection;
        let outcome = self.loader.with_codec(|codec| {
            let outcome = selection.update_value(Some(value), UpdateFlags::programmatic(), codec);
            selection.sync_inputs_from_value(codec);
            outcome
        });
        if outcome.changed {
            self.write_select_metadata();
            self.emit_change(false);
        }
        outcome.changed
    }

    /// Clear the data value without emitting a change.
    pub fn reset_value(&mut self) {
        let selection = &mut self.selection;
        self.loader.with_codec(|codec| selection.reset_value(codec));
    }

    /// Value expressed by the rendered inputs.
    pub fn get_value(&self) -> Value {
        self.loader.with_codec(|codec| self.selection.get_value(codec))
    }

    /// Display text of the data value.
    ///
    /// Uses the label of the matching option, then the persisted selection
    /// record of a remote source, then the value itself.
    pub fn value_as_string(&self) -> String {
        let data_value = self.selection.data_value();
        if self.selection.is_empty() {
            return String::new();
        }

        if self.selection.mode() == SelectionMode::MultiChoice {
            return self.loader.with_options(|options, _| {
                options
                    .iter()
                    .filter(|option| data_value.get(element_key(&option.value)).is_some_and(is_truthy))
                    .map(|option| option.label.clone())
                    .collect::<Vec<_>>()
                    .join(", ")
            });
        }

        let label = self.loader.with_options(|options, codec| {
            options
                .iter()
                .find(|option| !option.invalid && self.selection.normalize_value(&codec.decode_value(&option.value)) == *data_value)
                .map(|option| option.label.clone())
        });
        if let Some(label) = label {
            return label;
        }
        if self.loader.is_remote()
            && let Some(record) = self.select_data()
        {
            return self.loader.render_label(&record);
        }
        value_to_string(data_value)
    }

    /// Validity issues for the external validator.
    pub fn check_validity(&self) -> Vec<ValidityIssue> {
        self.loader.with_options(|options, codec| {
            check_validity(
                ValidityContext {
                    options,
                    inputs: self.selection.inputs(),
                    data_value: self.selection.data_value(),
                    data_type: self.config.data_type,
                    only_available_items: self.config.only_available_items,
                },
                codec,
            )
        })
    }

    /// Wait for the active readiness gate before the form submits.
    ///
    /// A visible component whose loader never ran starts its first load here.
    pub async fn before_submit(&self) {
        let gate = self.loader.gate();
        let never_triggered = self.loader.status() == LoadStatus::Idle && gate.current().generation() == 0;
        let ticket = if self.visible && never_triggered { self.loader.trigger(None) } else { gate.current() };
        self.loader.wait(ticket).await;
    }

    /// Show or hide the component. Showing a component starts its load.
    pub fn set_visible(&mut self, visible: bool) -> Option<GateTicket> {
        if visible == self.visible {
            return None;
        }
        self.visible = visible;
        if visible {
            return Some(self.attach());
        }
        self.loader.gate().resolve_current();
        None
    }

    /// Persisted selection record, falling back to the definition's `selectData`.
    pub fn select_data(&self) -> Option<Value> {
        self.metadata.select_data(&self.config.key).or_else(|| self.config.select_data.clone())
    }

    fn load_context(&self) -> LoadContext {
        LoadContext {
            read_only: self.options.read_only,
            data_value: self.selection.data_value().clone(),
            form_data: self.options.form_data.clone(),
        }
    }

    /// Rebuild the inputs when the loader has replaced its option list.
    fn sync_inputs(&mut self) {
        let generation = self.loader.generation();
        if self.attached_generation == Some(generation) {
            return;
        }
        let selection = &mut self.selection;
        self.loader.with_options(|options, codec| selection.attach_inputs(options, codec));
        self.attached_generation = Some(generation);
        trace!(key = %self.config.key, generation, "inputs attached");
    }

    fn rendered(&self) -> RenderedOptions {
        let inputs = self.loader.with_options(|options, _| {
            options
                .iter()
                .zip(self.selection.inputs())
                .map(|(option, input)| RenderedInput {
                    label: option.label.clone(),
                    value: input.value.clone(),
                    checked: input.checked,
                    selected: input.selected,
                    invalid: option.invalid,
                    shortcut: option.shortcut.clone(),
                })
                .collect()
        });
        RenderedOptions {
            key: self.config.key.clone(),
            inline: self.config.inline,
            inputs,
            value: self.selection.data_value().clone(),
            error: self.loader.error().map(|error| error.to_string()),
        }
    }

    /// Record the original item behind the selected option of a remote source.
    fn write_select_metadata(&self) {
        if !self.loader.is_remote() {
            return;
        }
        let Some(index) = self.selection.selected_index() else {
            return;
        };
        let Some(input) = self.selection.inputs().get(index) else {
            return;
        };
        if let Some(item) = self.loader.original_item(&element_key(&input.value)) {
            self.metadata.set_select_data(&self.config.key, item);
        }
    }

    fn emit_change(&mut self, modified: bool) {
        let event = ChangeEvent {
            key: self.config.key.clone(),
            value: self.selection.data_value().clone(),
            modified,
        };
        self.listeners.retain(|listener| listener.send(event.clone()).is_ok());
    }
}
