//! Render gating.
//!
//! Real option markup is only produced once the loader has settled; until
//! then callers render a loading placeholder.

use serde::Serialize;
use serde_json::Value;

use crate::loader::{LoadStatus, OptionLoader};

/// One rendered option input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedInput {
    pub label: String,
    /// Element value attribute: the raw scalar or a surrogate key.
    pub value: Value,
    pub checked: bool,
    pub selected: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub invalid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedOptions {
    pub key: String,
    pub inline: bool,
    pub inputs: Vec<RenderedInput>,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Loading,
    Ready(RenderedOptions),
}

impl RenderOutput {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug, Clone)]
pub struct RenderGate {
    loader: OptionLoader,
}

impl RenderGate {
    pub fn new(loader: OptionLoader) -> Self {
        Self { loader }
    }

    /// Whether a load cycle has settled at least once.
    pub fn is_open(&self) -> bool {
        self.loader.is_settled()
    }

    /// Wait until the gate opens, starting a load when none is pending.
    pub async fn wait_open(&self) {
        while !self.is_open() {
            let gate = self.loader.gate();
            let never_triggered = self.loader.status() == LoadStatus::Idle && gate.current().generation() == 0;
            let ticket = if gate.is_open() || never_triggered { self.loader.trigger(None) } else { gate.current() };
            self.loader.wait(ticket).await;
        }
    }
}
