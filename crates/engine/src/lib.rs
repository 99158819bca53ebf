//! # formchoice engine
//!
//! Option loading and selection for selectable-option inputs (radio groups
//! and checkbox lists) whose options are either declared inline or fetched
//! from a remote source.
//!
//! ## Key Features
//!
//! - **Debounced loading**: rapid triggers collapse into one request using the
//!   last supplied arguments
//! - **Readiness gate**: a generation-tagged signal that every trigger resolves
//!   eventually, including when the request fails
//! - **Surrogate codec**: structured option values travel through string-only
//!   inputs as generated keys scoped to one load generation
//! - **Reset on reselect**: a user clicking the selected radio option clears it
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use formchoice_api::HttpOptionFetcher;
//! use formchoice_engine::{ComponentOptions, EngineSettings, OptionComponent, SubmissionMetadata};
//! use formchoice_types::ComponentConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config: ComponentConfig = serde_json::from_str(r#"{
//!     "key": "state",
//!     "dataSrc": "url",
//!     "data": { "url": "https://example.com/states.json" },
//!     "valueProperty": "abbr"
//! }"#)?;
//! let metadata = SubmissionMetadata::new();
//! let mut component = OptionComponent::new(
//!     config,
//!     Arc::new(HttpOptionFetcher::new_from_env()?),
//!     metadata.shared(),
//!     &EngineSettings::from_env(),
//!     ComponentOptions::default(),
//! )?;
//! let rendered = component.render_when_ready().await;
//! if !rendered.inputs.is_empty() {
//!     component.select_option(0)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`options`**: option sources, item mapping and the surrogate [`ValueCodec`]
//! - **`loader`**: debouncer, [`ReadinessGate`] and the [`OptionLoader`] cycle
//! - **`selection`**: value normalization and the [`SelectionEngine`] state machine
//! - **`metadata`**: persisted `listData` / `selectData` projections
//! - **`render`**: the [`RenderGate`] and rendered input model
//! - **`component`**: [`OptionComponent`], composing all of the above

pub mod component;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod options;
pub mod render;
pub mod selection;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use component::{ChangeEvent, ComponentOptions, OptionComponent};
pub use error::{ComponentError, LoadError};
pub use loader::{GateTicket, LoadArgs, LoadContext, LoadStatus, OptionLoader, ReadinessGate};
pub use metadata::{MetadataStore, SharedMetadata, SubmissionMetadata};
pub use options::{OptionSource, ValueCodec};
pub use render::{RenderGate, RenderOutput, RenderedInput, RenderedOptions};
pub use selection::{SelectionEngine, UpdateFlags, UpdateOutcome, normalize_value};
pub use settings::EngineSettings;
pub use validation::ValidityIssue;
