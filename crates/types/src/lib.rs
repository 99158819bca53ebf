//! Shared type definitions for the formchoice workspace.
//!
//! - [`component`]: the component configuration surface consumed by the engine
//! - [`option`]: resolved options, the canonical empty value and capability sets

pub mod component;
pub mod option;

pub use component::{
    ComponentConfig, ConfigError, DEFAULT_ITEM_TEMPLATE, DEFAULT_LIMIT, DataSettings, DataSource, DataType, HeaderEntry, InputKind,
    StaticValue,
};
pub use option::{Capabilities, ChoiceOption, EMPTY_VALUE, SelectionMode, ValueEncoding, empty_value, is_empty_value};
