//! Helpers shared across the formchoice crates.
//!
//! - `json_path`: key-path reads and path-scoped writes into JSON documents
//! - `template`: `{{ path }}` interpolation for URLs, headers and labels
//! - `stringify`: runtime-compatible string conversion and truthiness

pub mod json_path;
pub mod stringify;
pub mod template;

pub use json_path::{get_path, pick_paths, set_path};
pub use stringify::{is_truthy, number_to_string, value_to_string};
pub use template::{encode_query_value, render_template, strip_markup, template_keys};
