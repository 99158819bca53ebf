//! `{{ path }}` template interpolation.
//!
//! Used for request URLs, request headers and option label templates. An
//! expression is a key-path resolved against the context object; unresolved
//! expressions render as the empty string.

use once_cell::sync::Lazy;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::{get_path, value_to_string};

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex compiles"));
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+(>|$)").expect("markup regex compiles"));

/// Render `template`, replacing each `{{ expression }}` with the value found at
/// that key-path in `context`.
///
/// # Examples
/// ```rust
/// use formchoice_util::render_template;
/// use serde_json::json;
///
/// let rendered = render_template("<span>{{ item.label }}</span>", &json!({ "item": { "label": "Alabama" } }));
/// assert_eq!(rendered, "<span>Alabama</span>");
/// ```
pub fn render_template(template: &str, context: &Value) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |captures: &Captures| {
            let expression = captures[1].trim();
            get_path(context, expression).map(value_to_string).unwrap_or_default()
        })
        .into_owned()
}

/// Key-paths referenced below `root` in `template`, in order of appearance.
///
/// `template_keys("{{ item.label }} ({{ item.data.code }})", "item")` yields
/// `["label", "data.code"]`.
pub fn template_keys(template: &str, root: &str) -> Vec<String> {
    let prefix = format!("{root}.");
    let mut keys: Vec<String> = Vec::new();
    for captures in PLACEHOLDER_REGEX.captures_iter(template) {
        let expression = captures[1].trim();
        if let Some(key) = expression.strip_prefix(&prefix)
            && !key.is_empty()
            && !keys.iter().any(|existing| existing == key)
        {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Percent-encode a value for use inside a URL query string.
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Remove markup tags from a rendered label.
pub fn strip_markup(rendered: &str) -> String {
    MARKUP_REGEX.replace_all(rendered, "").trim().to_string()
}
