//! Engine-wide settings.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::loader::DEFAULT_DEBOUNCE;

/// Environment variable overriding [`EngineSettings::base_url`].
pub const BASE_URL_ENV_VAR: &str = "FORMCHOICE_BASE_URL";
/// Environment variable overriding the debounce window, in milliseconds.
pub const DEBOUNCE_ENV_VAR: &str = "FORMCHOICE_DEBOUNCE_MS";

pub const DEFAULT_BASE_URL: &str = "https://api.form.io";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Window within which load triggers coalesce.
    pub debounce: Duration,
    /// Prefix for resource URLs and relative URL templates.
    pub base_url: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl EngineSettings {
    /// Defaults overridden by `FORMCHOICE_BASE_URL` and `FORMCHOICE_DEBOUNCE_MS`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(base_url) = env::var(BASE_URL_ENV_VAR)
            && !base_url.trim().is_empty()
        {
            settings.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Ok(raw) = env::var(DEBOUNCE_ENV_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(millis) => settings.debounce = Duration::from_millis(millis),
                Err(_) => warn!(variable = DEBOUNCE_ENV_VAR, value = %raw, "ignoring invalid debounce override"),
            }
        }
        settings
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overrides_from_environment() {
        temp_env::with_vars(
            [(BASE_URL_ENV_VAR, Some("https://forms.example.com/")), (DEBOUNCE_ENV_VAR, Some("250"))],
            || {
                let settings = EngineSettings::from_env();
                assert_eq!(settings.base_url, "https://forms.example.com");
                assert_eq!(settings.debounce, Duration::from_millis(250));
            },
        );
    }

    #[test]
    fn invalid_values_keep_defaults() {
        temp_env::with_vars([(BASE_URL_ENV_VAR, Some("  ")), (DEBOUNCE_ENV_VAR, Some("soon"))], || {
            assert_eq!(EngineSettings::from_env(), EngineSettings::default());
        });
    }
}
