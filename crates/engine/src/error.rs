use formchoice_types::ConfigError;
use thiserror::Error;

/// Why a load cycle did not produce options.
///
/// Kept inside the loader state, so the variants carry rendered messages
/// rather than the source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("option request failed: {0}")]
    Fetch(String),

    #[error("data source '{0}' cannot be loaded")]
    UnsupportedSource(String),

    #[error("could not build option request: {0}")]
    Request(String),
}

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("no option at index {index} ({count} options available)")]
    NoSuchOption { index: usize, count: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
