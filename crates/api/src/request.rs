//! Fetch collaborator contract.

use std::fmt::Debug;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Method;
use serde_json::Value;

use crate::FetchError;

/// Per-request options forwarded from component configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Bypass any response cache kept by the fetcher.
    pub ignore_cache: bool,
    /// Do not attach the user's token.
    pub no_token: bool,
}

/// A fully resolved option request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: IndexMap<String, String>,
    pub body: Option<Value>,
    pub options: FetchOptions,
}

impl FetchRequest {
    /// Build a request, defaulting the method to `GET`.
    ///
    /// The body is dropped for `GET` requests.
    pub fn new(
        url: impl Into<String>,
        method: Option<&str>,
        headers: IndexMap<String, String>,
        body: Option<Value>,
        options: FetchOptions,
    ) -> Result<Self, FetchError> {
        let method = match method.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|_| FetchError::InvalidMethod(raw.to_string()))?,
            None => Method::GET,
        };
        let body = if method == Method::GET { None } else { body };
        Ok(Self {
            url: url.into(),
            method,
            headers,
            body,
            options,
        })
    }

    /// Shorthand for a header-less `GET`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: IndexMap::new(),
            body: None,
            options: FetchOptions::default(),
        }
    }

    /// Cache key for responses that may be reused, `None` when the request
    /// must always reach the network.
    pub fn cache_key(&self) -> Option<String> {
        if self.method != Method::GET || self.options.ignore_cache {
            return None;
        }
        Some(format!("{} {}", self.method, self.url))
    }
}

/// Source of remote option payloads.
///
/// Implementations return the raw response body; list extraction happens in
/// the loader.
#[async_trait]
pub trait OptionFetcher: Send + Sync + Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError>;
}
