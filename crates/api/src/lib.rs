//! Remote option fetching.
//!
//! This crate defines the contract the option loader uses to reach remote
//! sources and ships a reqwest-backed implementation. It focuses on:
//!
//! - Describing a resolved request ([`FetchRequest`]) with its method, headers and body
//! - Constructing an HTTP client with sensible defaults
//! - Discovering a user token from `FORMCHOICE_TOKEN`
//! - Caching `GET` responses unless the component asks to ignore the cache
//!
//! The primary entry point is [`HttpOptionFetcher`]; tests and embedders can
//! provide their own [`OptionFetcher`].
//!
//! # Example
//!
//! ```ignore
//! use formchoice_api::{FetchRequest, HttpOptionFetcher, OptionFetcher};
//!
//! let fetcher = HttpOptionFetcher::new_from_env()?;
//! let payload = fetcher.fetch(&FetchRequest::get("https://example.com/states.json")).await?;
//! ```

mod payload;
mod request;

pub use payload::extract_collection_items;
pub use request::{FetchOptions, FetchRequest, OptionFetcher};
pub use reqwest::Method;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use std::{env, fmt};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable holding the token attached to authenticated requests.
pub const TOKEN_ENV_VAR: &str = "FORMCHOICE_TOKEN";

/// Header carrying the user's token.
pub const TOKEN_HEADER: &str = "x-jwt-token";

const BODY_PREVIEW_LIMIT: usize = 200;

/// Errors surfaced while fetching a remote option payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),

    #[error("invalid request header '{name}'")]
    InvalidHeader { name: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body_preview}")]
    Status { status: u16, body_preview: String },

    #[error("failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Thin wrapper around a configured `reqwest::Client` for option requests.
pub struct HttpOptionFetcher {
    http: Client,
    user_agent: String,
    token: Option<String>,
    response_cache: Mutex<HashMap<String, Value>>,
}

impl fmt::Debug for HttpOptionFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOptionFetcher")
            .field("user_agent", &self.user_agent)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl HttpOptionFetcher {
    /// Construct a fetcher, reading the token from [`TOKEN_ENV_VAR`].
    pub fn new_from_env() -> Result<Self, FetchError> {
        Self::new(env::var(TOKEN_ENV_VAR).ok().filter(|token| !token.is_empty()))
    }

    /// Construct a fetcher with an explicit token.
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            user_agent: format!("formchoice/0.1; {}", env::consts::OS),
            token,
            response_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.response_cache.lock().expect("response cache lock").clear();
    }
}

#[async_trait]
impl OptionFetcher for HttpOptionFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = validate_request_url(&request.url)?;
        let cache_key = request.cache_key();
        if let Some(key) = cache_key.as_deref()
            && let Some(cached) = self.response_cache.lock().expect("response cache lock").get(key).cloned()
        {
            debug!(url = %request.url, "option response cache hit");
            return Ok(cached);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(header::USER_AGENT, &self.user_agent);
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader { name: name.clone() })?;
            builder = builder.header(header_name, header_value);
        }
        if !request.options.no_token
            && let Some(token) = self.token.as_deref()
        {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        debug!(method = %request.method, url = %request.url, header_count = request.headers.len(), "option request started");
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "option request completed"
        );

        if !status.is_success() {
            warn!(url = %request.url, status = status.as_u16(), "option request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body_preview: body_preview(&text),
            });
        }

        let payload = if text.trim().is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        if let Some(key) = cache_key {
            self.response_cache.lock().expect("response cache lock").insert(key, payload.clone());
        }
        Ok(payload)
    }
}

/// Validate that a request URL is absolute and uses HTTP(S).
fn validate_request_url(raw: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(raw).map_err(|error| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: error.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(parsed)
}

fn body_preview(text: &str) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= BODY_PREVIEW_LIMIT {
        return collapsed;
    }
    let mut preview: String = collapsed.chars().take(BODY_PREVIEW_LIMIT).collect();
    preview.push_str("...");
    preview
}
