//! Where a component's options come from.

use formchoice_api::{FetchOptions, FetchRequest};
use formchoice_types::{ComponentConfig, DataSource, HeaderEntry, StaticValue};
use formchoice_util::{encode_query_value, render_template};
use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::warn;

use crate::error::LoadError;
use crate::loader::LoadArgs;

/// Option source resolved from a component definition.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// The component's inline `values` list.
    Static(Vec<StaticValue>),
    /// Items declared inline under `data.json`; mapped like a response.
    Inline(Vec<Value>),
    Remote(RemoteSource),
    Unsupported(String),
}

/// Request template for a remote source.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSource {
    pub url: RemoteTarget,
    pub headers: Vec<HeaderEntry>,
    pub method: Option<String>,
    pub body: Option<Value>,
    pub limit: u32,
    pub ignore_cache: bool,
    pub authenticate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteTarget {
    /// URL template interpolated with the request context.
    Url(String),
    /// Submissions of a form resource.
    Resource(String),
}

impl OptionSource {
    pub fn from_config(config: &ComponentConfig) -> Self {
        match &config.data_src {
            DataSource::Values => Self::Static(config.values.clone()),
            DataSource::Json => Self::Inline(inline_items(config)),
            DataSource::Url => Self::Remote(RemoteSource::new(config, RemoteTarget::Url(config.data.url.clone()))),
            DataSource::Resource => Self::Remote(RemoteSource::new(
                config,
                RemoteTarget::Resource(config.data.resource.clone().unwrap_or_default()),
            )),
            DataSource::Custom(other) => Self::Unsupported(other.clone()),
        }
    }

    /// Whether the source must be fetched before options are known.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl RemoteSource {
    fn new(config: &ComponentConfig, url: RemoteTarget) -> Self {
        Self {
            url,
            headers: config.data.headers.clone(),
            method: config.data.method.clone(),
            body: config.data.body.clone(),
            limit: config.effective_limit(),
            ignore_cache: config.ignore_cache,
            authenticate: config.authenticate,
        }
    }

    /// Resolve the request for one load cycle.
    ///
    /// # Arguments
    /// * `args` - Search term and pagination offset of the cycle.
    /// * `base_url` - Prefix for resource URLs and relative URL templates.
    /// * `form_data` - Submission data exposed to templates as `data`.
    pub fn build_request(&self, args: &LoadArgs, base_url: &str, form_data: &Value) -> Result<FetchRequest, LoadError> {
        let base_url = base_url.trim_end_matches('/');
        let context = json!({
            "baseUrl": base_url,
            "formioBase": base_url,
            "search": encode_query_value(&args.search),
            "limit": self.limit,
            "skip": args.skip,
            "page": args.skip / self.limit.max(1),
            "data": form_data,
        });

        let url = match &self.url {
            RemoteTarget::Url(template) => {
                let rendered = render_template(template, &context);
                if rendered.starts_with('/') { format!("{base_url}{rendered}") } else { rendered }
            }
            RemoteTarget::Resource(resource) => {
                let mut url = format!("{base_url}/form/{resource}/submission?limit={}&skip={}", self.limit, args.skip);
                if !args.search.is_empty() {
                    url.push_str("&search=");
                    url.push_str(&encode_query_value(&args.search));
                }
                url
            }
        };
        if url.trim().is_empty() {
            return Err(LoadError::Request("request URL rendered empty".to_string()));
        }

        let mut headers = IndexMap::new();
        for entry in &self.headers {
            let name = entry.key.trim();
            if name.is_empty() {
                continue;
            }
            headers.insert(name.to_string(), render_template(&entry.value, &context));
        }

        let options = FetchOptions {
            ignore_cache: self.ignore_cache,
            no_token: matches!(self.url, RemoteTarget::Url(_)) && !self.authenticate,
        };
        FetchRequest::new(url, self.method.as_deref(), headers, self.body.clone(), options).map_err(|error| LoadError::Request(error.to_string()))
    }
}

fn inline_items(config: &ComponentConfig) -> Vec<Value> {
    match &config.data.json {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(raw)) if raw.trim().is_empty() => Vec::new(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(key = %config.key, "inline option JSON is not an array");
                Vec::new()
            }
            Err(error) => {
                warn!(key = %config.key, error = %error, "inline option JSON does not parse");
                Vec::new()
            }
        },
        Some(_) => {
            warn!(key = %config.key, "inline option JSON is not an array");
            Vec::new()
        }
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formchoice_api::Method;
    use formchoice_types::DataSettings;

    fn url_config(url: &str) -> ComponentConfig {
        ComponentConfig {
            key: "state".into(),
            data_src: DataSource::Url,
            data: DataSettings {
                url: url.into(),
                ..DataSettings::default()
            },
            ..ComponentConfig::default()
        }
    }

    fn remote(config: &ComponentConfig) -> RemoteSource {
        match OptionSource::from_config(config) {
            OptionSource::Remote(remote) => remote,
            other => panic!("expected remote source, got {other:?}"),
        }
    }

    #[test]
    fn interpolates_url_variables() {
        let mut config = url_config("{{ baseUrl }}/states?q={{ search }}&limit={{ limit }}&skip={{ skip }}&page={{ page }}&c={{ data.country }}");
        config.limit = Some(20);
        let args = LoadArgs {
            search: "new york".into(),
            skip: 40,
        };
        let request = remote(&config)
            .build_request(&args, "https://api.example.com/", &json!({ "country": "us" }))
            .expect("request builds");

        assert_eq!(request.url, "https://api.example.com/states?q=new%20york&limit=20&skip=40&page=2&c=us");
        assert_eq!(request.method, Method::GET);
        assert!(request.options.no_token);
    }

    #[test]
    fn relative_urls_get_the_base_prefix() {
        let request = remote(&url_config("/states.json"))
            .build_request(&LoadArgs::default(), "https://api.example.com", &Value::Null)
            .expect("request builds");
        assert_eq!(request.url, "https://api.example.com/states.json");
    }

    #[test]
    fn get_requests_drop_the_body_and_keep_headers() {
        let mut config = url_config("https://example.com/items");
        config.data.body = Some(json!({ "q": 1 }));
        config.data.headers = vec![
            HeaderEntry {
                key: "x-tenant".into(),
                value: "{{ data.tenant }}".into(),
            },
            HeaderEntry {
                key: " ".into(),
                value: "ignored".into(),
            },
        ];
        let request = remote(&config)
            .build_request(&LoadArgs::default(), "https://api.example.com", &json!({ "tenant": "acme" }))
            .expect("request builds");

        assert!(request.body.is_none());
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers.get("x-tenant").map(String::as_str), Some("acme"));

        config.data.method = Some("post".into());
        let request = remote(&config)
            .build_request(&LoadArgs::default(), "https://api.example.com", &Value::Null)
            .expect("request builds");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, Some(json!({ "q": 1 })));
    }

    #[test]
    fn resource_sources_target_submissions() {
        let config = ComponentConfig {
            data_src: DataSource::Resource,
            data: DataSettings {
                resource: Some("abc123".into()),
                ..DataSettings::default()
            },
            ..ComponentConfig::default()
        };
        let request = remote(&config)
            .build_request(&LoadArgs::default(), "https://api.example.com", &Value::Null)
            .expect("request builds");

        assert_eq!(request.url, "https://api.example.com/form/abc123/submission?limit=100&skip=0");
        assert!(!request.options.no_token);
    }

    #[test]
    fn inline_json_accepts_arrays_and_strings() {
        let mut config = ComponentConfig {
            data_src: DataSource::Json,
            ..ComponentConfig::default()
        };
        config.data.json = Some(json!("[{\"label\":\"A\",\"value\":\"a\"}]"));
        assert_eq!(OptionSource::from_config(&config), OptionSource::Inline(vec![json!({ "label": "A", "value": "a" })]));

        config.data.json = Some(json!("{not json"));
        assert_eq!(OptionSource::from_config(&config), OptionSource::Inline(Vec::new()));
    }
}
