//! Option loading.
//!
//! [`OptionLoader`] owns the option list, the surrogate codec and the
//! readiness gate of one component. Inline sources are resolved when the
//! loader is built. Remote sources load in cycles: every
//! [`OptionLoader::trigger`] advances the gate and pushes into a debouncer,
//! and when the debounce window closes a single cycle runs with the last
//! supplied arguments. A cycle either reuses the loaded options, rebuilds
//! them from persisted metadata, or fetches them; whichever way it settles,
//! it resolves the gate generation that was live when it started.
//!
//! Requests are numbered as they start. A response older than the newest
//! applied one is dropped, so the latest request to complete wins.

mod debounce;
mod gate;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use gate::{GateStatus, GateTicket, ReadinessGate};

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use formchoice_api::{FetchError, FetchRequest, OptionFetcher, extract_collection_items};
use formchoice_types::{ChoiceOption, ComponentConfig, ValueEncoding, is_empty_value};
use formchoice_util::value_to_string;
use serde_json::Value;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::metadata::SharedMetadata;
use crate::options::{ItemMapper, MappedItems, OptionSource, ValueCodec};
use crate::settings::EngineSettings;

/// Arguments of one load cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadArgs {
    pub search: String,
    pub skip: u32,
}

impl LoadArgs {
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            skip: 0,
        }
    }
}

/// Component state a load cycle depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadContext {
    pub read_only: bool,
    /// Committed value of the component.
    pub data_value: Value,
    /// Submission data exposed to URL and header templates.
    pub form_data: Value,
}

impl LoadContext {
    fn value_is_empty(&self) -> bool {
        match &self.data_value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            other => is_empty_value(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// A remote source that has not completed a cycle yet.
    Idle,
    AwaitingLoad,
    Loaded,
    LoadError(LoadError),
}

#[derive(Debug)]
struct LoaderState {
    status: LoadStatus,
    options: Vec<ChoiceOption>,
    codec: ValueCodec,
    originals: HashMap<String, Value>,
    debouncer: Debouncer<LoadArgs>,
    timer_armed: bool,
    context: LoadContext,
    last_args: LoadArgs,
    requests_started: u64,
    latest_applied: u64,
    loaded_args: Option<LoadArgs>,
    force_reload: bool,
}

#[derive(Debug)]
struct LoaderInner {
    key: String,
    source: OptionSource,
    mapper: ItemMapper,
    fallback_select_data: Option<Value>,
    fetcher: Arc<dyn OptionFetcher>,
    metadata: SharedMetadata,
    base_url: String,
    gate: ReadinessGate,
    state: Mutex<LoaderState>,
}

enum CyclePlan {
    Reuse,
    FromMetadata { entries: Vec<Value>, args: LoadArgs },
    Fetch { sequence: u64, request: FetchRequest, args: LoadArgs },
    Failed(LoadError),
}

/// Loader handle; clones share one loader.
#[derive(Debug, Clone)]
pub struct OptionLoader {
    inner: Arc<LoaderInner>,
}

impl OptionLoader {
    pub fn new(
        config: &ComponentConfig,
        encoding: ValueEncoding,
        fetcher: Arc<dyn OptionFetcher>,
        metadata: SharedMetadata,
        settings: &EngineSettings,
    ) -> Self {
        let source = OptionSource::from_config(config);
        let mapper = ItemMapper::new(config, encoding);
        let gate = ReadinessGate::new();
        let mut codec = ValueCodec::new();
        let mut options = Vec::new();
        let mut originals = HashMap::new();

        let status = match &source {
            OptionSource::Static(values) => {
                codec.begin_generation();
                options = mapper.map_static(values, &mut codec);
                LoadStatus::Loaded
            }
            OptionSource::Inline(items) => {
                codec.begin_generation();
                let mapped = mapper.map(items, &mut codec);
                options = mapped.options;
                originals = mapped.originals;
                LoadStatus::Loaded
            }
            OptionSource::Remote(_) => LoadStatus::Idle,
            OptionSource::Unsupported(name) => {
                warn!(key = %config.key, data_src = %name, "unsupported option source");
                LoadStatus::LoadError(LoadError::UnsupportedSource(name.clone()))
            }
        };
        if !source.is_remote() {
            gate.resolve_current();
        }

        Self {
            inner: Arc::new(LoaderInner {
                key: config.key.clone(),
                source,
                mapper,
                fallback_select_data: config.select_data.clone(),
                fetcher,
                metadata,
                base_url: settings.base_url.clone(),
                gate,
                state: Mutex::new(LoaderState {
                    status,
                    options,
                    codec,
                    originals,
                    debouncer: Debouncer::new(settings.debounce),
                    timer_armed: false,
                    context: LoadContext::default(),
                    last_args: LoadArgs::default(),
                    requests_started: 0,
                    latest_applied: 0,
                    loaded_args: None,
                    force_reload: false,
                }),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn source(&self) -> &OptionSource {
        &self.inner.source
    }

    pub fn is_remote(&self) -> bool {
        self.inner.source.is_remote()
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.inner.gate
    }

    /// Start a load cycle.
    ///
    /// Resolves the pending gate generation, if any, and installs a new one
    /// whose ticket is returned. For remote sources the cycle runs once the
    /// debounce window closes; `None` reuses the last supplied arguments.
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self, args: Option<LoadArgs>) -> GateTicket {
        let ticket = self.inner.gate.advance();
        if !self.is_remote() {
            self.inner.gate.resolve(ticket);
            return ticket;
        }

        let spawn_timer = {
            let mut state = self.lock_state();
            state.debouncer.push(args, Instant::now());
            let spawn_timer = !state.timer_armed;
            state.timer_armed = true;
            spawn_timer
        };
        debug!(key = %self.inner.key, generation = ticket.generation(), "option load triggered");
        if spawn_timer {
            tokio::spawn(self.clone().run_debounce_timer());
        }
        ticket
    }

    /// Trigger a cycle that fetches even when the arguments are unchanged.
    pub fn refresh(&self) -> GateTicket {
        self.lock_state().force_reload = true;
        self.trigger(None)
    }

    /// Future completing once the generation named by `ticket` has resolved.
    pub fn wait(&self, ticket: GateTicket) -> impl Future<Output = ()> + Send + 'static {
        self.inner.gate.wait(ticket)
    }

    pub fn set_context(&self, context: LoadContext) {
        self.lock_state().context = context;
    }

    pub fn status(&self) -> LoadStatus {
        self.lock_state().status.clone()
    }

    /// Whether a cycle has settled, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self.lock_state().status, LoadStatus::Loaded | LoadStatus::LoadError(_))
    }

    pub fn error(&self) -> Option<LoadError> {
        match &self.lock_state().status {
            LoadStatus::LoadError(error) => Some(error.clone()),
            _ => None,
        }
    }

    pub fn options(&self) -> Vec<ChoiceOption> {
        self.lock_state().options.clone()
    }

    /// Generation of the current option list; changes whenever it is replaced.
    pub fn generation(&self) -> u64 {
        self.lock_state().codec.generation()
    }

    pub fn requests_started(&self) -> u64 {
        self.lock_state().requests_started
    }

    /// Run `f` against the current options and the codec that encoded them.
    pub fn with_options<R>(&self, f: impl FnOnce(&[ChoiceOption], &ValueCodec) -> R) -> R {
        let state = self.lock_state();
        f(&state.options, &state.codec)
    }

    pub fn with_codec<R>(&self, f: impl FnOnce(&ValueCodec) -> R) -> R {
        f(&self.lock_state().codec)
    }

    /// Original loaded item behind the option with element value `element_key`.
    pub fn original_item(&self, element_key: &str) -> Option<Value> {
        self.lock_state().originals.get(element_key).cloned()
    }

    /// Label rendered from an item with the component's template.
    pub fn render_label(&self, item: &Value) -> String {
        self.inner.mapper.render_label(item)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LoaderState> {
        self.inner.state.lock().expect("loader state lock")
    }

    async fn run_debounce_timer(self) {
        loop {
            let deadline = {
                let mut state = self.lock_state();
                let deadline = state.debouncer.deadline();
                if deadline.is_none() {
                    state.timer_armed = false;
                }
                deadline
            };
            let Some(deadline) = deadline else {
                return;
            };
            sleep_until(deadline).await;

            let fired = {
                let mut state = self.lock_state();
                let fired = state.debouncer.take_due(Instant::now());
                if fired.is_some() {
                    state.timer_armed = false;
                }
                fired
            };
            if let Some(args) = fired {
                self.run_cycle(args).await;
                return;
            }
        }
    }

    async fn run_cycle(&self, args: Option<LoadArgs>) {
        let ticket = self.inner.gate.current();
        let plan = self.prepare_cycle(args);
        match plan {
            CyclePlan::Reuse => {
                debug!(key = %self.inner.key, "options already loaded for these arguments");
            }
            CyclePlan::FromMetadata { entries, args } => self.load_from_metadata(entries, args),
            CyclePlan::Fetch { sequence, request, args } => {
                debug!(key = %self.inner.key, sequence, method = %request.method, url = %request.url, "fetching options");
                let result = self.inner.fetcher.fetch(&request).await;
                self.apply_fetch_result(sequence, args, result);
            }
            CyclePlan::Failed(error) => {
                warn!(key = %self.inner.key, error = %error, "option load failed");
                self.lock_state().status = LoadStatus::LoadError(error);
            }
        }
        if self.inner.gate.resolve(ticket) {
            debug!(key = %self.inner.key, generation = ticket.generation(), "readiness gate resolved");
        }
    }

    fn prepare_cycle(&self, args: Option<LoadArgs>) -> CyclePlan {
        let mut state = self.lock_state();
        let args = args.unwrap_or_else(|| state.last_args.clone());
        state.last_args = args.clone();

        if !state.force_reload && state.status == LoadStatus::Loaded && state.loaded_args.as_ref() == Some(&args) {
            return CyclePlan::Reuse;
        }
        state.force_reload = false;

        if state.context.read_only
            && state.context.value_is_empty()
            && let Some(entries) = self.inner.metadata.list_data(&self.inner.key)
        {
            return CyclePlan::FromMetadata { entries, args };
        }

        let OptionSource::Remote(remote) = &self.inner.source else {
            return CyclePlan::Reuse;
        };
        let request = match remote.build_request(&args, &self.inner.base_url, &state.context.form_data) {
            Ok(request) => request,
            Err(error) => return CyclePlan::Failed(error),
        };
        state.requests_started += 1;
        state.status = LoadStatus::AwaitingLoad;
        CyclePlan::Fetch {
            sequence: state.requests_started,
            request,
            args,
        }
    }

    fn apply_fetch_result(&self, sequence: u64, args: LoadArgs, result: Result<Value, FetchError>) {
        let list_data = {
            let mut state = self.lock_state();
            if sequence < state.latest_applied {
                debug!(key = %self.inner.key, sequence, latest = state.latest_applied, "dropping stale option response");
                return;
            }
            state.latest_applied = sequence;

            let payload = match result {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(key = %self.inner.key, error = %error, "option request failed");
                    state.status = LoadStatus::LoadError(LoadError::Fetch(error.to_string()));
                    return;
                }
            };
            let items = match &payload {
                Value::Null => Vec::new(),
                other => extract_collection_items(other).unwrap_or_else(|| {
                    warn!(key = %self.inner.key, "option response holds no item list");
                    Vec::new()
                }),
            };

            state.codec.begin_generation();
            let MappedItems {
                options,
                list_data,
                originals,
            } = self.inner.mapper.map(&items, &mut state.codec);
            info!(key = %self.inner.key, item_count = options.len(), generation = state.codec.generation(), "options loaded");
            state.options = options;
            state.originals = originals;
            state.status = LoadStatus::Loaded;
            state.loaded_args = Some(args);
            list_data
        };
        self.inner.metadata.set_list_data(&self.inner.key, list_data);
    }

    /// Rebuild options from persisted `listData` without a request.
    ///
    /// Only the entry matching the persisted selection gets a value; the
    /// others are label-only and flagged invalid.
    fn load_from_metadata(&self, entries: Vec<Value>, args: LoadArgs) {
        let select_data = self.inner.metadata.select_data(&self.inner.key).or_else(|| self.inner.fallback_select_data.clone());
        let selected_label = select_data.as_ref().map(|record| self.inner.mapper.render_label(record));

        let mut state = self.lock_state();
        let data_value = state.context.data_value.clone();
        let data_text = value_to_string(&data_value);
        let encoding = self.inner.mapper.encoding();
        state.codec.begin_generation();

        let mut options = Vec::with_capacity(entries.len());
        for entry in &entries {
            let label = entry.get("label").map(value_to_string).unwrap_or_else(|| value_to_string(entry));
            let matches_value = !data_text.is_empty() && entry.get("value").is_some_and(|value| value_to_string(value) == data_text);
            let matches_record = selected_label.as_deref() == Some(label.as_str());
            let option = if matches_value || matches_record {
                ChoiceOption::new(label, state.codec.encode(&data_value, encoding))
            } else {
                let mut option = ChoiceOption::new(label, Value::Null);
                option.invalid = true;
                option
            };
            options.push(option);
        }

        debug!(key = %self.inner.key, item_count = options.len(), "options rebuilt from metadata");
        state.options = options;
        state.originals = HashMap::new();
        state.status = LoadStatus::Loaded;
        state.loaded_args = Some(args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataStore, SubmissionMetadata};
    use crate::test_support::{Scripted, ScriptedFetcher};
    use formchoice_types::{DataSettings, DataSource, StaticValue};
    use serde_json::json;
    use std::time::Duration;

    fn url_config() -> ComponentConfig {
        ComponentConfig {
            key: "state".into(),
            data_src: DataSource::Url,
            data: DataSettings {
                url: "https://api.example.com/states?q={{ search }}".into(),
                ..DataSettings::default()
            },
            value_property: Some("value".into()),
            ..ComponentConfig::default()
        }
    }

    fn remote_loader(fetcher: &Arc<ScriptedFetcher>, metadata: &SubmissionMetadata) -> OptionLoader {
        OptionLoader::new(
            &url_config(),
            ValueEncoding::Scalar,
            fetcher.clone(),
            metadata.shared(),
            &EngineSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn triggers_within_the_window_coalesce_into_one_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Scripted::Ok(json!([{ "label": "Ohio", "value": "OH" }]))]));
        let loader = remote_loader(&fetcher, &SubmissionMetadata::new());

        loader.trigger(Some(LoadArgs::search("a")));
        tokio::time::advance(Duration::from_millis(30)).await;
        loader.trigger(Some(LoadArgs::search("ab")));
        tokio::time::advance(Duration::from_millis(30)).await;
        loader.trigger(None);
        tokio::time::advance(Duration::from_millis(30)).await;
        let ticket = loader.trigger(None);
        loader.wait(ticket).await;

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fetcher.requests()[0].url, "https://api.example.com/states?q=ab");
        assert_eq!(loader.status(), LoadStatus::Loaded);
        assert_eq!(loader.options(), vec![ChoiceOption::new("Ohio", json!("OH"))]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_generations_resolve_immediately() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Scripted::Ok(json!([]))]));
        let loader = remote_loader(&fetcher, &SubmissionMetadata::new());

        let first = loader.trigger(None);
        assert!(!loader.gate().is_resolved(first));
        let second = loader.trigger(None);
        assert!(loader.gate().is_resolved(first));
        assert!(!loader.gate().is_resolved(second));

        loader.wait(second).await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_loads_resolve_the_gate_and_keep_options() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Scripted::Ok(json!([{ "label": "Ohio", "value": "OH" }])),
            Scripted::Fail("connection reset".into()),
        ]));
        let loader = remote_loader(&fetcher, &SubmissionMetadata::new());

        loader.wait(loader.trigger(None)).await;
        let ticket = loader.refresh();
        loader.wait(ticket).await;

        assert!(matches!(loader.status(), LoadStatus::LoadError(LoadError::Fetch(_))));
        assert!(loader.is_settled());
        assert_eq!(loader.options().len(), 1);
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn late_responses_from_older_requests_are_dropped() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Scripted::Delayed(Duration::from_millis(500), json!([{ "label": "Old", "value": "old" }])),
            Scripted::Ok(json!([{ "label": "New", "value": "new" }])),
        ]));
        let loader = remote_loader(&fetcher, &SubmissionMetadata::new());

        loader.trigger(Some(LoadArgs::search("o")));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fetcher.call_count(), 1, "first request is in flight");

        let ticket = loader.trigger(Some(LoadArgs::search("n")));
        loader.wait(ticket).await;
        assert_eq!(loader.options()[0].label, "New");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(loader.options()[0].label, "New");
        assert_eq!(loader.requests_started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_arguments_reuse_loaded_options_until_refreshed() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Scripted::Ok(json!([])), Scripted::Ok(json!([]))]));
        let loader = remote_loader(&fetcher, &SubmissionMetadata::new());

        loader.wait(loader.trigger(None)).await;
        loader.wait(loader.trigger(None)).await;
        assert_eq!(fetcher.call_count(), 1);

        loader.wait(loader.refresh()).await;
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn structured_values_are_surrogated_and_persisted() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Scripted::Ok(json!({
            "results": [{ "label": "X", "value": { "id": 1 } }]
        }))]));
        let metadata = SubmissionMetadata::new();
        let loader = remote_loader(&fetcher, &metadata);

        loader.wait(loader.trigger(None)).await;

        let options = loader.options();
        let key = options[0].value.as_str().expect("surrogate key").to_string();
        assert_eq!(loader.with_codec(|codec| codec.decode(&key)), json!({ "id": 1 }));
        assert_eq!(loader.original_item(&key), Some(json!({ "label": "X", "value": { "id": 1 } })));
        assert_eq!(metadata.list_data("state"), Some(vec![json!({ "label": "X" })]));
    }

    #[tokio::test(start_paused = true)]
    async fn read_only_empty_components_rebuild_from_metadata() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let metadata = SubmissionMetadata::from_value(json!({
            "listData": { "state": [{ "label": "Ohio", "value": "OH" }, { "label": "Utah", "value": "UT" }] },
            "selectData": { "state": { "label": "Utah", "value": "UT" } }
        }));
        let loader = remote_loader(&fetcher, &metadata);
        loader.set_context(LoadContext {
            read_only: true,
            data_value: json!(""),
            form_data: Value::Null,
        });

        loader.wait(loader.trigger(None)).await;

        assert_eq!(fetcher.call_count(), 0);
        let options = loader.options();
        assert_eq!(options.len(), 2);
        assert!(options[0].invalid);
        assert_eq!(options[1].label, "Utah");
        assert!(!options[1].invalid);
        assert_eq!(loader.status(), LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn inline_sources_are_ready_at_construction() {
        let config = ComponentConfig {
            values: vec![StaticValue::new("A", "a"), StaticValue::new("B", "b")],
            ..ComponentConfig::default()
        };
        let fetcher = Arc::new(ScriptedFetcher::default());
        let loader = OptionLoader::new(
            &config,
            ValueEncoding::Scalar,
            fetcher.clone(),
            SubmissionMetadata::new().shared(),
            &EngineSettings::default(),
        );

        assert!(loader.gate().is_open());
        assert_eq!(loader.status(), LoadStatus::Loaded);
        let ticket = loader.trigger(None);
        assert!(loader.gate().is_resolved(ticket));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_sources_settle_with_an_error() {
        let config = ComponentConfig {
            data_src: DataSource::Custom("custom".into()),
            ..ComponentConfig::default()
        };
        let loader = OptionLoader::new(
            &config,
            ValueEncoding::Scalar,
            Arc::new(ScriptedFetcher::default()),
            SubmissionMetadata::new().shared(),
            &EngineSettings::default(),
        );
        assert!(loader.gate().is_open());
        assert_eq!(loader.error(), Some(LoadError::UnsupportedSource("custom".into())));
    }
}
