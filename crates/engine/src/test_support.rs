//! Fetcher double shared by the engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use formchoice_api::{FetchError, FetchRequest, OptionFetcher};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(Value),
    Fail(String),
    Delayed(Duration, Value),
}

/// Replays scripted responses in order and records every request.
///
/// Once the script runs out every request answers with an empty list.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl OptionFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        let next = self.script.lock().expect("script lock").pop_front();
        match next.unwrap_or_else(|| Scripted::Ok(json!([]))) {
            Scripted::Ok(payload) => Ok(payload),
            Scripted::Fail(message) => Err(FetchError::Other(message)),
            Scripted::Delayed(delay, payload) => {
                tokio::time::sleep(delay).await;
                Ok(payload)
            }
        }
    }
}
