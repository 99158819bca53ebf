//! Persisted option metadata shared with the surrounding submission.
//!
//! Two projections are stored per component path: `listData`, the resolved
//! option list, and `selectData`, the original item behind the selected
//! option. Writes only ever replace the subtree at the component's own path.

use std::fmt;
use std::sync::{Arc, Mutex};

use formchoice_util::{get_path, set_path};
use serde_json::{Map, Value};

const LIST_DATA: &str = "listData";
const SELECT_DATA: &str = "selectData";

/// Path-keyed store for option metadata.
pub trait MetadataStore: Send + Sync + fmt::Debug {
    fn list_data(&self, path: &str) -> Option<Vec<Value>>;
    fn select_data(&self, path: &str) -> Option<Value>;
    fn set_list_data(&self, path: &str, entries: Vec<Value>);
    fn set_select_data(&self, path: &str, record: Value);
}

pub type SharedMetadata = Arc<dyn MetadataStore>;

/// In-memory submission metadata document.
#[derive(Debug, Clone, Default)]
pub struct SubmissionMetadata {
    document: Arc<Mutex<Value>>,
}

impl SubmissionMetadata {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Wrap an existing metadata document, e.g. one loaded with a submission.
    pub fn from_value(document: Value) -> Self {
        let document = if document.is_object() { document } else { Value::Object(Map::new()) };
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    pub fn snapshot(&self) -> Value {
        self.document.lock().expect("metadata lock").clone()
    }

    pub fn shared(&self) -> SharedMetadata {
        Arc::new(self.clone())
    }

    fn read(&self, section: &str, path: &str) -> Option<Value> {
        let document = self.document.lock().expect("metadata lock");
        get_path(&document, &format!("{section}.{path}")).filter(|value| !value.is_null()).cloned()
    }

    fn write(&self, section: &str, path: &str, value: Value) {
        let mut document = self.document.lock().expect("metadata lock");
        set_path(&mut document, &format!("{section}.{path}"), value);
    }
}

impl MetadataStore for SubmissionMetadata {
    fn list_data(&self, path: &str) -> Option<Vec<Value>> {
        match self.read(LIST_DATA, path)? {
            Value::Array(entries) => Some(entries),
            _ => None,
        }
    }

    fn select_data(&self, path: &str) -> Option<Value> {
        self.read(SELECT_DATA, path)
    }

    fn set_list_data(&self, path: &str, entries: Vec<Value>) {
        self.write(LIST_DATA, path, Value::Array(entries));
    }

    fn set_select_data(&self, path: &str, record: Value) {
        self.write(SELECT_DATA, path, record);
    }
}
