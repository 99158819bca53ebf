//! Surrogate-key codec for option values.
//!
//! Single-choice inputs can only carry strings. Any other option value is
//! replaced by a freshly issued key and the original is kept in a registry
//! scoped to the current load generation. Starting a new generation drops the
//! previous registry, so keys issued for an older option list stop resolving.

use std::collections::HashMap;

use formchoice_types::ValueEncoding;
use serde_json::Value;
use tracing::{trace, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct ValueCodec {
    generation: u64,
    registry: HashMap<String, Value>,
}

impl ValueCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop every key of the current generation and start the next one.
    pub fn begin_generation(&mut self) -> u64 {
        trace!(generation = self.generation, dropped = self.registry.len(), "surrogate generation closed");
        self.generation += 1;
        self.registry = HashMap::new();
        self.generation
    }

    /// Element value carrying `raw` through an input using `encoding`.
    ///
    /// Strings pass through unchanged. Under [`ValueEncoding::Scalar`] every
    /// other value is registered under a new surrogate key; under
    /// [`ValueEncoding::Structured`] the value is carried as is.
    pub fn encode(&mut self, raw: &Value, encoding: ValueEncoding) -> Value {
        if let Value::String(text) = raw {
            if self.registry.contains_key(text) {
                warn!(value = %text, generation = self.generation, "option value collides with an issued surrogate key");
            }
            return raw.clone();
        }
        if encoding == ValueEncoding::Structured {
            return raw.clone();
        }

        let key = self.issue_key();
        self.registry.insert(key.clone(), raw.clone());
        Value::String(key)
    }

    /// Original value behind `element`, or `element` itself when it is not a
    /// key of the current generation.
    pub fn decode(&self, element: &str) -> Value {
        self.registry
            .get(element)
            .cloned()
            .unwrap_or_else(|| Value::String(element.to_string()))
    }

    /// [`ValueCodec::decode`] for element values that may already be structured.
    pub fn decode_value(&self, element: &Value) -> Value {
        match element {
            Value::String(text) => self.decode(text),
            other => other.clone(),
        }
    }

    pub fn is_surrogate(&self, element: &str) -> bool {
        self.registry.contains_key(element)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn issue_key(&self) -> String {
        loop {
            let key = Uuid::new_v4().to_string();
            if !self.registry.contains_key(&key) {
                return key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_values_round_trip_through_surrogates() {
        let mut codec = ValueCodec::new();
        for raw in [json!({ "id": 1 }), json!(true), json!(3), json!(null), json!([1, 2])] {
            let element = codec.encode(&raw, ValueEncoding::Scalar);
            let Value::String(key) = &element else {
                panic!("surrogate must be a string");
            };
            assert!(codec.is_surrogate(key));
            assert_eq!(codec.decode(key), raw);
        }
        assert_eq!(codec.len(), 5);
    }

    #[test]
    fn strings_pass_through() {
        let mut codec = ValueCodec::new();
        assert_eq!(codec.encode(&json!("abc"), ValueEncoding::Scalar), json!("abc"));
        assert_eq!(codec.decode("abc"), json!("abc"));
        assert!(codec.is_empty());
    }

    #[test]
    fn structured_encoding_keeps_raw_values() {
        let mut codec = ValueCodec::new();
        assert_eq!(codec.encode(&json!({ "id": 1 }), ValueEncoding::Structured), json!({ "id": 1 }));
        assert!(codec.is_empty());
        assert_eq!(codec.decode_value(&json!({ "id": 1 })), json!({ "id": 1 }));
    }

    #[test]
    fn keys_from_a_previous_generation_stop_resolving() {
        let mut codec = ValueCodec::new();
        let element = codec.encode(&json!({ "id": 1 }), ValueEncoding::Scalar);
        let key = element.as_str().expect("string key").to_string();

        assert_eq!(codec.begin_generation(), 1);
        assert!(!codec.is_surrogate(&key));
        assert_eq!(codec.decode(&key), Value::String(key));
    }

    #[test]
    fn issued_keys_are_unique() {
        let mut codec = ValueCodec::new();
        let first = codec.encode(&json!(1), ValueEncoding::Scalar);
        let second = codec.encode(&json!(1), ValueEncoding::Scalar);
        assert_ne!(first, second);
    }
}
