//! State store — run-local variable bindings written by tool results.
//!
//! The store maps a string key to the last tool-produced value under that
//! key. It exists so a tool can hand a large result (a query result set) to a
//! later step by name instead of round-tripping it through the prompt.
//!
//! Substitution is a deliberately narrow indirection mechanism, not a
//! templating engine: only whole-string equality against a key triggers a
//! lookup. Argument maps are substituted value-by-value at the top level;
//! non-string leaves always pass through unchanged.

use std::collections::HashMap;

use serde_json::Value;

/// Mutable mapping from variable name to last-known value.
///
/// Single-writer: owned by one agent run, written only by the loop as a side
/// effect of tool results. Never shared across runs.
#[derive(Debug, Default)]
pub struct StateStore {
    values: HashMap<String, Value>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with initial bindings.
    pub fn with_values(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// Bind `key` to `value`, replacing any previous binding.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` is currently bound.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Substitute state values into tool-call arguments.
    ///
    /// - For an object, each top-level **string** value that exactly equals a
    ///   bound key is replaced by the stored value; everything else is kept.
    /// - For a bare string argument, the whole string must equal a key.
    /// - Any other shape passes through unchanged.
    pub fn substitute_arguments(&self, arguments: &Value) -> Value {
        match arguments {
            Value::Object(map) => {
                let substituted = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v)))
                    .collect();
                Value::Object(substituted)
            }
            Value::String(_) => self.resolve(arguments),
            other => other.clone(),
        }
    }

    /// Resolve a single value: a string that exactly names a bound key yields
    /// the stored value, anything else is returned as-is.
    pub fn resolve(&self, value: &Value) -> Value {
        if let Value::String(s) = value {
            if let Some(stored) = self.values.get(s) {
                return stored.clone();
            }
        }
        value.clone()
    }
}
