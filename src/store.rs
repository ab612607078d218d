//! The field value store: current values, validation errors and touched
//! flags for every field key in the active form.
//!
//! The store is deliberately ignorant of the schema tree. Setting a value
//! never validates — validation is an explicit pass at section submission,
//! keeping edit latency independent of validation cost.

use serde_json::Value;
use std::collections::HashMap;

/// One field's runtime state. Entries are created lazily on first write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldState {
    pub value: Value,
    pub error: Option<String>,
    pub touched: bool,
}

/// Read access to current field values. Implemented by [`FieldStore`] and
/// by plain maps so the resolver and validator stay pure and testable.
pub trait ValueLookup {
    /// The stored value for `key`, if an entry exists.
    fn lookup(&self, key: &str) -> Option<&Value>;

    /// The current value for `key`, with `Null` standing in for "never
    /// written".
    fn current(&self, key: &str) -> &Value {
        self.lookup(key).unwrap_or(&Value::Null)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FieldStore {
    entries: HashMap<String, FieldState>,
}

impl FieldStore {
    pub fn new() -> Self {
        FieldStore::default()
    }

    /// The current value for `key`; the empty default when unset.
    pub fn value(&self, key: &str) -> &Value {
        self.entries.get(key).map(|e| &e.value).unwrap_or(&Value::Null)
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|e| e.error.as_deref())
    }

    pub fn is_touched(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.touched)
    }

    /// True when the field has ever been written (even with null).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Write a value. Any existing error for the key is cleared: edits
    /// optimistically clear errors, which reappear only on the next
    /// explicit validation pass.
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        let entry = self.entries.entry(key.into()).or_default();
        entry.value = value;
        entry.error = None;
    }

    pub fn set_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        let entry = self.entries.entry(key.into()).or_default();
        entry.error = Some(message.into());
    }

    pub fn set_touched(&mut self, key: impl Into<String>) {
        self.entries.entry(key.into()).or_default().touched = true;
    }

    /// Bulk merge, used for pre-filling from a previous workflow stage.
    /// Existing errors and touched flags are left alone.
    pub fn set_many(&mut self, values: impl IntoIterator<Item = (String, Value)>) {
        for (key, value) in values {
            self.entries.entry(key).or_default().value = value;
        }
    }

    /// Delete value, error and touched state for exactly the given keys.
    /// Used when a section collapses or dependent fields unmount, so stale
    /// values do not leak into a later save.
    pub fn reset_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        for key in keys {
            self.entries.remove(key);
        }
    }

    pub fn reset_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All current (key, value) pairs.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), &e.value))
    }
}

impl ValueLookup for FieldStore {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|e| &e.value)
    }
}

impl ValueLookup for HashMap<String, Value> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl ValueLookup for serde_json::Map<String, Value> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}
