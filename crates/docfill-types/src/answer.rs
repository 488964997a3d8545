//! Client-submitted answers.
//!
//! An `AnswerSet` is the bag of key/value pairs collected by one intake. Keys
//! are free-form (whatever the intake form builder chose) and are kept in
//! declaration order, which the mapper relies on for tie-breaking.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single client answer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAnswer {
    pub key: String,
    pub value: Value,
}

impl FieldAnswer {
    /// The value as display text, or `None` when it counts as absent.
    pub fn display_value(&self) -> Option<String> {
        display_value(&self.value)
    }
}

/// Ordered collection of client answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet {
    entries: Vec<FieldAnswer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an answer. A replaced answer keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.value = value,
            None => self.entries.push(FieldAnswer { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Answers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldAnswer> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl Serialize for AnswerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}

struct AnswerSetVisitor;

impl<'de> Visitor<'de> for AnswerSetVisitor {
    type Value = AnswerSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of answer keys to values")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<AnswerSet, M::Error> {
        let mut set = AnswerSet::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            set.insert(key, value);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AnswerSetVisitor)
    }
}

/// Coerce an answer value to display text.
///
/// - `null`, and strings that are empty after trimming, are absent.
/// - Numbers use their JSON text; booleans become `Yes` / `No`.
/// - Arrays join their displayable elements with `", "`; an array with no
///   displayable element is absent.
/// - Objects are absent rather than serialized, so structure never leaks
///   into prose.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_array())
                .filter_map(display_value)
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(_) => None,
    }
}
