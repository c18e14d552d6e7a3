//! Per-event substitution context.
//!
//! This module provides the [`EventContext`] struct, the mapping from placeholder
//! identifiers to display values that is merged into alert templates.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Placeholder values for a single event.
///
/// Values are already formatted for display (`"2.3km"`, `"14:32:05"`), the resolver
/// inserts them verbatim. A context is built by the caller for one dispatch and only
/// read afterwards.
///
/// # Examples
///
/// ```
/// # use pokefeed::alarm::EventContext;
/// let context = EventContext::new()
///     .with("pkmn", "Snorlax")
///     .with("id", "143");
/// assert_eq!(context.get("pkmn"), Some("Snorlax"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, Value>")]
pub struct EventContext {
    /// Display value of each placeholder identifier
    values: HashMap<String, String>,
}

impl EventContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        EventContext::default()
    }

    /// Returns the context with `identifier` set to `value`.
    pub fn with(mut self, identifier: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(identifier, value);
        self
    }

    /// Sets `identifier` to `value`, replacing any previous value.
    pub fn insert(&mut self, identifier: impl Into<String>, value: impl Into<String>) {
        self.values.insert(identifier.into(), value.into());
    }

    /// Returns the display value of `identifier`, if present.
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.values.get(identifier).map(String::as_str)
    }

    /// Whether `identifier` has a value in this context.
    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    /// Number of placeholder values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EventContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(identifier, value)| (identifier.into(), value.into()))
            .collect();
        EventContext { values }
    }
}

/// Event producers are loose about types (`"id": 143`), so every scalar is accepted
/// and rendered as text. `null` means the value is unknown and the placeholder stays
/// unresolved.
impl From<HashMap<String, Value>> for EventContext {
    fn from(raw: HashMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(identifier, value)| match value {
                Value::Null => None,
                Value::String(text) => Some((identifier, text)),
                other => Some((identifier, other.to_string())),
            })
            .collect()
    }
}
