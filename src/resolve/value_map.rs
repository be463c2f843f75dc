use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Raw stored values
// ============================================================================

/// A stored datum exactly as the data source delivered it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Arrays/objects are carried through and stringified on use.
    Other(serde_json::Value),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// Render a number the way a browser's `String(n)` does for the common
/// cases: integral values carry no fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        // f64 `Display` is already shortest round-trip without a trailing `.0`.
        n.to_string()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Number(n) => f.write_str(&format_number(*n)),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Other(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// Value map
// ============================================================================

/// One stored datum available for autofill, reachable under up to three aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueMapEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: RawValue,
}

impl ValueMapEntry {
    pub fn new(key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Lower-cased alias → entry lookup that remembers insertion order.
///
/// Iteration order is the order in which aliases were first inserted;
/// re-inserting an alias replaces its entry in place. Partial matching in
/// the resolver walks this order, so ties go to the earliest alias.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    slots: Vec<(String, Arc<ValueMapEntry>)>,
    index: HashMap<String, usize>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ValueMapEntry>) -> Self {
        let mut map = Self::new();
        for entry in entries {
            map.register(entry);
        }
        map
    }

    /// Register an entry under its key, then its name and label when they
    /// differ from the aliases already used. Empty aliases are ignored.
    pub fn register(&mut self, entry: ValueMapEntry) {
        let entry = Arc::new(entry);

        if !entry.key.is_empty() {
            self.insert_shared(&entry.key, Arc::clone(&entry));
        }
        if !entry.name.is_empty() && entry.name != entry.key {
            self.insert_shared(&entry.name, Arc::clone(&entry));
        }
        if !entry.label.is_empty() && entry.label != entry.key && entry.label != entry.name {
            self.insert_shared(&entry.label, Arc::clone(&entry));
        }
    }

    pub fn insert(&mut self, alias: &str, entry: ValueMapEntry) {
        self.insert_shared(alias, Arc::new(entry));
    }

    fn insert_shared(&mut self, alias: &str, entry: Arc<ValueMapEntry>) {
        // An empty alias would be contained in every label.
        if alias.is_empty() {
            return;
        }
        let alias = alias.to_lowercase();
        match self.index.get(&alias) {
            Some(&slot) => self.slots[slot].1 = entry,
            None => {
                self.index.insert(alias.clone(), self.slots.len());
                self.slots.push((alias, entry));
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, alias: &str) -> Option<&ValueMapEntry> {
        self.index
            .get(&alias.to_lowercase())
            .map(|&slot| self.slots[slot].1.as_ref())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.index.contains_key(&alias.to_lowercase())
    }

    /// Aliases and entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueMapEntry)> {
        self.slots.iter().map(|(alias, entry)| (alias.as_str(), entry.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }
}
