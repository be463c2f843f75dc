use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::FormMasterError;
use crate::resolve::resolver::FieldIdentity;
use crate::resolve::value_map::RawValue;

/// Nested user profile (`personal.email`, `address.city`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(Value);

impl UserProfile {
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    pub fn from_file(path: &str) -> Result<Self, FormMasterError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormMasterError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| FormMasterError::JsonParse {
            context: path.to_string(),
            source,
        })
    }

    /// Value at a dot path. Missing segments, nulls and empty strings all
    /// count as absent.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for part in path.split('.') {
            current = current.as_object()?.get(part)?;
        }
        match current {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Bool(false) => None,
            other => Some(other),
        }
    }

    /// Stored text at a dot path, rendered as a string.
    pub fn field_text(&self, path: &str) -> Option<String> {
        self.field(path).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value at a dot path, creating intermediate objects and
    /// replacing non-object intermediates.
    pub fn set_field(&mut self, path: &str, value: Value) {
        let parts: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        let mut current = &mut self.0;
        for part in parents {
            let Value::Object(map) = current else {
                return;
            };
            let slot = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = slot;
        }
        if let Value::Object(map) = current {
            map.insert(last.to_string(), value);
        }
    }

    /// `personal.email`, used by email coercion.
    pub fn email(&self) -> Option<String> {
        self.field_text("personal.email")
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

// ============================================================================
// Pattern fallback
// ============================================================================

/// Identifier pattern → profile path table, in priority order.
const STANDARD_PATTERNS: &[(&str, &str)] = &[
    (r"first.?name|fname|given.?name", "personal.firstName"),
    (r"last.?name|lname|surname|family.?name", "personal.lastName"),
    (r"full.?name|name", "personal.fullName"),
    (r"email|e.?mail|mail", "personal.email"),
    (r"phone|mobile|cell", "personal.phone"),
    (r"birth|dob|birthday", "personal.dateOfBirth"),
    (r"gender|sex", "personal.gender"),
    (r"address|street", "address.street"),
    (r"city|town|locality", "address.city"),
    (r"state|province|region", "address.state"),
    (r"zip|postal|post.?code", "address.postalCode"),
    (r"country", "address.country"),
    (r"cc.?name|card.?name|name.?on.?card", "payment.cardholderName"),
    (r"username|user|login", "credentials.username"),
];

#[derive(Debug, Clone)]
pub struct ProfilePattern {
    pub pattern: Regex,
    pub path: String,
}

/// Match produced by [`ProfilePatterns::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMatch {
    pub path: String,
    pub identifier: String,
    pub value: RawValue,
}

/// Last-resort lookup used when neither a mapping nor the value map
/// produced a value: the control's id, name, label and placeholder are
/// tested, in that order, against every pattern; the first pattern with a
/// non-empty profile value wins.
#[derive(Debug, Clone)]
pub struct ProfilePatterns {
    patterns: Vec<ProfilePattern>,
}

impl Default for ProfilePatterns {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProfilePatterns {
    pub fn standard() -> Self {
        let patterns = STANDARD_PATTERNS
            .iter()
            .filter_map(|(pattern, path)| match Regex::new(&format!("(?i){pattern}")) {
                Ok(pattern) => Some(ProfilePattern {
                    pattern,
                    path: path.to_string(),
                }),
                Err(e) => {
                    warn!(pattern, error = %e, "skipping profile pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn lookup(&self, identity: &FieldIdentity, profile: &UserProfile) -> Option<ProfileMatch> {
        let identifiers = [
            &identity.id,
            &identity.name,
            &identity.label,
            &identity.placeholder,
        ];

        for identifier in identifiers.into_iter().filter(|i| !i.is_empty()) {
            let identifier = identifier.to_lowercase();
            for entry in &self.patterns {
                if !entry.pattern.is_match(&identifier) {
                    continue;
                }
                if let Some(value) = profile.field(&entry.path) {
                    return Some(ProfileMatch {
                        path: entry.path.clone(),
                        identifier,
                        value: raw_from_json(value),
                    });
                }
            }
        }
        None
    }
}

fn raw_from_json(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(*b),
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or_else(|| RawValue::Other(value.clone())),
        Value::String(s) => RawValue::Text(s.clone()),
        other => RawValue::Other(other.clone()),
    }
}
