use std::fmt;
use std::marker::PhantomData;

use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FormMasterError, MappingError};
use crate::resolve::value_map::RawValue;

// ============================================================================
// Mapping rules
// ============================================================================

/// User-authored override for one field: a literal string or a rule that
/// derives the value from the loaded data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMapping {
    Direct(String),
    Rule(MappingRule),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MappingRule {
    /// Zero-based cell of a table in the data document.
    Table { table: usize, row: usize, col: usize },
    /// First capture group (or whole match) of `pattern` over `source`.
    Regex {
        pattern: String,
        #[serde(default)]
        source: RegexSource,
    },
    Constant { value: RawValue },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegexSource {
    #[default]
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "fileName")]
    FileName,
}

/// Data a mapping rule reads from (a converted DOCX or JSON file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataDocument {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,
    #[serde(default, rename = "fileName")]
    pub file_name: String,
}

impl DataDocument {
    pub fn from_json_file(path: &str) -> Result<Self, FormMasterError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormMasterError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| FormMasterError::JsonParse {
            context: path.to_string(),
            source,
        })
    }
}

impl FieldMapping {
    /// Evaluate the mapping. `Ok(None)` means the rule found nothing
    /// (missing data, cell out of range, no regex match).
    pub fn evaluate(&self, data: Option<&DataDocument>) -> Result<Option<RawValue>, MappingError> {
        match self {
            FieldMapping::Direct(value) => Ok(Some(RawValue::Text(value.clone()))),
            FieldMapping::Rule(MappingRule::Constant { value }) => Ok(Some(value.clone())),
            FieldMapping::Rule(MappingRule::Table { table, row, col }) => Ok(data
                .and_then(|d| d.tables.get(*table))
                .and_then(|t| t.get(*row))
                .and_then(|r| r.get(*col))
                .map(|cell| RawValue::Text(cell.clone()))),
            FieldMapping::Rule(MappingRule::Regex { pattern, source }) => {
                let regex = Regex::new(pattern).map_err(|source| MappingError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                let Some(data) = data else {
                    return Ok(None);
                };
                let haystack = match source {
                    RegexSource::Text => &data.text,
                    RegexSource::FileName => &data.file_name,
                };
                Ok(regex.captures(haystack).map(|caps| {
                    let found = caps.get(1).or_else(|| caps.get(0));
                    RawValue::Text(found.map(|m| m.as_str().to_string()).unwrap_or_default())
                }))
            }
        }
    }
}

// ============================================================================
// Ordered maps (JSON/YAML object order is significant for URL fallback)
// ============================================================================

/// String-keyed map that keeps the order keys appeared in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = OrderedMap::default();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    out.insert(key, value);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

// ============================================================================
// Per-site mapping sets
// ============================================================================

/// Field id (or label) → mapping, for one site.
pub type MappingSet = OrderedMap<FieldMapping>;

impl MappingSet {
    /// Mapping for a control: by id (name when id is empty), then by label.
    pub fn for_field(&self, field_key: &str, label: Option<&str>) -> Option<&FieldMapping> {
        let by_key = Some(field_key)
            .filter(|k| !k.is_empty())
            .and_then(|k| self.get(k));
        by_key.or_else(|| label.filter(|l| !l.is_empty()).and_then(|l| self.get(l)))
    }
}

/// Mapping sets keyed by page origin (or URL / URL fragment).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteMappings {
    sites: OrderedMap<MappingSet>,
}

impl SiteMappings {
    pub fn insert(&mut self, site: impl Into<String>, set: MappingSet) {
        self.sites.insert(site, set);
    }

    /// Mapping set for a page: exact URL, then origin, then the first key
    /// contained in the URL (file order), then `default`.
    pub fn for_url(&self, page_url: &str) -> Option<&MappingSet> {
        if let Some(set) = self.sites.get(page_url) {
            return Some(set);
        }

        if let Ok(parsed) = Url::parse(page_url) {
            if let Some(set) = self.sites.get(&origin_of(&parsed)) {
                return Some(set);
            }
        }

        self.sites
            .iter()
            .find(|(key, _)| *key != "default" && !key.is_empty() && page_url.contains(key))
            .map(|(_, set)| set)
            .or_else(|| self.sites.get("default"))
    }

    pub fn from_file(path: &str) -> Result<Self, FormMasterError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormMasterError::Io {
            path: path.to_string(),
            source,
        })?;

        let parsed = if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(&content).map_err(|e| MappingError::Malformed {
                context: path.to_string(),
                reason: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| MappingError::Malformed {
                context: path.to_string(),
                reason: e.to_string(),
            })?
        };
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings_deserialize_every_shape() {
        let set: MappingSet = serde_json::from_str(
            r#"{
                "first": "Ada",
                "cell": {"type": "table", "table": 0, "row": 1, "col": 2},
                "ref": {"type": "regex", "pattern": "Ref: (\\w+)"},
                "flag": {"type": "constant", "value": true}
            }"#,
        )
        .unwrap();

        assert_eq!(set.get("first"), Some(&FieldMapping::Direct("Ada".into())));
        assert_eq!(
            set.get("cell"),
            Some(&FieldMapping::Rule(MappingRule::Table { table: 0, row: 1, col: 2 }))
        );
        assert_eq!(
            set.get("ref"),
            Some(&FieldMapping::Rule(MappingRule::Regex {
                pattern: "Ref: (\\w+)".into(),
                source: RegexSource::Text,
            }))
        );
        assert_eq!(
            set.get("flag"),
            Some(&FieldMapping::Rule(MappingRule::Constant { value: RawValue::Bool(true) }))
        );
    }

    #[test]
    fn ordered_map_keeps_file_order() {
        let set: OrderedMap<String> = serde_json::from_str(r#"{"z": "1", "a": "2", "m": "3"}"#).unwrap();
        let keys: Vec<_> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
