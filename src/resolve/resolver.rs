use serde::Serialize;

use crate::resolve::value_map::{ValueMap, ValueMapEntry};

/// Identity attributes of a control as seen by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldIdentity {
    pub id: String,
    pub name: String,
    pub aria_label: String,
    /// Resolved label text; empty when the control has no label.
    pub label: String,
    pub placeholder: String,
}

impl FieldIdentity {
    /// Controls worth a diagnostic when they go unmatched.
    pub fn is_addressable(&self) -> bool {
        !self.id.is_empty() || !self.name.is_empty()
    }
}

/// Waterfall step that produced a match, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    Id,
    Name,
    AriaLabel,
    Label,
    LabelNoSpaces,
    PartialLabel,
    Placeholder,
    PartialPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub entry: &'a ValueMapEntry,
    pub strategy: MatchStrategy,
    /// The map alias that matched.
    pub matched_key: String,
}

/// Maps a control identity onto the value map with an ordered waterfall;
/// the first step that matches wins:
///
/// 1. exact id, 2. exact name, 3. exact aria-label,
/// 4. exact label, 5. label with whitespace stripped,
/// 6. partial label (either string contains the other),
/// 7. exact placeholder, 8. partial placeholder.
///
/// All comparisons are case-insensitive. Partial steps walk the map in
/// insertion order and take the first qualifying alias, so the outcome of a
/// tie depends on how the map was built.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    map: &'a ValueMap,
}

impl<'a> FieldResolver<'a> {
    pub fn new(map: &'a ValueMap) -> Self {
        Self { map }
    }

    /// Pure lookup; `None` is the normal "no match" outcome.
    pub fn resolve(&self, identity: &FieldIdentity) -> Option<Resolution<'a>> {
        self.exact(&identity.id, MatchStrategy::Id)
            .or_else(|| self.exact(&identity.name, MatchStrategy::Name))
            .or_else(|| self.exact(&identity.aria_label, MatchStrategy::AriaLabel))
            .or_else(|| self.by_text(&identity.label, TextSteps::LABEL))
            .or_else(|| self.by_text(&identity.placeholder, TextSteps::PLACEHOLDER))
    }

    fn exact(&self, raw: &str, strategy: MatchStrategy) -> Option<Resolution<'a>> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let entry = self.map.get(&needle)?;
        Some(Resolution {
            entry,
            strategy,
            matched_key: needle,
        })
    }

    fn by_text(&self, raw: &str, steps: TextSteps) -> Option<Resolution<'a>> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        if let Some(found) = self.exact(&text, steps.exact) {
            return Some(found);
        }

        if let Some(strategy) = steps.no_spaces {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            if let Some(found) = self.exact(&compact, strategy) {
                return Some(found);
            }
        }

        self.map
            .iter()
            .find(|(key, _)| text.contains(key) || key.contains(text.as_str()))
            .map(|(key, entry)| Resolution {
                entry,
                strategy: steps.partial,
                matched_key: key.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct TextSteps {
    exact: MatchStrategy,
    no_spaces: Option<MatchStrategy>,
    partial: MatchStrategy,
}

impl TextSteps {
    const LABEL: TextSteps = TextSteps {
        exact: MatchStrategy::Label,
        no_spaces: Some(MatchStrategy::LabelNoSpaces),
        partial: MatchStrategy::PartialLabel,
    };

    const PLACEHOLDER: TextSteps = TextSteps {
        exact: MatchStrategy::Placeholder,
        no_spaces: None,
        partial: MatchStrategy::PartialPlaceholder,
    };
}
