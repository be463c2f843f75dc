use tracing::{debug, info};

use crate::bridge::source::{BridgeError, ValueSource};
use crate::dom::accessor::{ElementMutator, NodeId};
use crate::fill::apply::apply_fill;
use crate::fill::plan::{FillOutcome, FillPlanner, FillReport, PlannedField};
use crate::form::control_model::ExtractedControls;
use crate::resolve::mapping::{DataDocument, MappingSet, SiteMappings};
use crate::resolve::profile::{ProfilePatterns, UserProfile};
use crate::resolve::value_map::{ValueMap, ValueMapEntry};

/// Attribute marking elements injected next to filled controls.
pub const INDICATOR_ATTR: &str = "data-formmaster-indicator";

/// State for one page: the value map plus the optional profile, site
/// mappings and data document, built once and passed to each fill pass.
///
/// Re-initialising replaces the value map wholesale and re-annotating
/// removes earlier indicators first, so repeated passes never stack state.
pub struct PageSession {
    url: String,
    values: ValueMap,
    profile: Option<UserProfile>,
    mappings: SiteMappings,
    data: Option<DataDocument>,
    patterns: ProfilePatterns,
    profile_fallback: bool,
}

impl PageSession {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            values: ValueMap::new(),
            profile: None,
            mappings: SiteMappings::default(),
            data: None,
            patterns: ProfilePatterns::standard(),
            profile_fallback: true,
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_mappings(mut self, mappings: SiteMappings) -> Self {
        self.mappings = mappings;
        self
    }

    pub fn with_data(mut self, data: DataDocument) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_profile_fallback(mut self, enabled: bool) -> Self {
        self.profile_fallback = enabled;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Mapping set that applies to this page, if any.
    pub fn mapping_set(&self) -> Option<&MappingSet> {
        self.mappings.for_url(&self.url)
    }

    /// (Re)build the value map from a fresh set of records.
    pub fn initialize(&mut self, entries: impl IntoIterator<Item = ValueMapEntry>) {
        self.values.clear();
        for entry in entries {
            self.values.register(entry);
        }
        info!(url = %self.url, aliases = self.values.len(), "value map initialised");
    }

    /// Fetch records for this page from `source` and initialise with them.
    pub fn load_from(&mut self, source: &dyn ValueSource) -> Result<usize, BridgeError> {
        let entries = source.fetch_values(&self.url)?;
        let count = entries.len();
        self.initialize(entries);
        Ok(count)
    }

    pub fn plan(&self, controls: &ExtractedControls) -> Vec<PlannedField> {
        let mut planner = FillPlanner::new(&self.values).with_mappings(self.mapping_set(), self.data.as_ref());
        if let Some(profile) = &self.profile {
            planner = planner.with_profile(profile);
            if self.profile_fallback {
                planner = planner.with_patterns(&self.patterns);
            }
        }
        planner.plan(controls)
    }

    /// Plan and apply in one pass.
    pub fn fill<D: ElementMutator>(&self, dom: &mut D, controls: &ExtractedControls) -> FillReport {
        let planned = self.plan(controls);
        apply_fill(dom, &self.url, &planned)
    }

    /// Drop every indicator a previous pass injected. Returns how many.
    pub fn clear_indicators<D: ElementMutator>(&self, dom: &mut D) -> usize {
        let existing: Vec<NodeId> = dom
            .descendant_elements(dom.body())
            .into_iter()
            .filter(|&el| dom.attr(el, INDICATOR_ATTR).is_some())
            .collect();
        for &el in &existing {
            dom.detach(el);
        }
        existing.len()
    }

    /// Mark each filled control's container with an indicator element.
    pub fn annotate<D: ElementMutator>(
        &self,
        dom: &mut D,
        controls: &ExtractedControls,
        report: &FillReport,
    ) -> usize {
        let removed = self.clear_indicators(dom);

        let mut added = 0;
        for control in controls.fillable() {
            let fingerprint = control.fingerprint();
            let filled = report
                .results
                .iter()
                .any(|r| r.fingerprint == fingerprint && matches!(r.outcome, FillOutcome::Filled { .. }));
            if !filled {
                continue;
            }
            let Some(anchor) = control
                .container
                .or_else(|| control.element.and_then(|el| dom.parent_element(el)))
                .map(|anchor| outside_label(dom, anchor))
            else {
                continue;
            };
            let indicator = dom.append_element(
                anchor,
                "span",
                &[(INDICATOR_ATTR, fingerprint.as_str()), ("class", "formmaster-indicator")],
            );
            dom.set_text(indicator, "\u{2713}");
            added += 1;
        }

        debug!(removed, added, "indicators refreshed");
        added
    }
}

/// `anchor`, or the parent of the `<label>` enclosing it, so indicator text
/// never becomes part of a label.
fn outside_label<D: ElementMutator>(dom: &D, anchor: NodeId) -> NodeId {
    std::iter::once(anchor)
        .chain(dom.ancestors(anchor))
        .filter(|&n| dom.has_tag(n, "label"))
        .last()
        .and_then(|label| dom.parent_element(label))
        .unwrap_or(anchor)
}
