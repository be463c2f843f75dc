use serde::Serialize;
use tracing::{debug, warn};

use crate::coerce::coercer::{CoercedValue, ValueCoercer};
use crate::form::control_model::{ControlDescriptor, ControlKind, ExtractedControls};
use crate::resolve::mapping::{DataDocument, MappingSet};
use crate::resolve::profile::{ProfilePatterns, UserProfile};
use crate::resolve::resolver::{FieldResolver, MatchStrategy};
use crate::resolve::value_map::{RawValue, ValueMap};

// ============================================================================
// Plan model
// ============================================================================

/// Where a planned value came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum ValueOrigin {
    /// User-authored site mapping, keyed by field id/name or label.
    Mapping { key: String },
    ValueMap {
        strategy: MatchStrategy,
        matched_key: String,
    },
    /// Profile pattern fallback.
    Profile { path: String },
}

/// Final state of one control after a fill pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FillOutcome {
    Filled { value: String },
    /// Select/radio had no option for the value; a direct assignment was
    /// attempted and may have selected nothing.
    NoOptionMatched { value: String },
    /// No mapping, value-map entry or profile value for the control.
    Unmatched,
    Skipped { reason: String },
    /// The mapping rule for the field could not be evaluated.
    MappingFailed { reason: String },
    /// The element left the page between extraction and fill.
    ElementNotFound,
}

impl FillOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FillOutcome::Filled { .. } => "filled",
            FillOutcome::NoOptionMatched { .. } => "no-option-matched",
            FillOutcome::Unmatched => "unmatched",
            FillOutcome::Skipped { .. } => "skipped",
            FillOutcome::MappingFailed { .. } => "mapping-failed",
            FillOutcome::ElementNotFound => "element-not-found",
        }
    }
}

/// A value ready to be written into one control.
#[derive(Debug, Clone, PartialEq)]
pub struct FillCommand {
    pub value: CoercedValue,
    pub origin: ValueOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    Assign(FillCommand),
    /// Nothing to write; the outcome is already known.
    Settle(FillOutcome),
}

#[derive(Debug, Clone)]
pub struct PlannedField {
    pub control: ControlDescriptor,
    pub action: PlannedAction,
}

impl PlannedField {
    pub fn command(&self) -> Option<&FillCommand> {
        match &self.action {
            PlannedAction::Assign(command) => Some(command),
            PlannedAction::Settle(_) => None,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResult {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ControlKind,
    pub label: Option<String>,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<ValueOrigin>,
    pub outcome: FillOutcome,
}

impl FieldResult {
    pub fn new(control: &ControlDescriptor, origin: Option<ValueOrigin>, outcome: FillOutcome) -> Self {
        Self {
            field: control.field_key().to_string(),
            kind: control.kind(),
            label: control.label.clone(),
            fingerprint: control.fingerprint(),
            origin,
            outcome,
        }
    }
}

/// Every attempted control with its outcome, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub url: String,
    pub results: Vec<FieldResult>,
}

impl FillReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: FieldResult) {
        self.results.push(result);
    }

    pub fn count(&self, predicate: impl Fn(&FillOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn filled(&self) -> usize {
        self.count(|o| matches!(o, FillOutcome::Filled { .. }))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, FillOutcome::Unmatched))
    }

    /// Controls that needed attention: failed mappings, vanished elements
    /// and unmatched options.
    pub fn problems(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                FillOutcome::MappingFailed { .. }
                    | FillOutcome::ElementNotFound
                    | FillOutcome::NoOptionMatched { .. }
            )
        })
    }

    pub fn result_for(&self, field: &str) -> Option<&FieldResult> {
        self.results.iter().find(|r| r.field == field)
    }
}

// ============================================================================
// Planner
// ============================================================================

/// Decides a value for every fillable control.
///
/// Precedence per control: site mapping, then the value-map waterfall, then
/// (when enabled) the profile pattern table. The chosen raw value is then
/// coerced for the control kind.
pub struct FillPlanner<'a> {
    values: &'a ValueMap,
    mappings: Option<&'a MappingSet>,
    data: Option<&'a DataDocument>,
    profile: Option<&'a UserProfile>,
    patterns: Option<&'a ProfilePatterns>,
}

impl<'a> FillPlanner<'a> {
    pub fn new(values: &'a ValueMap) -> Self {
        Self {
            values,
            mappings: None,
            data: None,
            profile: None,
            patterns: None,
        }
    }

    pub fn with_mappings(mut self, mappings: Option<&'a MappingSet>, data: Option<&'a DataDocument>) -> Self {
        self.mappings = mappings;
        self.data = data;
        self
    }

    pub fn with_profile(mut self, profile: &'a UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Enable the profile pattern fallback (requires a profile).
    pub fn with_patterns(mut self, patterns: &'a ProfilePatterns) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn plan(&self, controls: &ExtractedControls) -> Vec<PlannedField> {
        controls
            .fillable()
            .map(|control| PlannedField {
                control: control.clone(),
                action: self.plan_control(control),
            })
            .collect()
    }

    pub fn plan_control(&self, control: &ControlDescriptor) -> PlannedAction {
        let (raw, origin) = match self.lookup(control) {
            Ok(Some(found)) => found,
            Ok(None) => return PlannedAction::Settle(FillOutcome::Unmatched),
            Err(outcome) => return PlannedAction::Settle(outcome),
        };

        if control.kind() == ControlKind::Password {
            return PlannedAction::Settle(FillOutcome::Skipped {
                reason: "password fields are never filled".to_string(),
            });
        }

        let coercer = match self.profile {
            Some(profile) => ValueCoercer::with_profile(profile),
            None => ValueCoercer::new(),
        };
        let value = coercer.coerce_for(&raw, control);

        if control.kind().is_choice() && value.is_empty() {
            return PlannedAction::Settle(FillOutcome::Skipped {
                reason: "no value for choice control".to_string(),
            });
        }

        PlannedAction::Assign(FillCommand { value, origin })
    }

    fn lookup(&self, control: &ControlDescriptor) -> Result<Option<(RawValue, ValueOrigin)>, FillOutcome> {
        let identity = control.identity();

        if let Some(mapping) = self
            .mappings
            .and_then(|m| m.for_field(control.field_key(), control.label.as_deref()))
        {
            match mapping.evaluate(self.data) {
                Ok(Some(raw)) => {
                    let key = if control.field_key().is_empty() {
                        identity.label.clone()
                    } else {
                        control.field_key().to_string()
                    };
                    return Ok(Some((raw, ValueOrigin::Mapping { key })));
                }
                Ok(None) => {
                    debug!(field = control.field_key(), "mapping produced no value");
                }
                Err(e) => {
                    warn!(field = control.field_key(), error = %e, "mapping failed");
                    return Err(FillOutcome::MappingFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(found) = FieldResolver::new(self.values).resolve(&identity) {
            return Ok(Some((
                found.entry.value.clone(),
                ValueOrigin::ValueMap {
                    strategy: found.strategy,
                    matched_key: found.matched_key,
                },
            )));
        }

        if identity.is_addressable() {
            debug!(
                id = %identity.id,
                name = %identity.name,
                aria_label = %identity.aria_label,
                placeholder = %identity.placeholder,
                "no value map match"
            );
        }

        if let (Some(patterns), Some(profile)) = (self.patterns, self.profile) {
            if let Some(found) = patterns.lookup(&identity, profile) {
                return Ok(Some((found.value, ValueOrigin::Profile { path: found.path })));
            }
        }

        Ok(None)
    }
}
