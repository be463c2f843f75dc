use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fill::plan::{FieldResult, FillOutcome, ValueOrigin};

/// One line of the JSONL fill trace.
#[derive(Debug, Serialize)]
pub struct FillTraceEvent {
    pub timestamp_ms: u128,
    pub url: String,

    pub field: String,
    pub control_type: String,
    pub fingerprint: String,
    pub label: Option<String>,

    pub source: Option<String>,
    pub strategy: Option<String>,
    pub matched_key: Option<String>,

    pub outcome: String,
    pub value: Option<String>,
    pub reason: Option<String>,
}

impl FillTraceEvent {
    pub fn now(url: &str, field: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            url: url.to_string(),
            field: field.to_string(),
            control_type: String::new(),
            fingerprint: String::new(),
            label: None,
            source: None,
            strategy: None,
            matched_key: None,
            outcome: String::new(),
            value: None,
            reason: None,
        }
    }

    pub fn from_result(url: &str, result: &FieldResult) -> Self {
        let mut event = Self::now(url, &result.field)
            .with_control(result.kind.as_str(), &result.fingerprint, result.label.as_deref())
            .with_outcome(&result.outcome);
        if let Some(origin) = &result.origin {
            event = event.with_origin(origin);
        }
        event
    }

    pub fn with_control(mut self, control_type: &str, fingerprint: &str, label: Option<&str>) -> Self {
        self.control_type = control_type.to_string();
        self.fingerprint = fingerprint.to_string();
        self.label = label.map(str::to_string);
        self
    }

    pub fn with_origin(mut self, origin: &ValueOrigin) -> Self {
        match origin {
            ValueOrigin::Mapping { key } => {
                self.source = Some("mapping".to_string());
                self.matched_key = Some(key.clone());
            }
            ValueOrigin::ValueMap { strategy, matched_key } => {
                self.source = Some("value-map".to_string());
                self.strategy = Some(format!("{:?}", strategy));
                self.matched_key = Some(matched_key.clone());
            }
            ValueOrigin::Profile { path } => {
                self.source = Some("profile".to_string());
                self.matched_key = Some(path.clone());
            }
        }
        self
    }

    pub fn with_outcome(mut self, outcome: &FillOutcome) -> Self {
        self.outcome = outcome.label().to_string();
        match outcome {
            FillOutcome::Filled { value } | FillOutcome::NoOptionMatched { value } => {
                self.value = Some(value.clone());
            }
            FillOutcome::Skipped { reason } | FillOutcome::MappingFailed { reason } => {
                self.reason = Some(reason.clone());
            }
            FillOutcome::Unmatched | FillOutcome::ElementNotFound => {}
        }
        self
    }
}
