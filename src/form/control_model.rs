use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::accessor::NodeId;
use crate::resolve::resolver::FieldIdentity;

// ============================================================================
// Control kinds
// ============================================================================

/// Closed set of control kinds the engine understands.
///
/// Unknown `type` strings (`month`, `color`, ...) classify as `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Text,
    Search,
    Email,
    Password,
    Date,
    Time,
    Number,
    Range,
    Tel,
    Url,
    Hidden,
    Checkbox,
    Radio,
    Select,
    SelectMultiple,
    Textarea,
    Button,
}

impl ControlKind {
    /// Classify a DOM `type` string (or tag-derived type such as `select-one`).
    pub fn from_type_str(raw: &str) -> ControlKind {
        match raw.trim().to_lowercase().as_str() {
            "search" => ControlKind::Search,
            "email" => ControlKind::Email,
            "password" => ControlKind::Password,
            "date" => ControlKind::Date,
            "time" => ControlKind::Time,
            "number" => ControlKind::Number,
            "range" => ControlKind::Range,
            "tel" | "phone" => ControlKind::Tel,
            "url" => ControlKind::Url,
            "hidden" => ControlKind::Hidden,
            "checkbox" => ControlKind::Checkbox,
            "radio" => ControlKind::Radio,
            "select" | "select-one" => ControlKind::Select,
            "select-multiple" => ControlKind::SelectMultiple,
            "textarea" => ControlKind::Textarea,
            "button" | "submit" | "reset" | "image" => ControlKind::Button,
            _ => ControlKind::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Search => "search",
            ControlKind::Email => "email",
            ControlKind::Password => "password",
            ControlKind::Date => "date",
            ControlKind::Time => "time",
            ControlKind::Number => "number",
            ControlKind::Range => "range",
            ControlKind::Tel => "tel",
            ControlKind::Url => "url",
            ControlKind::Hidden => "hidden",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Radio => "radio",
            ControlKind::Select => "select",
            ControlKind::SelectMultiple => "select-multiple",
            ControlKind::Textarea => "textarea",
            ControlKind::Button => "button",
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, ControlKind::Select | ControlKind::SelectMultiple)
    }

    /// Kinds whose options are matched at fill time.
    pub fn is_choice(&self) -> bool {
        self.is_select() || *self == ControlKind::Radio
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// One `<option>` of a select, or one member of a radio group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlOption {
    pub value: String,
    pub text: String,
    pub selected: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip)]
    pub element: Option<NodeId>,
}

impl ControlOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            selected: false,
            id: String::new(),
            element: None,
        }
    }
}

/// Structured view of one interactive form control.
///
/// The kind is fixed at construction; radios sharing a `name` are one
/// descriptor whose `options` lists every member of the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlDescriptor {
    #[serde(rename = "type")]
    kind: ControlKind,
    pub id: String,
    pub name: String,
    pub value: String,
    pub checked: bool,
    pub placeholder: String,
    #[serde(rename = "ariaLabel")]
    pub aria_label: String,
    pub required: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub options: Vec<ControlOption>,
    pub label: Option<String>,
    #[serde(skip)]
    pub element: Option<NodeId>,
    #[serde(skip)]
    pub container: Option<NodeId>,
}

impl ControlDescriptor {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            id: String::new(),
            name: String::new(),
            value: String::new(),
            checked: false,
            placeholder: String::new(),
            aria_label: String::new(),
            required: false,
            disabled: false,
            readonly: false,
            options: Vec::new(),
            label: None,
            element: None,
            container: None,
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_options(mut self, options: Vec<ControlOption>) -> Self {
        self.options = options;
        self
    }

    /// Identity attributes consumed by the resolver waterfall.
    pub fn identity(&self) -> FieldIdentity {
        FieldIdentity {
            id: self.id.clone(),
            name: self.name.clone(),
            aria_label: self.aria_label.clone(),
            label: self.label.clone().unwrap_or_default(),
            placeholder: self.placeholder.clone(),
        }
    }

    /// Key under which fill results are reported: id, else name.
    pub fn field_key(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }

    /// Stable short hash of the control's identity, used to tag injected
    /// page state and trace events.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.label.as_deref().unwrap_or("").as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..12].to_string()
    }
}

/// Extraction output, grouped by control category in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedControls {
    pub inputs: Vec<ControlDescriptor>,
    pub selects: Vec<ControlDescriptor>,
    pub textareas: Vec<ControlDescriptor>,
    pub radios: Vec<ControlDescriptor>,
    pub checkboxes: Vec<ControlDescriptor>,
    pub buttons: Vec<ControlDescriptor>,
}

impl ExtractedControls {
    /// Every control that can receive a value, buttons excluded.
    pub fn fillable(&self) -> impl Iterator<Item = &ControlDescriptor> {
        self.inputs
            .iter()
            .chain(&self.selects)
            .chain(&self.textareas)
            .chain(&self.radios)
            .chain(&self.checkboxes)
    }

    pub fn len(&self) -> usize {
        self.fillable().count() + self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label (else name, else id) to descriptor. Later controls replace
    /// earlier ones sharing a key.
    pub fn label_mapping(&self) -> BTreeMap<String, &ControlDescriptor> {
        let mut mapping = BTreeMap::new();
        for control in self.fillable() {
            let key = control
                .label
                .as_deref()
                .filter(|l| !l.is_empty())
                .unwrap_or(if control.name.is_empty() { &control.id } else { &control.name });
            if !key.is_empty() {
                mapping.insert(key.to_string(), control);
            }
        }
        mapping
    }
}
