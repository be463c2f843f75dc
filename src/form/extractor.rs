use tracing::{debug, error};

use crate::dom::accessor::{ElementAccessor, NodeId, collapse_whitespace};
use crate::dom::document::HtmlDocument;
use crate::error::DomError;
use crate::form::container::{ContainerDetection, StandardContainerDetector};
use crate::form::control_model::{ControlDescriptor, ControlKind, ControlOption, ExtractedControls};
use crate::form::label::{LabelDetection, LabelMatch, StandardLabelDetector, humanize_name};

/// Input types that never carry user data as plain inputs.
const SKIPPED_INPUT_TYPES: &[&str] = &[
    "submit", "button", "image", "reset", "file", "radio", "checkbox", "hidden",
];

const BUTTON_INPUT_TYPES: &[&str] = &["button", "submit", "reset"];

/// Walks a subtree and produces grouped [`ControlDescriptor`]s.
///
/// Label and container detection are injected. When either is missing the
/// extractor logs the gap and falls back to an empty label / the immediate
/// parent, so one absent helper never aborts extraction.
pub struct FormControlExtractor {
    labels: Option<Box<dyn LabelDetection>>,
    containers: Option<Box<dyn ContainerDetection>>,
}

impl Default for FormControlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormControlExtractor {
    pub fn new() -> Self {
        Self {
            labels: Some(Box::new(StandardLabelDetector)),
            containers: Some(Box::new(StandardContainerDetector)),
        }
    }

    pub fn with_label_detection(mut self, labels: Box<dyn LabelDetection>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_container_detection(mut self, containers: Box<dyn ContainerDetection>) -> Self {
        self.containers = Some(containers);
        self
    }

    pub fn without_label_detection(mut self) -> Self {
        self.labels = None;
        self
    }

    pub fn without_container_detection(mut self) -> Self {
        self.containers = None;
        self
    }

    /// Extract from a parsed page, optionally scoped by a CSS selector.
    pub fn extract_document(
        &self,
        doc: &HtmlDocument,
        scope: Option<&str>,
    ) -> Result<ExtractedControls, DomError> {
        let root = match scope {
            Some(css) => Some(
                doc.select_first(css)?
                    .ok_or_else(|| DomError::ScopeNotFound(css.to_string()))?,
            ),
            None => None,
        };
        Ok(self.extract(doc, root))
    }

    /// Extract every control below `scope` (default: `<body>`).
    pub fn extract(&self, dom: &dyn ElementAccessor, scope: Option<NodeId>) -> ExtractedControls {
        if self.labels.is_none() {
            error!("required dependency missing: label detection");
        }
        if self.containers.is_none() {
            error!("required dependency missing: container detection");
        }

        let root = scope.unwrap_or_else(|| dom.body());
        let mut controls = ExtractedControls::default();
        let mut radio_groups: Vec<(String, Vec<NodeId>)> = Vec::new();

        for el in dom.descendant_elements(root) {
            match dom.tag_name(el) {
                Some("input") => {
                    let input_type = input_type(dom, el);
                    match input_type.as_str() {
                        "radio" => {
                            let name = dom.attr(el, "name").unwrap_or("");
                            if name.is_empty() {
                                debug!(node = el.0, "skipping radio without name");
                                continue;
                            }
                            match radio_groups.iter_mut().find(|(n, _)| n == name) {
                                Some((_, members)) => members.push(el),
                                None => radio_groups.push((name.to_string(), vec![el])),
                            }
                        }
                        "checkbox" => controls.checkboxes.push(self.checkbox(dom, el)),
                        t if BUTTON_INPUT_TYPES.contains(&t) => {
                            controls.buttons.push(self.button(dom, el, t))
                        }
                        t if SKIPPED_INPUT_TYPES.contains(&t) => {}
                        t => controls.inputs.push(self.control(dom, el, ControlKind::from_type_str(t))),
                    }
                }
                Some("select") => controls.selects.push(self.select(dom, el)),
                Some("textarea") => {
                    controls.textareas.push(self.control(dom, el, ControlKind::Textarea))
                }
                Some("button") => controls.buttons.push(self.button(dom, el, "button")),
                _ => {}
            }
        }

        for (name, members) in radio_groups {
            controls.radios.push(self.radio_group(dom, &name, &members));
        }

        debug!(
            inputs = controls.inputs.len(),
            selects = controls.selects.len(),
            textareas = controls.textareas.len(),
            radios = controls.radios.len(),
            checkboxes = controls.checkboxes.len(),
            buttons = controls.buttons.len(),
            "extracted form controls"
        );

        controls
    }

    fn find_label(&self, dom: &dyn ElementAccessor, el: NodeId) -> Option<LabelMatch> {
        self.labels.as_ref()?.find_label(dom, el)
    }

    fn find_container(
        &self,
        dom: &dyn ElementAccessor,
        el: NodeId,
        label: Option<&LabelMatch>,
    ) -> Option<NodeId> {
        match &self.containers {
            Some(containers) => containers.find_container(dom, el, label),
            None => dom.parent_element(el),
        }
    }

    fn control(&self, dom: &dyn ElementAccessor, el: NodeId, kind: ControlKind) -> ControlDescriptor {
        let label = self.find_label(dom, el);
        let mut descriptor = base_descriptor(dom, el, kind);
        descriptor.value = dom.current_value(el);
        descriptor.container = self.find_container(dom, el, label.as_ref());
        descriptor.label = label.map(|l| l.text);
        descriptor
    }

    fn checkbox(&self, dom: &dyn ElementAccessor, el: NodeId) -> ControlDescriptor {
        let mut descriptor = self.control(dom, el, ControlKind::Checkbox);
        descriptor.checked = dom.attr(el, "checked").is_some();
        descriptor
    }

    fn select(&self, dom: &dyn ElementAccessor, el: NodeId) -> ControlDescriptor {
        let kind = if dom.attr(el, "multiple").is_some() {
            ControlKind::SelectMultiple
        } else {
            ControlKind::Select
        };
        let mut descriptor = self.control(dom, el, kind);
        descriptor.options = dom
            .query_tags(el, &["option"])
            .into_iter()
            .map(|o| ControlOption {
                value: dom.option_value(o),
                text: collapse_whitespace(&dom.text_content(o)),
                selected: dom.attr(o, "selected").is_some(),
                id: dom.attr(o, "id").unwrap_or("").to_string(),
                element: Some(o),
            })
            .collect();
        descriptor
    }

    fn button(&self, dom: &dyn ElementAccessor, el: NodeId, button_type: &str) -> ControlDescriptor {
        let mut descriptor = base_descriptor(dom, el, ControlKind::from_type_str(button_type));
        let text = dom.text_content(el).trim().to_string();
        let value = dom.attr(el, "value").unwrap_or("").to_string();
        descriptor.label = Some(if text.is_empty() { value.clone() } else { text.clone() });
        descriptor.value = if value.is_empty() { text } else { value };
        descriptor.container = dom.parent_element(el);
        descriptor
    }

    fn radio_group(&self, dom: &dyn ElementAccessor, name: &str, members: &[NodeId]) -> ControlDescriptor {
        let first = members[0];
        let mut descriptor = base_descriptor(dom, first, ControlKind::Radio);
        descriptor.id = String::new();
        descriptor.name = name.to_string();
        descriptor.required = members.iter().any(|&r| dom.attr(r, "required").is_some());

        descriptor.options = members
            .iter()
            .map(|&radio| {
                let value = dom.attr(radio, "value").unwrap_or("on").to_string();
                let text = match &self.labels {
                    Some(labels) => labels.radio_option_label(dom, radio).0,
                    None => String::new(),
                };
                ControlOption {
                    text: if text.is_empty() { value.clone() } else { text },
                    value,
                    selected: dom.attr(radio, "checked").is_some(),
                    id: dom.attr(radio, "id").unwrap_or("").to_string(),
                    element: Some(radio),
                }
            })
            .collect();

        if let Some(checked) = descriptor.options.iter().find(|o| o.selected) {
            descriptor.value = checked.value.clone();
            descriptor.checked = true;
        }

        let (container, group_label) = match &self.containers {
            Some(containers) => {
                let container = if members.len() > 1 {
                    containers.radio_group_container(dom, members)
                } else {
                    containers.find_container(dom, first, None)
                };
                (container, containers.radio_group_label(dom, container, members))
            }
            None => (dom.parent_element(first), None),
        };

        descriptor.container = container;
        descriptor.label = Some(
            group_label
                .map(|l| l.text)
                .unwrap_or_else(|| humanize_name(name)),
        );
        descriptor
    }
}

fn input_type(dom: &dyn ElementAccessor, el: NodeId) -> String {
    match dom.attr(el, "type") {
        Some(t) if !t.trim().is_empty() => t.trim().to_lowercase(),
        _ => "text".to_string(),
    }
}

fn base_descriptor(dom: &dyn ElementAccessor, el: NodeId, kind: ControlKind) -> ControlDescriptor {
    let attr = |name: &str| dom.attr(el, name).unwrap_or("").to_string();
    let flag = |name: &str| dom.attr(el, name).is_some();

    let mut descriptor = ControlDescriptor::new(kind)
        .with_id(attr("id"))
        .with_name(attr("name"))
        .with_placeholder(attr("placeholder"));
    descriptor.aria_label = attr("aria-label");
    descriptor.required = flag("required");
    descriptor.disabled = flag("disabled");
    descriptor.readonly = flag("readonly");
    descriptor.element = Some(el);
    descriptor
}
