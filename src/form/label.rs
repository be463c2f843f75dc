use serde::Serialize;

use crate::dom::accessor::{ChildNode, ElementAccessor, NodeId};

/// Where a control's label text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelSource {
    Explicit,
    Implicit,
    AriaLabelledby,
    AriaLabel,
    Preceding,
    Placeholder,
    Name,
    GroupLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatch {
    pub text: String,
    pub source: LabelSource,
    /// Element carrying the text, when the text came from the DOM.
    pub element: Option<NodeId>,
}

impl LabelMatch {
    fn new(text: String, source: LabelSource, element: Option<NodeId>) -> Self {
        Self {
            text,
            source,
            element,
        }
    }
}

/// Locates the human-readable label of a control.
pub trait LabelDetection {
    /// Best label for `control`; `None` when no source yields text.
    fn find_label(&self, dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch>;

    /// Label of a single radio inside a group, with the element it came from.
    fn radio_option_label(&self, dom: &dyn ElementAccessor, radio: NodeId) -> (String, Option<NodeId>);
}

/// Label search in fixed priority order, first non-empty source wins:
/// `<label for>`, wrapping `<label>`, `aria-labelledby`, `aria-label`,
/// preceding span/div/p sibling, then placeholder or humanized name.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLabelDetector;

impl LabelDetection for StandardLabelDetector {
    fn find_label(&self, dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
        explicit_label(dom, control)
            .or_else(|| implicit_label(dom, control))
            .or_else(|| aria_labelledby(dom, control))
            .or_else(|| aria_label(dom, control))
            .or_else(|| preceding_text(dom, control))
            .or_else(|| attribute_fallback(dom, control))
    }

    fn radio_option_label(&self, dom: &dyn ElementAccessor, radio: NodeId) -> (String, Option<NodeId>) {
        if let Some(label) = label_for(dom, radio) {
            let text = dom.text_content(label).trim().to_string();
            if !text.is_empty() {
                return (text, Some(label));
            }
        }

        if let Some(label) = wrapping_label(dom, radio) {
            let text = dom.text_content(label).trim().to_string();
            if !text.is_empty() {
                return (text, Some(label));
            }
        }

        (nearby_text(dom, radio), None)
    }
}

/// First `<label for=...>` naming the control's id.
pub fn label_for(dom: &dyn ElementAccessor, control: NodeId) -> Option<NodeId> {
    let id = dom.attr(control, "id").filter(|id| !id.is_empty())?;
    dom.query_tags(dom.body(), &["label"])
        .into_iter()
        .find(|&l| dom.attr(l, "for") == Some(id))
}

/// Nearest ancestor `<label>` below `<body>`.
pub fn wrapping_label(dom: &dyn ElementAccessor, control: NodeId) -> Option<NodeId> {
    let body = dom.body();
    dom.ancestors(control)
        .into_iter()
        .take_while(|&a| a != body)
        .find(|&a| dom.has_tag(a, "label"))
}

fn explicit_label(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    let label = label_for(dom, control)?;
    non_empty(dom.text_content(label).trim())
        .map(|text| LabelMatch::new(text, LabelSource::Explicit, Some(label)))
}

fn implicit_label(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    let label = wrapping_label(dom, control)?;
    let full = dom.text_content(label);
    let value = dom.current_value(control);
    let text = if value.is_empty() {
        full.trim().to_string()
    } else {
        full.trim().replacen(&value, "", 1)
    };
    non_empty(text.trim()).map(|text| LabelMatch::new(text, LabelSource::Implicit, Some(label)))
}

fn aria_labelledby(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    let ids = dom.attr(control, "aria-labelledby")?;
    let mut first = None;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| dom.element_by_id(id))
        .filter_map(|el| {
            first.get_or_insert(el);
            non_empty(dom.text_content(el).trim())
        })
        .collect();

    non_empty(&parts.join(" "))
        .map(|text| LabelMatch::new(text, LabelSource::AriaLabelledby, first))
}

fn aria_label(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    let text = dom.attr(control, "aria-label")?;
    non_empty(text.trim()).map(|text| LabelMatch::new(text, LabelSource::AriaLabel, None))
}

fn preceding_text(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    let previous = dom.previous_element_sibling(control)?;
    if !matches!(dom.tag_name(previous), Some("span" | "div" | "p")) {
        return None;
    }
    non_empty(dom.text_content(previous).trim())
        .map(|text| LabelMatch::new(text, LabelSource::Preceding, Some(previous)))
}

fn attribute_fallback(dom: &dyn ElementAccessor, control: NodeId) -> Option<LabelMatch> {
    if let Some(text) = dom.attr(control, "placeholder").and_then(non_empty) {
        return Some(LabelMatch::new(text, LabelSource::Placeholder, None));
    }
    let name = dom.attr(control, "name")?;
    non_empty(&humanize_name(name)).map(|text| LabelMatch::new(text, LabelSource::Name, None))
}

/// `first_name` / `first-name` to `first name`.
pub fn humanize_name(name: &str) -> String {
    name.replace(['-', '_'], " ")
}

/// First text node or `<span>` after `element` among its parent's children.
pub fn nearby_text(dom: &dyn ElementAccessor, element: NodeId) -> String {
    let Some(parent) = dom.parent_element(element) else {
        return String::new();
    };

    let mut found = false;
    for child in dom.child_nodes(parent) {
        match child {
            ChildNode::Element(id) if id == element => found = true,
            ChildNode::Text(text) if found => {
                if let Some(text) = non_empty(text.trim()) {
                    return text;
                }
            }
            ChildNode::Element(id) if found && dom.has_tag(id, "span") => {
                if let Some(text) = non_empty(dom.text_content(id).trim()) {
                    return text;
                }
            }
            _ => {}
        }
    }

    String::new()
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_replaces_separators() {
        assert_eq!(humanize_name("first_name"), "first name");
        assert_eq!(humanize_name("post-code_2"), "post code 2");
    }
}
