use crate::dom::accessor::{ElementAccessor, NodeId};
use crate::form::label::{LabelMatch, LabelSource};

/// Maximum number of ancestors inspected when looking for a wrapper.
const MAX_ANCESTOR_LEVELS: usize = 5;

const FIELD_WRAPPER_CLASSES: &[&str] = &[
    "form-group",
    "input-group",
    "form-field",
    "input-field",
    "form-control-container",
    "field-wrapper",
];

const RADIO_GROUP_CLASSES: &[&str] = &["form-group", "radio-group", "option-group"];
const RADIO_GROUP_TAGS: &[&str] = &["fieldset", "ul", "ol"];

const GROUPING_HINTS: &[&str] = &["group", "option", "radio", "choice"];
const GROUPING_TAGS: &[&str] = &["div", "section", "article", "aside", "form", "fieldset"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "strong", "b"];
const LABEL_LIKE_TAGS: &[&str] = &["label", "div", "span", "p"];

/// Locates the DOM element that visually wraps a control or radio group.
pub trait ContainerDetection {
    fn find_container(
        &self,
        dom: &dyn ElementAccessor,
        control: NodeId,
        label: Option<&LabelMatch>,
    ) -> Option<NodeId>;

    /// Shared container of a radio group, `None` when only `<body>` holds them all.
    fn radio_group_container(&self, dom: &dyn ElementAccessor, radios: &[NodeId]) -> Option<NodeId>;

    fn radio_group_label(
        &self,
        dom: &dyn ElementAccessor,
        container: Option<NodeId>,
        radios: &[NodeId],
    ) -> Option<LabelMatch>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardContainerDetector;

impl ContainerDetection for StandardContainerDetector {
    fn find_container(
        &self,
        dom: &dyn ElementAccessor,
        control: NodeId,
        label: Option<&LabelMatch>,
    ) -> Option<NodeId> {
        let body = dom.body();
        let label_element = label.and_then(|l| l.element);

        for ancestor in dom.ancestors(control).into_iter().take(MAX_ANCESTOR_LEVELS) {
            if ancestor == body || dom.has_tag(ancestor, "form") {
                break;
            }

            let class_name = dom.class_name(ancestor);
            if FIELD_WRAPPER_CLASSES.iter().any(|c| class_name.contains(c)) {
                return Some(ancestor);
            }

            if label_element.is_some_and(|l| dom.contains(ancestor, l)) {
                return Some(ancestor);
            }
        }

        dom.parent_element(control)
    }

    fn radio_group_container(&self, dom: &dyn ElementAccessor, radios: &[NodeId]) -> Option<NodeId> {
        let body = dom.body();
        let contains_all = |candidate: NodeId| radios.iter().all(|&r| dom.contains(candidate, r));

        for &radio in radios {
            for ancestor in dom.ancestors(radio).into_iter().take(MAX_ANCESTOR_LEVELS) {
                if ancestor == body {
                    break;
                }
                let class_name = dom.class_name(ancestor);
                let semantic = dom.tag_name(ancestor).is_some_and(|t| RADIO_GROUP_TAGS.contains(&t))
                    || RADIO_GROUP_CLASSES.iter().any(|c| class_name.contains(c));
                if semantic && contains_all(ancestor) {
                    return Some(ancestor);
                }
            }
        }

        let common = common_ancestor(dom, radios)?;
        if common == body {
            return None;
        }

        // Candidates all contain every radio, so they nest; the last one in
        // document order is the innermost.
        let innermost = dom
            .query_tags(common, GROUPING_TAGS)
            .into_iter()
            .filter(|&el| contains_all(el))
            .filter(|&el| {
                let class_name = dom.class_name(el);
                GROUPING_HINTS.iter().any(|h| class_name.contains(h))
            })
            .max_by_key(|&el| dom.document_position(el));

        Some(innermost.unwrap_or(common))
    }

    fn radio_group_label(
        &self,
        dom: &dyn ElementAccessor,
        container: Option<NodeId>,
        radios: &[NodeId],
    ) -> Option<LabelMatch> {
        let first_radio = *radios.first()?;

        let fieldset = container
            .filter(|&c| dom.has_tag(c, "fieldset"))
            .or_else(|| {
                dom.ancestors(first_radio)
                    .into_iter()
                    .find(|&a| dom.has_tag(a, "fieldset"))
            });
        if let Some(legend) = fieldset.and_then(|f| dom.query_tags(f, &["legend"]).into_iter().next()) {
            let text = dom.text_content(legend).trim().to_string();
            if !text.is_empty() {
                return Some(group_label(text, legend));
            }
        }

        let container = container?;

        let heading = dom.descendant_elements(container).into_iter().find(|&el| {
            let is_heading = dom.tag_name(el).is_some_and(|t| HEADING_TAGS.contains(&t))
                || dom.attr(el, "role") == Some("heading");
            is_heading && !dom.text_content(el).trim().is_empty()
        });
        if let Some(heading) = heading {
            return Some(group_label(dom.text_content(heading).trim().to_string(), heading));
        }

        dom.query_tags(container, LABEL_LIKE_TAGS)
            .into_iter()
            .filter(|&el| dom.precedes(el, first_radio))
            .filter(|&el| !radios.iter().any(|&r| dom.contains(el, r)))
            .find(|&el| !dom.text_content(el).trim().is_empty())
            .map(|el| group_label(dom.text_content(el).trim().to_string(), el))
    }
}

fn group_label(text: String, element: NodeId) -> LabelMatch {
    LabelMatch {
        text,
        source: LabelSource::GroupLabel,
        element: Some(element),
    }
}

/// Nearest element containing every node in `elements`.
///
/// A single element yields its parent; `<body>` is returned when nothing
/// narrower holds them all.
pub fn common_ancestor(dom: &dyn ElementAccessor, elements: &[NodeId]) -> Option<NodeId> {
    let body = dom.body();
    let (first, rest) = elements.split_first()?;

    if rest.is_empty() {
        return Some(dom.parent_element(*first).unwrap_or(body));
    }

    let found = dom
        .ancestors(*first)
        .into_iter()
        .take_while(|&a| a != body && !dom.has_tag(a, "html"))
        .find(|&a| rest.iter().all(|&el| dom.contains(a, el)));

    Some(found.unwrap_or(body))
}
