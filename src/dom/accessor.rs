use serde::Serialize;

// ============================================================================
// Narrow DOM interface used by label/container detection and the filler
// ============================================================================

/// Handle to a node inside a document. Only meaningful for the document that
/// produced it; handles never survive a re-parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// A direct child of an element: either another element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildNode {
    Element(NodeId),
    Text(String),
}

/// Notification dispatched to page scripts after a control has been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Change,
    Input,
    Click,
}

/// Read-only access to an element tree.
///
/// Implementations only have to provide the primitive queries; tree walks
/// (ancestors, containment, sibling lookups) are derived from them so the
/// detection heuristics can run against a parsed page or a synthetic tree.
pub trait ElementAccessor {
    /// Element that bounds upward walks (`<body>`, or the document root).
    fn body(&self) -> NodeId;

    /// Lower-cased tag name, `None` for non-element nodes.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;

    fn parent_element(&self, node: NodeId) -> Option<NodeId>;

    fn child_nodes(&self, node: NodeId) -> Vec<ChildNode>;

    /// Concatenated text of every descendant text node (DOM `textContent`).
    fn text_content(&self, node: NodeId) -> String;

    /// Descendant elements of `node` in document order, excluding `node`.
    fn descendant_elements(&self, node: NodeId) -> Vec<NodeId>;

    /// Position of `node` in document order.
    fn document_position(&self, node: NodeId) -> usize;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        let body = self.body();
        std::iter::once(body)
            .chain(self.descendant_elements(body))
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    fn has_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag_name(node) == Some(tag)
    }

    /// Lower-cased `class` attribute, empty when absent.
    fn class_name(&self, node: NodeId) -> String {
        self.attr(node, "class").unwrap_or("").to_lowercase()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.child_nodes(node)
            .into_iter()
            .filter_map(|c| match c {
                ChildNode::Element(id) => Some(id),
                ChildNode::Text(_) => None,
            })
            .collect()
    }

    fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_element(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&s| s == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Ancestors from the immediate parent outwards.
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_element(node);
        while let Some(p) = current {
            out.push(p);
            current = self.parent_element(p);
        }
        out
    }

    /// DOM `contains`: true when `node` is `container` or one of its descendants.
    fn contains(&self, container: NodeId, node: NodeId) -> bool {
        node == container || self.ancestors(node).contains(&container)
    }

    /// Descendants of `root` whose tag is one of `tags`, in document order.
    fn query_tags(&self, root: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|&n| self.tag_name(n).is_some_and(|t| tags.contains(&t)))
            .collect()
    }

    /// True when `a` comes before `b` in document order.
    fn precedes(&self, a: NodeId, b: NodeId) -> bool {
        self.document_position(a) < self.document_position(b)
    }

    /// Value an `<option>` submits: its `value` attribute, else its text.
    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => collapse_whitespace(&self.text_content(option)),
        }
    }

    /// The live value of a control as a page script would read it.
    fn current_value(&self, node: NodeId) -> String {
        match self.tag_name(node) {
            Some("textarea") => self.text_content(node),
            Some("select") => {
                let options = self.query_tags(node, &["option"]);
                options
                    .iter()
                    .find(|&&o| self.attr(o, "selected").is_some())
                    .or(options.first())
                    .map(|&o| self.option_value(o))
                    .unwrap_or_default()
            }
            _ => self.attr(node, "value").unwrap_or("").to_string(),
        }
    }
}

/// Write access used when applying fill commands.
pub trait ElementMutator: ElementAccessor {
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attr(&mut self, node: NodeId, name: &str);

    /// Replace every child of `node` with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str);

    fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId;

    /// Unlink `node` from the tree. Its handle stays valid but unreachable.
    fn detach(&mut self, node: NodeId);

    fn dispatch(&mut self, node: NodeId, event: DomEvent);

    /// Assign a control's value the way a script setting `.value` would.
    fn set_value(&mut self, node: NodeId, value: &str) {
        if self.has_tag(node, "textarea") {
            self.set_text(node, value);
        } else {
            self.set_attr(node, "value", value);
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
