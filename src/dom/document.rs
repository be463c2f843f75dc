use std::collections::HashMap;

use scraper::{Html, Node, Selector};
use serde::Serialize;

use crate::dom::accessor::{ChildNode, DomEvent, ElementAccessor, ElementMutator, NodeId};
use crate::error::DomError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Doctype(String),
    Comment(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Other,
}

#[derive(Debug, Clone)]
struct ArenaNode {
    data: NodeData,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A notification recorded by [`ElementMutator::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchedEvent {
    pub node: NodeId,
    pub event: DomEvent,
}

/// Parsed HTML page flattened into an owned, mutable node arena.
///
/// Nodes are stored in document order, so a node's arena index is its
/// document position. Elements appended after parsing sort after the
/// original tree.
#[derive(Debug)]
pub struct HtmlDocument {
    nodes: Vec<ArenaNode>,
    source: Html,
    body: usize,
    events: Vec<DispatchedEvent>,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        let source = Html::parse_document(html);
        let nodes = flatten(&source);
        let body = nodes
            .iter()
            .position(|n| matches!(&n.data, NodeData::Element { tag, .. } if tag == "body"))
            .unwrap_or(0);

        Self {
            nodes,
            source,
            body,
            events: Vec::new(),
        }
    }

    /// First element matching a CSS selector in the page as parsed.
    pub fn select_first(&self, css: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(css).map_err(|e| DomError::InvalidSelector {
            selector: css.to_string(),
            reason: format!("{:?}", e),
        })?;

        let Some(found) = self.source.select(&selector).next() else {
            return Ok(None);
        };

        Ok(self
            .source
            .tree
            .root()
            .descendants()
            .position(|n| n.id() == found.id())
            .map(NodeId))
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn events_for(&self, node: NodeId) -> Vec<DomEvent> {
        self.events
            .iter()
            .filter(|e| e.node == node)
            .map(|e| e.event)
            .collect()
    }

    /// Serialize the current (possibly mutated) tree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in &self.nodes[0].children {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, index: usize, out: &mut String) {
        match &self.nodes[index].data {
            NodeData::Document | NodeData::Other => {}
            NodeData::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                let raw = self.nodes[index]
                    .parent
                    .and_then(|p| self.element_tag(p))
                    .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in &self.nodes[index].children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn element_tag(&self, index: usize) -> Option<&str> {
        match &self.nodes.get(index)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(String, String)>> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn collect_text(&self, index: usize, out: &mut String) {
        for &child in &self.nodes[index].children {
            match &self.nodes[child].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element { .. } => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    fn collect_elements(&self, index: usize, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[index].children {
            if let NodeData::Element { .. } = self.nodes[child].data {
                out.push(NodeId(child));
                self.collect_elements(child, out);
            }
        }
    }
}

fn flatten(source: &Html) -> Vec<ArenaNode> {
    let mut index = HashMap::new();
    let mut nodes: Vec<ArenaNode> = Vec::new();

    for node in source.tree.root().descendants() {
        let position = nodes.len();
        index.insert(node.id(), position);

        let parent = node.parent().and_then(|p| index.get(&p.id()).copied());
        let data = match node.value() {
            Node::Document | Node::Fragment => NodeData::Document,
            Node::Doctype(doctype) => NodeData::Doctype(doctype.name().to_string()),
            Node::Comment(comment) => NodeData::Comment(String::from(&**comment)),
            Node::Text(text) => NodeData::Text(String::from(&**text)),
            Node::Element(el) => NodeData::Element {
                tag: el.name().to_ascii_lowercase(),
                attrs: el
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            },
            _ => NodeData::Other,
        };

        if let Some(p) = parent {
            nodes[p].children.push(position);
        }
        nodes.push(ArenaNode {
            data,
            parent,
            children: Vec::new(),
        });
    }

    nodes
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

impl ElementAccessor for HtmlDocument {
    fn body(&self) -> NodeId {
        NodeId(self.body)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element_tag(node.0)
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node.0)?.parent?;
        self.element_tag(parent).map(|_| NodeId(parent))
    }

    fn child_nodes(&self, node: NodeId) -> Vec<ChildNode> {
        let Some(arena) = self.nodes.get(node.0) else {
            return Vec::new();
        };
        arena
            .children
            .iter()
            .filter_map(|&c| match &self.nodes[c].data {
                NodeData::Element { .. } => Some(ChildNode::Element(NodeId(c))),
                NodeData::Text(text) => Some(ChildNode::Text(text.clone())),
                _ => None,
            })
            .collect()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.collect_text(node.0, &mut out);
        }
        out
    }

    fn descendant_elements(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if node.0 < self.nodes.len() {
            self.collect_elements(node.0, &mut out);
        }
        out
    }

    fn document_position(&self, node: NodeId) -> usize {
        node.0
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendant_elements(NodeId(0))
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }
}

impl ElementMutator for HtmlDocument {
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(node) else {
            return;
        };
        match attrs.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(node) {
            attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if node.0 >= self.nodes.len() {
            return;
        }
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child].parent = None;
        }
        let position = self.nodes.len();
        self.nodes.push(ArenaNode {
            data: NodeData::Text(text.to_string()),
            parent: Some(node.0),
            children: Vec::new(),
        });
        self.nodes[node.0].children.push(position);
    }

    fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let position = self.nodes.len();
        self.nodes.push(ArenaNode {
            data: NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: attrs
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
            },
            parent: Some(parent.0),
            children: Vec::new(),
        });
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(position);
        }
        NodeId(position)
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node.0).and_then(|n| n.parent.take()) else {
            return;
        };
        self.nodes[parent].children.retain(|&c| c != node.0);
    }

    fn dispatch(&mut self, node: NodeId, event: DomEvent) {
        self.events.push(DispatchedEvent { node, event });
    }
}
