use formmaster::dom::accessor::{ChildNode, ElementAccessor, NodeId};

// =========================================================================
// Synthetic element tree (no HTML parser involved)
// =========================================================================

#[derive(Debug, Clone)]
enum Child {
    Element(usize),
    Text(String),
}

#[derive(Debug, Clone)]
struct SyntheticNode {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<Child>,
}

/// Hand-built `html > body` tree implementing [`ElementAccessor`].
#[derive(Debug, Clone)]
pub struct SyntheticDom {
    nodes: Vec<SyntheticNode>,
}

impl SyntheticDom {
    pub fn new() -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push("html", &[], None);
        dom.push("body", &[], Some(0));
        dom
    }

    pub fn root(&self) -> NodeId {
        NodeId(1)
    }

    pub fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(tag, attrs, Some(parent.0))
    }

    pub fn text(&mut self, parent: NodeId, text: &str) {
        self.nodes[parent.0].children.push(Child::Text(text.to_string()));
    }

    /// Element containing a single text run.
    pub fn with_text(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeId {
        let el = self.element(parent, tag, attrs);
        self.text(el, text);
        el
    }

    fn push(&mut self, tag: &str, attrs: &[(&str, &str)], parent: Option<usize>) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(SyntheticNode {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect(),
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(Child::Element(index));
        }
        NodeId(index)
    }

    fn preorder(&self, index: usize, out: &mut Vec<usize>) {
        for child in &self.nodes[index].children {
            if let Child::Element(c) = child {
                out.push(*c);
                self.preorder(*c, out);
            }
        }
    }
}

impl ElementAccessor for SyntheticDom {
    fn body(&self) -> NodeId {
        NodeId(1)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent.map(NodeId)
    }

    fn child_nodes(&self, node: NodeId) -> Vec<ChildNode> {
        self.nodes[node.0]
            .children
            .iter()
            .map(|c| match c {
                Child::Element(i) => ChildNode::Element(NodeId(*i)),
                Child::Text(t) => ChildNode::Text(t.clone()),
            })
            .collect()
    }

    fn text_content(&self, node: NodeId) -> String {
        self.nodes[node.0]
            .children
            .iter()
            .map(|c| match c {
                Child::Element(i) => self.text_content(NodeId(*i)),
                Child::Text(t) => t.clone(),
            })
            .collect()
    }

    fn descendant_elements(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.preorder(node.0, &mut out);
        out.into_iter().map(NodeId).collect()
    }

    fn document_position(&self, node: NodeId) -> usize {
        let mut order = vec![0];
        self.preorder(0, &mut order);
        order.iter().position(|&i| i == node.0).unwrap_or(usize::MAX)
    }
}
