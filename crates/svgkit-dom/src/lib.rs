//! # SvgKit DOM
//!
//! The attributed element tree consumed by the SvgKit scene assembler.
//!
//! ## Design Goals
//!
//! 1. **Input only**: the assembler never mutates the tree
//! 2. **Arena storage**: nodes live in one `Vec`, children hold indices, parents hold
//!    non-owning back-indices
//! 3. **Tokenizer agnostic**: trees are built through [`DocumentBuilder`]; the
//!    [`Document::parse_xml`] adapter is one such builder driven by `roxmltree`

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Errors that can occur while building a document.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    ParseError(#[from] roxmltree::Error),

    #[error("Document has no root element")]
    NoRootElement,

    #[error("Unbalanced element nesting: {0}")]
    Unbalanced(String),
}

/// Unique identifier for a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Type of node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: HashMap<String, String>,
    },
    Text(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node type and associated data.
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Get the tag name for element nodes.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text(_) => None,
        }
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(|s| s.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Get the attribute map of an element.
    pub fn attributes(&self) -> Option<&HashMap<String, String>> {
        match &self.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            NodeKind::Text(_) => None,
        }
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An immutable attributed tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Parse XML text into a document.
    pub fn parse_xml(xml: &str) -> Result<Self, DomError> {
        let xml_doc = roxmltree::Document::parse(xml)?;
        let root = xml_doc.root_element();

        let mut builder = DocumentBuilder::new();
        append_xml_node(&mut builder, root);
        let doc = builder.finish()?;
        debug!(nodes = doc.len(), "Parsed XML document");
        Ok(doc)
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, text included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds no node at all. Never true for a finished document.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Tag name of an element.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::name)
    }

    /// Attribute of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attribute(name))
    }

    /// Whether an element carries an attribute.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Child nodes, text included.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Child elements, text skipped.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.get(*child).is_some_and(Node::is_element))
    }

    /// Parent node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, result: &mut String) {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => result.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for child in self.children(id) {
                    self.collect_text(*child, result);
                }
            }
            None => {}
        }
    }

    /// All elements below and including `id`, in document (pre-)order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.get(current).is_some_and(Node::is_element) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }
}

/// Incremental builder used by tokenizers to produce a [`Document`].
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    nodes: Vec<Node>,
    open: Vec<NodeId>,
    root: Option<NodeId>,
}

impl DocumentBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an element; it becomes the parent of subsequent nodes until closed.
    pub fn start_element<I, K, V>(&mut self, name: impl Into<String>, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let id = self.push(NodeKind::Element {
            name: name.into(),
            attributes,
        });
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.open.push(id);
        id
    }

    /// Close the innermost open element.
    pub fn end_element(&mut self) -> Result<NodeId, DomError> {
        self.open
            .pop()
            .ok_or_else(|| DomError::Unbalanced("end_element without open element".into()))
    }

    /// Append a text node to the innermost open element.
    pub fn text(&mut self, text: impl Into<String>) -> Option<NodeId> {
        if self.open.is_empty() {
            return None;
        }
        Some(self.push(NodeKind::Text(text.into())))
    }

    /// Finish the document. All elements must be closed.
    pub fn finish(self) -> Result<Document, DomError> {
        if !self.open.is_empty() {
            return Err(DomError::Unbalanced(format!(
                "{} element(s) left open",
                self.open.len()
            )));
        }
        let root = self.root.ok_or(DomError::NoRootElement)?;
        Ok(Document {
            nodes: self.nodes,
            root,
        })
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = self.open.last().copied();
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }
}

fn append_xml_node(builder: &mut DocumentBuilder, node: roxmltree::Node<'_, '_>) {
    let attributes = node.attributes().map(|attr| {
        let name = match attr.namespace() {
            Some(XLINK_NS) => format!("xlink:{}", attr.name()),
            Some(XML_NS) => format!("xml:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        (name, attr.value().to_string())
    });
    builder.start_element(node.tag_name().name(), attributes);

    for child in node.children() {
        if child.is_element() {
            append_xml_node(builder, child);
        } else if child.is_text() {
            if let Some(text) = child.text() {
                builder.text(text);
            }
        }
    }

    // Balanced by construction.
    let _ = builder.end_element();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xml_structure() {
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10"><g id="a"><rect/></g><text>hi</text></svg>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(doc.name(root), Some("svg"));
        assert_eq!(doc.attribute(root, "width"), Some("10"));

        let children: Vec<_> = doc.element_children(root).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(doc.name(children[0]), Some("g"));
        assert_eq!(doc.parent(children[0]), Some(root));
        assert_eq!(doc.text_content(children[1]), "hi");
    }

    #[test]
    fn test_parse_xml_xlink_prefix() {
        let doc = Document::parse_xml(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##,
        )
        .unwrap();
        let use_el = doc.element_children(doc.root()).next().unwrap();
        assert_eq!(doc.attribute(use_el, "xlink:href"), Some("#a"));
    }

    #[test]
    fn test_parse_xml_error() {
        assert!(matches!(
            Document::parse_xml("<svg><g></svg>"),
            Err(DomError::ParseError(_))
        ));
    }

    #[test]
    fn test_builder_and_descendants() {
        let mut b = DocumentBuilder::new();
        let root = b.start_element("svg", [("width", "100")]);
        let g = b.start_element("g", Vec::<(String, String)>::new());
        let rect = b.start_element("rect", [("x", "1")]);
        b.end_element().unwrap();
        b.end_element().unwrap();
        b.text("tail");
        b.end_element().unwrap();
        let doc = b.finish().unwrap();

        assert_eq!(doc.root(), root);
        assert_eq!(doc.descendants(root), vec![root, g, rect]);
        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.attribute(rect, "x"), Some("1"));
    }

    #[test]
    fn test_builder_unbalanced() {
        let mut b = DocumentBuilder::new();
        b.start_element("svg", [("a", "b")]);
        assert!(matches!(b.finish(), Err(DomError::Unbalanced(_))));

        let b = DocumentBuilder::new();
        assert!(matches!(b.finish(), Err(DomError::NoRootElement)));
    }
}
