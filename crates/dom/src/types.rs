//! Core type definitions for the HTML document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Use Option<Box<T>> for rare optional fields (reduce struct size)

use smallvec::SmallVec;
use std::fmt;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Attribute list in source order. Most elements carry fewer than 4.
pub type Attributes = SmallVec<[(String, String); 4]>;

/// Node type, numbered like DOM `nodeType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Element => "element",
            NodeType::Text => "text",
            NodeType::ProcessingInstruction => "processing-instruction",
            NodeType::Comment => "comment",
            NodeType::Document => "document",
            NodeType::DocumentType => "doctype",
            NodeType::DocumentFragment => "fragment",
        };
        f.write_str(name)
    }
}

/// Public and system identifiers of a `<!DOCTYPE>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doctype {
    pub public_id: String,
    pub system_id: String,
}

/// The main document tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - Use Option<Box<T>> for rare data
#[derive(Debug, Clone)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Tag name for elements, doctype name, PI target. Empty otherwise.
    pub node_name: String,
    /// Text for text/comment nodes, PI data. Empty otherwise.
    pub node_value: String,
    pub attributes: Attributes,

    pub doctype: Option<Box<Doctype>>,
}

impl DomNode {
    /// Create a detached node. Ids are assigned by the arena.
    pub fn new(node_type: NodeType, node_name: impl Into<String>) -> Self {
        Self {
            node_id: 0,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name: node_name.into(),
            node_value: String::new(),
            attributes: Attributes::new(),
            doctype: None,
        }
    }

    /// Element with an ASCII-lowercased tag name
    pub fn element(tag: &str) -> Self {
        Self::new(NodeType::Element, tag.to_ascii_lowercase())
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Text, String::new());
        node.node_value = value.into();
        node
    }

    pub fn comment(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeType::Comment, String::new());
        node.node_value = value.into();
        node
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is an element with the given tag name
    pub fn is_tag(&self, tag: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(tag)
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value. Names are compared exactly.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }
}

/// Elements that never have an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized without escaping.
///
/// `noscript` content is raw text only while documents are parsed with
/// scripting enabled, which is the html5ever default used by `parser`.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Elements where the parser drops a newline right after the start tag
pub const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_normalizes_and_keeps_order() {
        let mut node = DomNode::element("UL")
            .with_attr("Class", "nav")
            .with_attr("id", "main");
        node.set_attr("class", "other");

        assert_eq!(node.node_name, "ul");
        assert_eq!(node.attr("class"), Some("other"));
        assert_eq!(node.attributes[0].0, "class");
        assert_eq!(node.attributes[1].0, "id");
        assert_eq!(node.attr("Class"), None);
    }

    #[test]
    fn test_tag_helpers() {
        let node = DomNode::element("div");
        assert!(node.is_tag("DIV"));
        assert_eq!(node.tag_name(), Some("div"));
        assert_eq!(DomNode::text("x").tag_name(), None);
        assert!(is_void_element("img"));
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("noscript"));
        assert!(!is_raw_text_element("div"));
    }
}
