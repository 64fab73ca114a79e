//! Document - one parsed HTML page
//!
//! Owns its arena outright. A `Document` is never shared: the batch
//! pipeline parses one per file, mutates it, serializes it and drops it.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::parser;
use crate::serializer::HtmlSerializer;
use crate::types::{DomNode, NodeId, NodeType};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Document {
    arena: DomArena,
    source_path: Option<PathBuf>,
}

impl Document {
    /// Parse a full page. Fails only on non-UTF-8 input.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self::parse_str(parser::decode(bytes)?))
    }

    pub fn parse_str(html: &str) -> Self {
        Self {
            arena: parser::parse_document(html),
            source_path: None,
        }
    }

    /// Parse a fragment such as a persisted navigation subtree
    pub fn parse_fragment(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            arena: parser::parse_fragment(parser::decode(bytes)?),
            source_path: None,
        })
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Encoding of the serialized output. Always UTF-8.
    pub fn encoding(&self) -> &'static str {
        "utf-8"
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// Root node id. Parsed documents always have one.
    pub fn root_id(&self) -> NodeId {
        self.arena.root_id().unwrap_or(0)
    }

    pub fn node(&self, node_id: NodeId) -> Result<&DomNode> {
        self.arena.get(node_id)
    }

    /// The `<body>` element, if the tree has one
    pub fn body(&self) -> Option<NodeId> {
        self.arena.find_one(|node| node.is_tag("body"))
    }

    /// First element in document order with `tag` and `attr` exactly equal to `value`
    pub fn find_element(&self, tag: &str, attr: &str, value: &str) -> Option<NodeId> {
        self.arena.find_element(tag, attr, value)
    }

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.arena.find_by_id(id)
    }

    /// Add a detached element with the given attributes
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = DomNode::element(tag);
        for (name, value) in attrs {
            node.set_attr(name, *value);
        }
        self.arena.add_node(node)
    }

    /// Add a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.add_node(DomNode::text(text))
    }

    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.arena.append_child(parent_id, child_id)
    }

    /// Remove all children of a node; the node itself stays in place
    pub fn clear_children(&mut self, node_id: NodeId) -> Result<()> {
        self.arena.clear_children(node_id).map(|_| ())
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.element_mut(node_id)?;
        node.set_attr(name, value);
        Ok(())
    }

    /// Drop every attribute whose name is not in `keep`
    pub fn retain_attributes(&mut self, node_id: NodeId, keep: &[&str]) -> Result<()> {
        let node = self.element_mut(node_id)?;
        node.attributes.retain(|(name, _)| keep.contains(&name.as_str()));
        Ok(())
    }

    fn element_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        let node = self.arena.get_mut(node_id)?;
        if node.node_type != NodeType::Element {
            return Err(DomError::InvalidNodeType {
                expected: NodeType::Element.to_string(),
                actual: node.node_type.to_string(),
            });
        }
        Ok(node)
    }

    /// Serialize the whole document
    pub fn serialize(&self) -> Result<String> {
        HtmlSerializer::new().serialize(&self.arena)
    }

    /// Outer HTML of a subtree
    pub fn serialize_node(&self, node_id: NodeId) -> Result<String> {
        HtmlSerializer::new().serialize_subtree(&self.arena, node_id)
    }

    /// Inner HTML of a node
    pub fn serialize_children(&self, node_id: NodeId) -> Result<String> {
        HtmlSerializer::new().serialize_children(&self.arena, node_id)
    }
}
