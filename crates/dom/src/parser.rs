//! HTML parser adapter
//!
//! Parsing is delegated to html5ever (through `scraper`), which implements
//! the WHATWG tree construction algorithm and never fails on malformed
//! markup. Its tree is then copied into a `DomArena` so the rest of the
//! pipeline can mutate it freely.
//!
//! ```text
//! bytes → &str (UTF-8 check) → scraper::Html → DomArena (owned)
//! ```

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{Doctype, DomNode, NodeType};
use scraper::{Html, Node};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Decode page bytes. Only UTF-8 is accepted; a leading BOM is dropped.
pub fn decode(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

/// Parse a complete document
pub fn parse_document(html: &str) -> DomArena {
    let parsed = Html::parse_document(html);
    build_arena(&parsed, NodeType::Document)
}

/// Parse a fragment in `<body>` context
pub fn parse_fragment(html: &str) -> DomArena {
    let parsed = Html::parse_fragment(html);
    build_arena(&parsed, NodeType::DocumentFragment)
}

/// Copy the html5ever tree into an arena (iterative, document order)
fn build_arena(parsed: &Html, root_type: NodeType) -> DomArena {
    let mut arena = DomArena::new();
    let root_id = arena.add_node(DomNode::new(root_type, String::new()));
    // Freshly added node, cannot fail
    let _ = arena.set_root(root_id);

    let mut stack = Vec::new();
    for child in parsed.tree.root().children().rev() {
        match child.value() {
            // Fragment parsing wraps the result in a context <html> element
            Node::Element(el) if root_type == NodeType::DocumentFragment && el.name() == "html" => {
                for inner in child.children().rev() {
                    stack.push((inner, root_id));
                }
            }
            _ => stack.push((child, root_id)),
        }
    }

    while let Some((node_ref, parent_id)) = stack.pop() {
        let Some(node) = convert(node_ref.value()) else {
            // <template> contents hang off a fragment node; keep them inline
            if node_ref.value().is_fragment() {
                for child in node_ref.children().rev() {
                    stack.push((child, parent_id));
                }
            }
            continue;
        };
        let node_id = arena.add_node(node);
        // html5ever only nests content under elements and the root
        if arena.append_child(parent_id, node_id).is_err() {
            continue;
        }
        for child in node_ref.children().rev() {
            stack.push((child, node_id));
        }
    }

    arena
}

fn convert(node: &Node) -> Option<DomNode> {
    let converted = match node {
        Node::Element(el) => {
            let mut dom_node = DomNode::new(NodeType::Element, el.name());
            for (name, value) in el.attrs.iter() {
                let name = qualified_attr_name(&name.ns, &name.local);
                dom_node.attributes.push((name, value.to_string()));
            }
            dom_node
        }
        Node::Text(text) => DomNode::text(&**text),
        Node::Comment(comment) => DomNode::comment(&**comment),
        Node::Doctype(doctype) => {
            let mut dom_node = DomNode::new(NodeType::DocumentType, doctype.name());
            if !doctype.public_id().is_empty() || !doctype.system_id().is_empty() {
                dom_node.doctype = Some(Box::new(Doctype {
                    public_id: doctype.public_id().to_string(),
                    system_id: doctype.system_id().to_string(),
                }));
            }
            dom_node
        }
        Node::ProcessingInstruction(pi) => {
            let mut dom_node = DomNode::new(NodeType::ProcessingInstruction, &*pi.target);
            dom_node.node_value = pi.data.to_string();
            dom_node
        }
        _ => return None,
    };
    Some(converted)
}

/// Attribute name as written in markup. Foreign content attributes such as
/// `xlink:href` are stored by namespace and local name only.
fn qualified_attr_name(ns: &str, local: &str) -> String {
    match ns {
        XML_NS => format!("xml:{local}"),
        XMLNS_NS if local != "xmlns" => format!("xmlns:{local}"),
        XLINK_NS => format!("xlink:{local}"),
        _ => local.to_string(),
    }
}

/// Number of element nodes reachable from the root. Handy in tests and logs.
pub fn element_count(arena: &DomArena) -> usize {
    arena.find(|node| node.is_element()).len()
}
