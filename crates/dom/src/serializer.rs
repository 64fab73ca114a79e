//! HTML Serializer - Convert the arena tree back to markup
//!
//! Follows the HTML fragment serialization algorithm closely enough that
//! re-parsing the output yields the same tree:
//! - void elements get no end tag
//! - raw text elements (script, style, ...) keep their text unescaped
//! - a leading newline in pre/textarea/listing is doubled, since the parser
//!   swallows the first one

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Emit `<!DOCTYPE ...>` nodes
    pub include_doctype: bool,
    /// Emit comment nodes
    pub include_comments: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            include_doctype: true,
            include_comments: true,
        }
    }
}

/// Document tree serializer
pub struct HtmlSerializer {
    config: SerializerConfig,
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the whole tree from the root
    pub fn serialize(&self, arena: &DomArena) -> Result<String> {
        let mut output = String::with_capacity(arena.len() * 32);

        if let Some(root_id) = arena.root_id() {
            self.serialize_node(arena, root_id, false, &mut output)?;
        }

        Ok(output)
    }

    /// Outer HTML of one subtree
    pub fn serialize_subtree(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        let raw_parent = match arena.parent(node_id)? {
            Some(parent) => is_raw_text_element(&parent.node_name),
            None => false,
        };
        self.serialize_node(arena, node_id, raw_parent, &mut output)?;
        Ok(output)
    }

    /// Inner HTML of one node
    pub fn serialize_children(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        let node = arena.get(node_id)?;
        let raw = node.is_element() && is_raw_text_element(&node.node_name);
        for &child_id in &node.children_ids {
            self.serialize_node(arena, child_id, raw, &mut output)?;
        }
        Ok(output)
    }

    /// Serialize one subtree with an explicit stack, so nesting depth is
    /// bounded by the heap rather than the thread stack.
    ///
    /// `raw_parent` is true when the node sits directly in a raw text element.
    fn serialize_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        raw_parent: bool,
        output: &mut String,
    ) -> Result<()> {
        let mut stack = vec![Step::Open(node_id, raw_parent)];

        while let Some(step) = stack.pop() {
            let (node_id, raw_parent) = match step {
                Step::Open(node_id, raw_parent) => (node_id, raw_parent),
                Step::Close(node_id) => {
                    let node = arena.get(node_id)?;
                    output.push_str("</");
                    output.push_str(&node.node_name);
                    output.push('>');
                    continue;
                }
            };
            let node = arena.get(node_id)?;

            match node.node_type {
                NodeType::Element => {
                    write_start_tag(node, output);
                    if is_void_element(&node.node_name) {
                        continue;
                    }

                    if LEADING_NEWLINE_ELEMENTS.contains(&node.node_name.as_str()) {
                        if let Some(&first) = node.children_ids.first() {
                            let first = arena.get(first)?;
                            if first.is_text() && first.node_value.starts_with('\n') {
                                output.push('\n');
                            }
                        }
                    }

                    stack.push(Step::Close(node_id));
                    let raw = is_raw_text_element(&node.node_name);
                    for &child_id in node.children_ids.iter().rev() {
                        stack.push(Step::Open(child_id, raw));
                    }
                }
                NodeType::Text if raw_parent => output.push_str(&node.node_value),
                NodeType::Text => escape_into(&node.node_value, false, output),
                NodeType::Comment => {
                    if self.config.include_comments {
                        output.push_str("<!--");
                        output.push_str(&node.node_value);
                        output.push_str("-->");
                    }
                }
                NodeType::DocumentType => {
                    if self.config.include_doctype {
                        write_doctype(node, output);
                    }
                }
                NodeType::ProcessingInstruction => {
                    output.push_str("<?");
                    output.push_str(&node.node_name);
                    output.push(' ');
                    output.push_str(&node.node_value);
                    output.push('>');
                }
                NodeType::Document | NodeType::DocumentFragment => {
                    for &child_id in node.children_ids.iter().rev() {
                        stack.push(Step::Open(child_id, false));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Pending work for the serializer stack
enum Step {
    /// Emit a node; the flag marks text under a raw text element
    Open(NodeId, bool),
    /// Emit the end tag of an element whose children are done
    Close(NodeId),
}

fn write_start_tag(node: &DomNode, output: &mut String) {
    output.push('<');
    output.push_str(&node.node_name);
    for (name, value) in &node.attributes {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        escape_into(value, true, output);
        output.push('"');
    }
    output.push('>');
}

fn write_doctype(node: &DomNode, output: &mut String) {
    output.push_str("<!DOCTYPE ");
    output.push_str(&node.node_name);
    if let Some(ids) = &node.doctype {
        if !ids.public_id.is_empty() {
            output.push_str(" PUBLIC \"");
            output.push_str(&ids.public_id);
            output.push('"');
        } else if !ids.system_id.is_empty() {
            output.push_str(" SYSTEM");
        }
        if !ids.system_id.is_empty() {
            output.push_str(" \"");
            output.push_str(&ids.system_id);
            output.push('"');
        }
    }
    output.push('>');
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_into(text: &str, attr_mode: bool, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '"' if attr_mode => output.push_str("&quot;"),
            '<' if !attr_mode => output.push_str("&lt;"),
            '>' if !attr_mode => output.push_str("&gt;"),
            c => output.push(c),
        }
    }
}
