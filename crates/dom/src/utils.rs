//! Utility functions for document processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId, NodeType};

/// Get all text content from node and its children
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text.trim().to_string())
}

/// Replace every whitespace run that spans two or more newlines by a single
/// newline. Trailing indentation after the last newline of the run is kept.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('\n') {
        output.push_str(&rest[..pos]);
        let run = &rest[pos..];
        let run_len = run
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(run.len());
        // Position of the last newline inside the whitespace run
        let last_newline = run[..run_len].rfind('\n').unwrap_or(0);
        output.push('\n');
        rest = &run[last_newline + 1..];
    }

    output.push_str(rest);
    output
}

/// Compare two subtrees by structure and rendered text.
///
/// Node types, tag names, attribute sets and child order must match.
/// Whitespace-only text nodes are ignored and whitespace runs inside text
/// are collapsed, so pretty-printing differences do not count.
pub fn structurally_equivalent(
    left: &DomArena,
    left_id: NodeId,
    right: &DomArena,
    right_id: NodeId,
) -> Result<bool> {
    let mut stack = vec![(left_id, right_id)];

    while let Some((l_id, r_id)) = stack.pop() {
        let l = left.get(l_id)?;
        let r = right.get(r_id)?;

        if l.node_type != r.node_type || l.node_name != r.node_name {
            return Ok(false);
        }
        match l.node_type {
            NodeType::Text | NodeType::Comment => {
                if normalize_whitespace(&l.node_value) != normalize_whitespace(&r.node_value) {
                    return Ok(false);
                }
            }
            _ => {
                if !same_attributes(l, r) {
                    return Ok(false);
                }
            }
        }

        let l_children = significant_children(left, l)?;
        let r_children = significant_children(right, r)?;
        if l_children.len() != r_children.len() {
            return Ok(false);
        }
        stack.extend(l_children.into_iter().zip(r_children));
    }

    Ok(true)
}

fn significant_children(arena: &DomArena, node: &DomNode) -> Result<Vec<NodeId>> {
    let mut children = Vec::with_capacity(node.children_ids.len());
    for &child_id in &node.children_ids {
        let child = arena.get(child_id)?;
        if child.is_text() && child.node_value.trim().is_empty() {
            continue;
        }
        children.push(child_id);
    }
    Ok(children)
}

fn same_attributes(l: &DomNode, r: &DomNode) -> bool {
    let mut l_attrs: Vec<_> = l.attributes.iter().collect();
    let mut r_attrs: Vec<_> = r.attributes.iter().collect();
    l_attrs.sort();
    r_attrs.sort();
    l_attrs == r_attrs
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
