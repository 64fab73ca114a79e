//! Arena-based document tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! This arena eliminates:
//! - Rc/RefCell overhead and borrow juggling during mutation
//! - Recursive traversal (stack overflow risk on deep documents)
//! - Per-node heap allocations (single Vec allocation)
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Removing a subtree only unlinks it. The detached nodes stay in the
//! vector but are unreachable from the root, so every traversal here
//! starts from a node id and follows `children_ids`.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for document nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially, attached or not
    nodes: Vec<DomNode>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a detached node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        node.parent_id = None;
        node.children_ids.clear();
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Link a detached node as the last child of `parent_id`
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        let parent = self.get(parent_id)?;
        if !matches!(
            parent.node_type,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        ) {
            return Err(DomError::InvalidAppend {
                parent: parent_id,
                child: child_id,
                reason: "parent cannot have children",
            });
        }

        let child = self.get(child_id)?;
        if child.parent_id.is_some() || Some(child_id) == self.root_id {
            return Err(DomError::InvalidAppend {
                parent: parent_id,
                child: child_id,
                reason: "child is already attached",
            });
        }
        if self.is_ancestor_or_self(child_id, parent_id)? {
            return Err(DomError::InvalidAppend {
                parent: parent_id,
                child: child_id,
                reason: "child is an ancestor of parent",
            });
        }

        self.get_mut(child_id)?.parent_id = Some(parent_id);
        self.get_mut(parent_id)?.children_ids.push(child_id);
        Ok(())
    }

    /// Unlink all children of a node, returning the detached ids
    pub fn clear_children(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let children: Vec<NodeId> = self.get_mut(node_id)?.children_ids.drain(..).collect();
        for &child_id in &children {
            self.get_mut(child_id)?.parent_id = None;
        }
        Ok(children)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node_id: NodeId) -> Result<bool> {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == candidate {
                return Ok(true);
            }
            current = self.get(id)?.parent_id;
        }
        Ok(false)
    }

    /// Traverse tree depth-first in document order (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// First node under `start_id` (inclusive) matching predicate, in document order
    pub fn find_first_df<F>(&self, start_id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id).ok()?;
            if predicate(node) {
                return Some(node_id);
            }
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        None
    }

    /// All attached nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut found = Vec::new();
        if let Some(root_id) = self.root_id {
            // Only fails on dangling ids, which the arena never hands out
            let _ = self.traverse_df(root_id, |node| {
                if predicate(node) {
                    found.push(node.node_id);
                }
                Ok(())
            });
        }
        found
    }

    /// Find first attached node matching predicate
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.find_first_df(self.root_id?, predicate)
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_tag(tag))
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }

    /// Find first element whose tag matches and whose `attr` equals `value` exactly
    pub fn find_element(&self, tag: &str, attr: &str, value: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_tag(tag) && node.attr(attr) == Some(value))
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
