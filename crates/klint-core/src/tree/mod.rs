//! Arena-backed concrete syntax tree.
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Parent and
//! child links are indices, so structural edits are index updates. Every edit
//! recomputes offsets for the attached tree before returning, which keeps
//! [`SyntaxTree::offset`] valid for all reads between edits.
//!
//! Offsets and lengths are counted in characters, not bytes.

mod builder;
mod edit;
#[cfg(test)]
pub(crate) mod fixture;
mod kind;
mod position;

pub use builder::TreeBuilder;
pub use edit::{Edit, Fragment};
pub use kind::{SyntaxKind, SYNTAX_KIND_VERSION};
pub use position::LineIndex;

use std::ops::Range;
use thiserror::Error;

/// Stable handle to a node inside a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Errors produced by tree construction and structural edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The id does not belong to this tree.
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    /// Children were requested for a leaf.
    #[error("node {0:?} is a leaf and cannot have children")]
    LeafParent(NodeId),

    /// Text was set on a composite node.
    #[error("node {0:?} is not a leaf")]
    NotALeaf(NodeId),

    /// A node to insert is still owned by another parent.
    #[error("node {0:?} is still attached to a parent")]
    StillAttached(NodeId),

    /// A node to edit relative to has no parent.
    #[error("node {0:?} has no parent")]
    NoParent(NodeId),

    /// An edit refers to a node that is no longer reachable from the root.
    #[error("node {0:?} is not attached to the tree")]
    Detached(NodeId),

    /// The root node cannot be moved or removed.
    #[error("the root node cannot be moved or removed")]
    RootEdit,

    /// The insertion would make a node its own ancestor.
    #[error("inserting {node:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node being inserted.
        node: NodeId,
        /// Target parent.
        parent: NodeId,
    },

    /// A child range exceeds the child count.
    #[error("child range {start}..{end} is out of bounds for {len} children")]
    OutOfBounds {
        /// Range start.
        start: usize,
        /// Range end.
        end: usize,
        /// Child count of the parent.
        len: usize,
    },

    /// The builder was finished in an inconsistent state.
    #[error("unbalanced tree builder: {0}")]
    Unbalanced(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: Option<String>,
    offset: usize,
    len: usize,
}

/// A mutable concrete syntax tree.
///
/// The concatenated text of all leaves, in document order, is exactly the
/// source text. Nodes removed by an edit stay in the arena as detached
/// subtrees; their offsets are no longer maintained.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    fn from_parts(nodes: Vec<NodeData>, root: NodeId) -> Self {
        let mut tree = Self { nodes, root };
        tree.recompute_offsets();
        tree
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.data(id).kind
    }

    /// Returns the parent of a node, or `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Returns the ordered children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Returns true if the node is a leaf.
    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.data(id).text.is_some()
    }

    /// Returns the text stored on a leaf.
    #[must_use]
    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        self.data(id).text.as_deref()
    }

    /// Returns the source text covered by a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.leaf_text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Returns the text of the whole tree.
    #[must_use]
    pub fn source_text(&self) -> String {
        self.text(self.root)
    }

    /// Start offset of a node, in characters.
    #[must_use]
    pub fn offset(&self, id: NodeId) -> usize {
        self.data(id).offset
    }

    /// Length of a node, in characters.
    #[must_use]
    pub fn text_len(&self, id: NodeId) -> usize {
        self.data(id).len
    }

    /// End offset (exclusive) of a node, in characters.
    #[must_use]
    pub fn end(&self, id: NodeId) -> usize {
        self.offset(id) + self.text_len(id)
    }

    /// Builds a line index over the current text.
    #[must_use]
    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.source_text())
    }

    /// Position of a node among its parent's children.
    #[must_use]
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Returns the sibling immediately before a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Returns the sibling immediately after a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Returns the first child with the given kind.
    #[must_use]
    pub fn find_child(&self, id: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == kind)
    }

    /// Returns the first leaf in a subtree.
    #[must_use]
    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        if self.is_leaf(id) {
            return Some(id);
        }
        self.children(id).iter().find_map(|&c| self.first_leaf(c))
    }

    /// Returns the last leaf in a subtree.
    #[must_use]
    pub fn last_leaf(&self, id: NodeId) -> Option<NodeId> {
        if self.is_leaf(id) {
            return Some(id);
        }
        self.children(id).iter().rev().find_map(|&c| self.last_leaf(c))
    }

    /// Returns the leaf immediately before a node in document order.
    #[must_use]
    pub fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let mut sibling = self.prev_sibling(current);
            while let Some(s) = sibling {
                if let Some(leaf) = self.last_leaf(s) {
                    return Some(leaf);
                }
                sibling = self.prev_sibling(s);
            }
            current = self.parent(current)?;
        }
    }

    /// Returns the leaf immediately after a node in document order.
    #[must_use]
    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let mut sibling = self.next_sibling(current);
            while let Some(s) = sibling {
                if let Some(leaf) = self.first_leaf(s) {
                    return Some(leaf);
                }
                sibling = self.next_sibling(s);
            }
            current = self.parent(current)?;
        }
    }

    /// Iterates over the ancestors of a node, nearest first, excluding the node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Iterates over a subtree in pre-order, starting with the node itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Returns true if the node is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id.index() >= self.nodes.len() {
            return false;
        }
        self.ancestors(id).last().unwrap_or(id) == self.root
    }

    /// Creates a detached leaf.
    pub fn new_leaf(&mut self, kind: SyntaxKind, text: impl Into<String>) -> NodeId {
        self.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            text: Some(text.into()),
            offset: 0,
            len: 0,
        })
    }

    /// Creates a detached composite node owning the given detached nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if any child is unknown, attached, or the root.
    pub fn new_node(
        &mut self,
        kind: SyntaxKind,
        children: Vec<NodeId>,
    ) -> Result<NodeId, TreeError> {
        for &child in &children {
            self.check_insertable(child)?;
        }
        let id = self.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            text: None,
            offset: 0,
            len: 0,
        });
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].children = children;
        Ok(id)
    }

    /// Replaces the children of `parent` in `range` with `replacement`.
    ///
    /// Removed nodes become detached. Returns the removed nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is a leaf, the range is out of bounds, or a
    /// replacement node is attached, the root, or an ancestor of `parent`.
    pub fn splice(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        replacement: Vec<NodeId>,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.check(parent)?;
        if self.is_leaf(parent) {
            return Err(TreeError::LeafParent(parent));
        }
        let len = self.children(parent).len();
        if range.start > range.end || range.end > len {
            return Err(TreeError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        for &node in &replacement {
            self.check_insertable(node)?;
            if node == parent || self.ancestors(parent).any(|a| a == node) {
                return Err(TreeError::Cycle { node, parent });
            }
        }
        for &node in &replacement {
            self.nodes[node.index()].parent = Some(parent);
        }
        let removed: Vec<NodeId> = self.nodes[parent.index()]
            .children
            .splice(range, replacement)
            .collect();
        for &node in &removed {
            self.nodes[node.index()].parent = None;
        }
        self.recompute_offsets();
        Ok(removed)
    }

    /// Inserts detached nodes as children of `parent` at `index`.
    ///
    /// # Errors
    ///
    /// See [`SyntaxTree::splice`].
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        index: usize,
        nodes: Vec<NodeId>,
    ) -> Result<(), TreeError> {
        self.splice(parent, index..index, nodes).map(|_| ())
    }

    /// Inserts detached nodes immediately before `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` has no parent, or see [`SyntaxTree::splice`].
    pub fn insert_before(&mut self, anchor: NodeId, nodes: Vec<NodeId>) -> Result<(), TreeError> {
        let (parent, index) = self.position_of(anchor)?;
        self.insert_children(parent, index, nodes)
    }

    /// Inserts detached nodes immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` has no parent, or see [`SyntaxTree::splice`].
    pub fn insert_after(&mut self, anchor: NodeId, nodes: Vec<NodeId>) -> Result<(), TreeError> {
        let (parent, index) = self.position_of(anchor)?;
        self.insert_children(parent, index + 1, nodes)
    }

    /// Detaches a node from its parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is the root or already detached.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.replace(id, Vec::new())
    }

    /// Replaces a node with zero or more detached nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is the root or detached, or see
    /// [`SyntaxTree::splice`].
    pub fn replace(&mut self, id: NodeId, with: Vec<NodeId>) -> Result<(), TreeError> {
        let (parent, index) = self.position_of(id)?;
        self.splice(parent, index..index + 1, with).map(|_| ())
    }

    /// Replaces the text of a leaf.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not a leaf.
    pub fn set_leaf_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        self.check(id)?;
        let data = &mut self.nodes[id.index()];
        if data.text.is_none() {
            return Err(TreeError::NotALeaf(id));
        }
        data.text = Some(text.into());
        self.recompute_offsets();
        Ok(())
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(data);
        id
    }

    fn position_of(&self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
        self.check(id)?;
        if id == self.root {
            return Err(TreeError::RootEdit);
        }
        let parent = self.parent(id).ok_or(TreeError::NoParent(id))?;
        let index = self
            .index_in_parent(id)
            .ok_or(TreeError::NoParent(id))?;
        Ok((parent, index))
    }

    fn check_insertable(&self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        if id == self.root {
            return Err(TreeError::RootEdit);
        }
        if self.parent(id).is_some() {
            return Err(TreeError::StillAttached(id));
        }
        Ok(())
    }

    /// Recomputes offsets and lengths of every attached node in one pass.
    fn recompute_offsets(&mut self) {
        let mut cursor = 0;
        let mut stack: Vec<(NodeId, usize)> = vec![(self.root, 0)];
        while let Some(&(id, next)) = stack.last() {
            let node = &mut self.nodes[id.index()];
            if let Some(text) = &node.text {
                let len = text.chars().count();
                node.offset = cursor;
                node.len = len;
                cursor += len;
                stack.pop();
                continue;
            }
            if next == 0 {
                node.offset = cursor;
            }
            if let Some(&child) = node.children.get(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                stack.push((child, 0));
            } else {
                node.len = cursor - node.offset;
                stack.pop();
            }
        }
    }
}

impl std::fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self.descendants(self.root) {
            if let Some(text) = self.leaf_text(node) {
                f.write_str(text)?;
            }
        }
        Ok(())
    }
}

/// Pre-order iterator returned by [`SyntaxTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
