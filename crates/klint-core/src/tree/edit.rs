//! Deferred structural edits.
//!
//! Rules describe edits against node identities; the engine applies them
//! between callbacks. New subtrees are described as [`Fragment`]s and only
//! materialized in the arena when the edit is applied.

use super::{NodeId, SyntaxKind, SyntaxTree, TreeError};

/// Description of a subtree to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A new leaf.
    Leaf {
        /// Kind of the leaf.
        kind: SyntaxKind,
        /// Text of the leaf.
        text: String,
    },
    /// A new composite node.
    Node {
        /// Kind of the node.
        kind: SyntaxKind,
        /// Children, in order.
        children: Vec<Fragment>,
    },
    /// An existing node, moved to the new position.
    ///
    /// The node must be detached when the edit is applied, or be the target of
    /// the [`Edit::Replace`] carrying it.
    Existing(NodeId),
}

impl Fragment {
    /// Shorthand for [`Fragment::Leaf`].
    #[must_use]
    pub fn leaf(kind: SyntaxKind, text: impl Into<String>) -> Self {
        Self::Leaf {
            kind,
            text: text.into(),
        }
    }

    /// Shorthand for [`Fragment::Node`].
    #[must_use]
    pub fn node(kind: SyntaxKind, children: Vec<Fragment>) -> Self {
        Self::Node { kind, children }
    }

    /// Shorthand for a whitespace leaf.
    #[must_use]
    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::leaf(SyntaxKind::Whitespace, text)
    }

    /// A new subtree with the same shape and text as `id`.
    #[must_use]
    pub fn copy(tree: &SyntaxTree, id: NodeId) -> Self {
        match tree.leaf_text(id) {
            Some(text) => Self::leaf(tree.kind(id), text),
            None => Self::node(
                tree.kind(id),
                tree.children(id)
                    .iter()
                    .map(|&child| Self::copy(tree, child))
                    .collect(),
            ),
        }
    }

    fn existing(&self, out: &mut Vec<NodeId>) {
        match self {
            Self::Leaf { .. } => {}
            Self::Node { children, .. } => {
                for child in children {
                    child.existing(out);
                }
            }
            Self::Existing(id) => out.push(*id),
        }
    }
}

/// A structural edit queued by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Insert new nodes before `anchor`.
    InsertBefore {
        /// Sibling to insert before.
        anchor: NodeId,
        /// Nodes to insert.
        nodes: Vec<Fragment>,
    },
    /// Insert new nodes after `anchor`.
    InsertAfter {
        /// Sibling to insert after.
        anchor: NodeId,
        /// Nodes to insert.
        nodes: Vec<Fragment>,
    },
    /// Insert new nodes as children of `parent` at `index`.
    InsertChildren {
        /// Parent node.
        parent: NodeId,
        /// Child position; the child count appends.
        index: usize,
        /// Nodes to insert.
        nodes: Vec<Fragment>,
    },
    /// Detach a node.
    Remove(NodeId),
    /// Replace a node with new nodes.
    Replace {
        /// Node to replace.
        target: NodeId,
        /// Replacement nodes; may move `target` itself via [`Fragment::Existing`].
        with: Vec<Fragment>,
    },
    /// Change the text of a leaf.
    SetText {
        /// Leaf to change.
        leaf: NodeId,
        /// New text.
        text: String,
    },
}

impl Edit {
    /// The node whose position the edit is relative to.
    #[must_use]
    pub fn anchor(&self) -> NodeId {
        match self {
            Self::InsertBefore { anchor, .. } | Self::InsertAfter { anchor, .. } => *anchor,
            Self::InsertChildren { parent, .. } => *parent,
            Self::Remove(target) | Self::Replace { target, .. } => *target,
            Self::SetText { leaf, .. } => *leaf,
        }
    }
}

impl SyntaxTree {
    /// Applies a queued edit.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Detached`] when the anchor is no longer part of the
    /// tree, or any error of the underlying structural operation.
    pub fn apply(&mut self, edit: Edit) -> Result<(), TreeError> {
        let anchor = edit.anchor();
        if !self.is_attached(anchor) {
            return Err(TreeError::Detached(anchor));
        }
        match edit {
            Edit::InsertBefore { anchor, nodes } => {
                let nodes = self.materialize_all(nodes)?;
                self.insert_before(anchor, nodes)
            }
            Edit::InsertAfter { anchor, nodes } => {
                let nodes = self.materialize_all(nodes)?;
                self.insert_after(anchor, nodes)
            }
            Edit::InsertChildren {
                parent,
                index,
                nodes,
            } => {
                let nodes = self.materialize_all(nodes)?;
                self.insert_children(parent, index, nodes)
            }
            Edit::Remove(target) => self.remove(target),
            Edit::Replace { target, with } => {
                let mut moved = Vec::new();
                for fragment in &with {
                    fragment.existing(&mut moved);
                }
                for &id in &moved {
                    self.check(id)?;
                    if id != target && self.parent(id).is_some() {
                        return Err(TreeError::StillAttached(id));
                    }
                }
                let (parent, index) = self.position_of(target)?;
                self.splice(parent, index..index + 1, Vec::new())?;
                let nodes = self.materialize_all(with)?;
                self.insert_children(parent, index, nodes)
            }
            Edit::SetText { leaf, text } => self.set_leaf_text(leaf, text),
        }
    }

    fn materialize_all(&mut self, fragments: Vec<Fragment>) -> Result<Vec<NodeId>, TreeError> {
        fragments
            .into_iter()
            .map(|f| self.materialize(f))
            .collect()
    }

    fn materialize(&mut self, fragment: Fragment) -> Result<NodeId, TreeError> {
        match fragment {
            Fragment::Leaf { kind, text } => Ok(self.new_leaf(kind, text)),
            Fragment::Node { kind, children } => {
                let children = self.materialize_all(children)?;
                self.new_node(kind, children)
            }
            Fragment::Existing(id) => {
                self.check_insertable(id)?;
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    /// `{ foo() }` as a block with one call statement.
    fn block() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.start_node(SyntaxKind::File)
            .start_node(SyntaxKind::Block)
            .token(SyntaxKind::Operator, "{")
            .token(SyntaxKind::Whitespace, "\n    ")
            .start_node(SyntaxKind::CallExpression)
            .token(SyntaxKind::Identifier, "foo")
            .token(SyntaxKind::Operator, "()")
            .finish_node()
            .token(SyntaxKind::Whitespace, "\n")
            .token(SyntaxKind::Operator, "}")
            .finish_node()
            .finish_node();
        b.finish().unwrap()
    }

    #[test]
    fn replace_can_wrap_target() {
        let mut tree = block();
        let block = tree.children(tree.root())[0];
        let call = tree.children(block)[2];
        tree.apply(Edit::Replace {
            target: call,
            with: vec![Fragment::node(
                SyntaxKind::AnnotatedExpression,
                vec![
                    Fragment::leaf(SyntaxKind::Annotation, "@A"),
                    Fragment::whitespace("\n    "),
                    Fragment::Existing(call),
                ],
            )],
        })
        .unwrap();
        assert_eq!(tree.source_text(), "{\n    @A\n    foo()\n}");
        let wrapper = tree.parent(call).unwrap();
        assert_eq!(tree.kind(wrapper), SyntaxKind::AnnotatedExpression);
        assert_eq!(tree.parent(wrapper), Some(block));
    }

    #[test]
    fn edits_on_detached_nodes_fail() {
        let mut tree = block();
        let block = tree.children(tree.root())[0];
        let call = tree.children(block)[2];
        tree.apply(Edit::Remove(call)).unwrap();
        assert_eq!(
            tree.apply(Edit::Remove(call)),
            Err(TreeError::Detached(call))
        );
        let name = tree.children(call)[0];
        assert_eq!(
            tree.apply(Edit::SetText {
                leaf: name,
                text: "bar".to_string()
            }),
            Err(TreeError::Detached(name))
        );
        assert_eq!(tree.source_text(), "{\n    \n}");
    }

    #[test]
    fn insert_children_appends() {
        let mut tree = block();
        let root = tree.root();
        tree.apply(Edit::InsertChildren {
            parent: root,
            index: 1,
            nodes: vec![Fragment::whitespace("\n")],
        })
        .unwrap();
        assert_eq!(tree.source_text(), "{\n    foo()\n}\n");
    }
}
