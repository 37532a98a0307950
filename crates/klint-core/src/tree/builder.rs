//! Incremental construction of a [`SyntaxTree`].

use super::{NodeData, NodeId, SyntaxKind, SyntaxTree, TreeError};

/// Builds a tree from a stream of start/token/finish events.
///
/// Parser adapters drive the builder in document order; the first call to
/// [`TreeBuilder::start_node`] opens the root.
///
/// # Example
///
/// ```ignore
/// let mut b = TreeBuilder::new();
/// b.start_node(SyntaxKind::File)
///     .token(SyntaxKind::Keyword, "val")
///     .finish_node();
/// let tree = b.finish()?;
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
    root: Option<NodeId>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a composite node as the last child of the current node.
    pub fn start_node(&mut self, kind: SyntaxKind) -> &mut Self {
        let parent = self.open.last().copied();
        if parent.is_none() && self.root.is_some() {
            self.fail("a second root was started");
            return self;
        }
        let id = self.push(kind, parent, None);
        if parent.is_none() {
            self.root = Some(id);
        }
        self.open.push(id);
        self
    }

    /// Appends a leaf to the current node.
    pub fn token(&mut self, kind: SyntaxKind, text: impl Into<String>) -> &mut Self {
        match self.open.last().copied() {
            Some(parent) => {
                self.push(kind, Some(parent), Some(text.into()));
            }
            None => self.fail("token outside of any node"),
        }
        self
    }

    /// Closes the current node.
    pub fn finish_node(&mut self) -> &mut Self {
        if self.open.pop().is_none() {
            self.fail("finish_node without a matching start_node");
        }
        self
    }

    /// Completes the tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Unbalanced`] if nodes are still open, no root was
    /// started, or an earlier call misused the builder.
    pub fn finish(self) -> Result<SyntaxTree, TreeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.open.is_empty() {
            return Err(TreeError::Unbalanced(format!(
                "{} node(s) left open",
                self.open.len()
            )));
        }
        let root = self
            .root
            .ok_or_else(|| TreeError::Unbalanced("no root node".to_string()))?;
        Ok(SyntaxTree::from_parts(self.nodes, root))
    }

    fn push(&mut self, kind: SyntaxKind, parent: Option<NodeId>, text: Option<String>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            text,
            offset: 0,
            len: 0,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn fail(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(TreeError::Unbalanced(message.to_string()));
        }
    }
}
