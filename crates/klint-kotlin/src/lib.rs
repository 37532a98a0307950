//! # klint-kotlin
//!
//! Kotlin parser adapter for klint.
//!
//! Parses Kotlin source with Tree-sitter (`tree-sitter-kotlin-ng`) and
//! converts the concrete syntax tree into a [`klint_core::SyntaxTree`]:
//!
//! - grammar node kinds are mapped onto [`SyntaxKind`]
//! - text between tokens becomes whitespace leaves, so the leaves of the
//!   resulting tree concatenate to exactly the input
//! - `@file:` annotations are wrapped in a file annotation list
//!
//! ## Example
//!
//! ```ignore
//! use klint_core::SourceParser;
//! use klint_kotlin::KotlinParser;
//!
//! let tree = KotlinParser::new().parse("val a = 1\n", false)?;
//! assert_eq!(tree.source_text(), "val a = 1\n");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod kinds;

use klint_core::{ParseError, SourceParser, SyntaxKind, SyntaxTree, TreeBuilder};
use tracing::trace;
use tree_sitter::{Language, Node, Parser};

use kinds::Shape;

/// Parses Kotlin source files and scripts.
pub struct KotlinParser {
    language: Language,
}

impl KotlinParser {
    /// Creates a new Kotlin parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }
}

impl Default for KotlinParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KotlinParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KotlinParser").finish_non_exhaustive()
    }
}

impl SourceParser for KotlinParser {
    fn parse(&self, text: &str, _script: bool) -> Result<SyntaxTree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::new(1, 1, e.to_string()))?;
        let parsed = parser
            .parse(text, None)
            .ok_or_else(|| ParseError::new(1, 1, "parser returned no tree"))?;
        let root = parsed.root_node();

        if root.has_error() {
            return Err(first_error(root, text));
        }

        let mut adapter = Adapter {
            text,
            builder: TreeBuilder::new(),
            position: 0,
        };
        adapter.builder.start_node(SyntaxKind::File);
        adapter.children(root);
        adapter.gap(text.len());
        adapter.builder.finish_node();
        adapter
            .builder
            .finish()
            .map_err(|e| ParseError::new(1, 1, e.to_string()))
    }
}

/// Walks a Tree-sitter tree in document order, feeding a [`TreeBuilder`].
struct Adapter<'t> {
    text: &'t str,
    builder: TreeBuilder,
    /// Byte position up to which text has been emitted.
    position: usize,
}

impl Adapter<'_> {
    fn children(&mut self, node: Node<'_>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.node(child);
        }
    }

    fn node(&mut self, node: Node<'_>) {
        let (start, end) = (node.start_byte(), node.end_byte());
        if start == end || end <= self.position {
            return;
        }
        self.gap(start);

        let slice = &self.text[start..end];
        let leaf = node.child_count() == 0;
        match kinds::shape(node.kind(), node.is_named(), leaf, slice) {
            Shape::Leaf(kind) => {
                self.builder.token(kind, slice);
                self.position = end;
            }
            Shape::Node(kind) => {
                self.builder.start_node(kind);
                self.children(node);
                self.gap(end);
                self.builder.finish_node();
            }
            Shape::FileAnnotation => {
                self.builder
                    .start_node(SyntaxKind::FileAnnotationList)
                    .start_node(SyntaxKind::Annotation);
                self.children(node);
                self.gap(end);
                self.builder.finish_node().finish_node();
            }
            Shape::Transparent => {
                self.children(node);
                self.gap(end);
            }
        }
    }

    /// Emits the text between the last emitted token and `until`.
    fn gap(&mut self, until: usize) {
        if until <= self.position {
            return;
        }
        let text = &self.text[self.position..until];
        let kind = if text.chars().all(char::is_whitespace) {
            SyntaxKind::Whitespace
        } else {
            trace!("Unclassified text {:?} at byte {}", text, self.position);
            SyntaxKind::Token
        };
        self.builder.token(kind, text);
        self.position = until;
    }
}

/// Position and description of the first error or missing node.
fn first_error(root: Node<'_>, text: &str) -> ParseError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            let line_start = node.start_byte() - point.column;
            let column = text[line_start..node.start_byte()].chars().count() + 1;
            let message = if node.is_missing() {
                format!("Expecting '{}'", node.kind())
            } else {
                let found: String = text[node.start_byte()..node.end_byte()]
                    .chars()
                    .take(20)
                    .collect();
                format!("Unexpected '{}'", found.trim())
            };
            return ParseError::new(point.row + 1, column, message);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    ParseError::new(1, 1, "syntax error")
}
