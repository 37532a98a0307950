//! Closed enumeration of syntax categories.

use serde::{Deserialize, Serialize};

/// Version of the [`SyntaxKind`] enumeration.
///
/// Bumped whenever a variant is added, removed, or changes meaning, so that
/// parser adapters and rules can assert they were built against the same set.
pub const SYNTAX_KIND_VERSION: u32 = 1;

/// Syntax category of a node in a [`SyntaxTree`](super::SyntaxTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    /// Root of a source file.
    File,
    /// `package a.b.c`
    PackageDirective,
    /// Container for import directives.
    ImportList,
    /// `import a.b.C`
    ImportDirective,
    /// `@file:...` annotations at the top of a file.
    FileAnnotationList,
    /// A single annotation entry, e.g. `@Suppress("x")`.
    Annotation,
    /// Modifiers and annotations preceding a declaration.
    ModifierList,
    /// Class, interface, or object declaration.
    Class,
    /// Body of a class declaration.
    ClassBody,
    /// Function declaration.
    Function,
    /// Property declaration (`val`/`var`).
    Property,
    /// Parameter list of a function or class.
    ValueParameterList,
    /// A single declared parameter.
    ValueParameter,
    /// Argument list of a call or annotation.
    ValueArgumentList,
    /// A single argument in a call or annotation.
    ValueArgument,
    /// Block of statements.
    Block,
    /// Any expression without a more specific kind.
    Expression,
    /// Call expression.
    CallExpression,
    /// Expression prefixed with one or more annotations.
    AnnotatedExpression,
    /// String literal, possibly with templates.
    StringTemplate,
    /// Composite node the parser adapter could not classify.
    Node,
    /// Spaces, tabs, and newlines.
    Whitespace,
    /// `// ...` comment.
    EolComment,
    /// `/* ... */` comment, including documentation comments.
    BlockComment,
    /// Identifier token.
    Identifier,
    /// Keyword token.
    Keyword,
    /// Operator or punctuation token.
    Operator,
    /// Literal token (numbers, string content, characters).
    Literal,
    /// Leaf token the parser adapter could not classify.
    Token,
}

impl SyntaxKind {
    /// Returns true for comment kinds.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::EolComment | Self::BlockComment)
    }

    /// Returns true for whitespace and comments.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        self == Self::Whitespace || self.is_comment()
    }

    /// Returns true for declaration kinds that accept annotations.
    #[must_use]
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Function | Self::Property | Self::ValueParameter
        )
    }

    /// Returns true for expression kinds.
    #[must_use]
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            Self::Expression
                | Self::CallExpression
                | Self::AnnotatedExpression
                | Self::StringTemplate
        )
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
