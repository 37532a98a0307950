//! Contract for turning source text into a [`SyntaxTree`].

use thiserror::Error;

use crate::tree::SyntaxTree;

/// The source text could not be parsed into a complete tree.
///
/// Parsers report the first syntax error only; sessions never run on a
/// partially parsed tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Not a valid Kotlin file ({line}:{column} {message})")]
pub struct ParseError {
    /// Line of the first error (1-indexed).
    pub line: usize,
    /// Column of the first error (1-indexed).
    pub column: usize,
    /// Description of the error.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error at a position.
    #[must_use]
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A parser producing trees the engine can run on.
///
/// Implementations must produce trees whose leaf text concatenates to exactly
/// the input.
pub trait SourceParser: Send + Sync {
    /// Parses `text`.
    ///
    /// `script` selects the script grammar (`.kts` files) where the parser
    /// distinguishes it.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the text contains a syntax error.
    fn parse(&self, text: &str, script: bool) -> Result<SyntaxTree, ParseError>;
}
