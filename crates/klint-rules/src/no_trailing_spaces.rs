//! Rule to remove spaces at the end of lines.
//!
//! Whitespace and comments are inspected line by line. The last line of a
//! whitespace leaf is the indentation of the next token and is left alone,
//! unless the leaf ends the file.

use klint_core::{Edit, Flow, NodeId, Rule, RuleError, RuleId, SessionContext, SyntaxKind};

/// Rule id of no-trailing-spaces.
pub const ID: RuleId = RuleId::from_static("standard:no-trailing-spaces");

/// Removes trailing spaces and tabs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrailingSpaces;

impl NoTrailingSpaces {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoTrailingSpaces {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Lines must not end with spaces"
    }

    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        let kind = tree.kind(node);
        if !kind.is_trivia() || !tree.is_leaf(node) {
            return Ok(Flow::Continue);
        }
        let Some(text) = tree.leaf_text(node) else {
            return Ok(Flow::Continue);
        };

        let keep_last = kind != SyntaxKind::EolComment && tree.next_leaf(node).is_some();
        let lines: Vec<&str> = text.split('\n').collect();
        let mut offset = tree.offset(node);
        let mut fixed = Vec::with_capacity(lines.len());
        let mut fix = false;

        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() == line.len() || (keep_last && i == lines.len() - 1) {
                fixed.push(*line);
            } else {
                let at = offset + trimmed.chars().count();
                fix |= ctx.emit_at(node, at, "Trailing space(s)", true);
                fixed.push(trimmed);
            }
            offset += line.chars().count() + 1;
        }

        if fix {
            ctx.edit(Edit::SetText {
                leaf: node,
                text: fixed.join("\n"),
            });
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{format, lint, positions};

    #[test]
    fn detects_spaces_before_newline() {
        let violations = lint(Box::new(NoTrailingSpaces), "val a = 1  \nval b = 2\n");
        assert_eq!(positions(&violations), [(1, 10, "Trailing space(s)")]);
        assert!(violations[0].can_be_autocorrected);
    }

    #[test]
    fn keeps_indentation_of_next_line() {
        let code = "fun foo() {\n    val a = 1\n}\n";
        assert!(lint(Box::new(NoTrailingSpaces), code).is_empty());
    }

    #[test]
    fn removes_spaces_on_blank_lines_and_after_comments() {
        let code = "fun foo() {\n    val a = 1 // note  \n    \n    val b = 2\n}\n";
        insta::assert_snapshot!(format(Box::new(NoTrailingSpaces), code), @r"
        fun foo() {
            val a = 1 // note

            val b = 2
        }
        ");
    }

    #[test]
    fn removes_spaces_at_end_of_file() {
        assert_eq!(format(Box::new(NoTrailingSpaces), "val a = 1\n  "), "val a = 1\n");
    }
}
