//! Rule to collapse runs of blank lines.
//!
//! At most one blank line may separate two tokens. At the end of the file no
//! blank line is allowed after the final newline.

use klint_core::{Edit, Flow, NodeId, Rule, RuleError, RuleId, SessionContext, SyntaxKind};

/// Rule id of no-consecutive-blank-lines.
pub const ID: RuleId = RuleId::from_static("standard:no-consecutive-blank-lines");

/// Removes needless blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConsecutiveBlankLines;

impl NoConsecutiveBlankLines {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoConsecutiveBlankLines {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Consecutive blank lines are not allowed"
    }

    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != SyntaxKind::Whitespace {
            return Ok(Flow::Continue);
        }
        let Some(text) = tree.leaf_text(node) else {
            return Ok(Flow::Continue);
        };

        let at_end = tree.next_leaf(node).is_none();
        let allowed = if at_end { 1 } else { 2 };
        let lines: Vec<&str> = text.split('\n').collect();
        if lines.len() - 1 <= allowed {
            return Ok(Flow::Continue);
        }

        let offset = tree.offset(node) + lines[0].chars().count() + lines[1].chars().count() + 2;
        if ctx.emit_at(node, offset, "Needless blank line(s)", true) {
            let first = lines[0];
            let last = lines[lines.len() - 1];
            let text = if at_end {
                format!("{first}\n")
            } else {
                format!("{first}\n\n{last}")
            };
            ctx.edit(Edit::SetText { leaf: node, text });
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{format, lint, positions};

    #[test]
    fn reports_each_run_of_blank_lines() {
        let code = "package com.test\n\n\nimport com.test.util\n\n\nval a = \"a\"\n\n\n\nfun b() {\n}\n";
        let violations = lint(Box::new(NoConsecutiveBlankLines), code);
        assert_eq!(
            positions(&violations),
            [
                (3, 1, "Needless blank line(s)"),
                (6, 1, "Needless blank line(s)"),
                (9, 1, "Needless blank line(s)"),
            ]
        );
    }

    #[test]
    fn keeps_single_blank_line_and_indentation() {
        let code = "class A {\n    val a = 1\n\n\n\n    val b = 2\n}\n";
        insta::assert_snapshot!(format(Box::new(NoConsecutiveBlankLines), code), @r"
        class A {
            val a = 1

            val b = 2
        }
        ");
    }

    #[test]
    fn blank_lines_at_end_of_file() {
        let code = "fun main() {\n}\n\n";
        let violations = lint(Box::new(NoConsecutiveBlankLines), code);
        assert_eq!(positions(&violations), [(4, 1, "Needless blank line(s)")]);
        assert_eq!(format(Box::new(NoConsecutiveBlankLines), code), "fun main() {\n}\n");
    }

    #[test]
    fn blank_lines_inside_strings_are_kept() {
        let code = "val s = \"\"\"\n\n\n\"\"\"\n";
        assert!(lint(Box::new(NoConsecutiveBlankLines), code).is_empty());
    }
}
