//! Rule to collapse runs of spaces between tokens.

use klint_core::{
    Edit, Flow, NodeId, Rule, RuleError, RuleId, RunAfterMode, SessionContext, SyntaxKind,
    VisitorModifier,
};

/// Rule id of no-multi-spaces.
pub const ID: RuleId = RuleId::from_static("standard:no-multi-spaces");

/// Replaces a run of spaces inside a line by a single space.
///
/// Indentation is never touched, and neither is whitespace ending the file,
/// which is left to [`NoTrailingSpaces`](crate::NoTrailingSpaces).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMultiSpaces;

impl NoMultiSpaces {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoMultiSpaces {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Tokens are separated by a single space"
    }

    fn visitor_modifiers(&self) -> Vec<VisitorModifier> {
        vec![VisitorModifier::RunAfter {
            rule_id: crate::no_trailing_spaces::ID,
            mode: RunAfterMode::Regardless,
        }]
    }

    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != SyntaxKind::Whitespace {
            return Ok(Flow::Continue);
        }
        let Some(text) = tree.leaf_text(node) else {
            return Ok(Flow::Continue);
        };
        if text.contains('\n') || text.chars().count() < 2 || tree.next_leaf(node).is_none() {
            return Ok(Flow::Continue);
        }
        // Whitespace opening a line is indentation.
        if tree
            .prev_leaf(node)
            .map_or(true, |prev| tree.leaf_text(prev).is_some_and(|t| t.ends_with('\n')))
        {
            return Ok(Flow::Continue);
        }

        let offset = tree.offset(node) + 1;
        if ctx.emit_at(node, offset, "Unnecessary long whitespace", true) {
            ctx.edit(Edit::SetText {
                leaf: node,
                text: " ".to_string(),
            });
        }
        Ok(Flow::Continue)
    }
}
