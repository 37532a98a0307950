//! Rule enforcing the `insert_final_newline` setting.

use klint_core::config::INSERT_FINAL_NEWLINE;
use klint_core::{
    Capabilities, Edit, Flow, Fragment, NodeId, Rule, RuleError, RuleId, SessionContext,
    SyntaxKind, VisitScope,
};
use tracing::trace;

/// Rule id of final-newline.
pub const ID: RuleId = RuleId::from_static("standard:final-newline");

/// Adds or removes the newline at the end of the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalNewline;

impl FinalNewline {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for FinalNewline {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Files end with a newline, unless configured otherwise"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
            .with_config()
            .visit(VisitScope::RootOnlyRunLast)
    }

    fn visit(&self, root: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        let Some(last) = tree.last_leaf(root) else {
            return Ok(Flow::Continue);
        };
        let last_text = tree.leaf_text(last).unwrap_or_default();
        let is_whitespace = tree.kind(last) == SyntaxKind::Whitespace;

        if ctx.config().insert_final_newline() {
            if last_text.ends_with('\n') {
                return Ok(Flow::Continue);
            }
            if ctx.emit(root, "File must end with a newline (\\n)", true) {
                if is_whitespace {
                    ctx.edit(Edit::SetText {
                        leaf: last,
                        text: format!("{last_text}\n"),
                    });
                } else {
                    let index = tree.children(root).len();
                    ctx.edit(Edit::InsertChildren {
                        parent: root,
                        index,
                        nodes: vec![Fragment::whitespace("\n")],
                    });
                }
            }
        } else if is_whitespace && last_text.ends_with('\n') {
            trace!("'{}' is false, trailing newline found", INSERT_FINAL_NEWLINE);
            if ctx.emit(last, "Redundant newline (\\n) at the end of file", true) {
                let trimmed = last_text.trim_end_matches('\n');
                if trimmed.is_empty() {
                    ctx.edit(Edit::Remove(last));
                } else {
                    ctx.edit(Edit::SetText {
                        leaf: last,
                        text: trimmed.to_string(),
                    });
                }
            }
        }
        Ok(Flow::Continue)
    }
}
