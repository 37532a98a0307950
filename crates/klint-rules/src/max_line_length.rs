//! Rule to report lines exceeding `max_line_length`.
//!
//! The rule runs after all other rules so that it reports on their output.
//! Lines of package and import directives, lines holding only a comment, and
//! lines inside raw strings are exempt.

use klint_core::config::{PropertyDef, PropertyKind, PropertyValue};
use klint_core::{
    Capabilities, Flow, NodeId, Rule, RuleError, RuleId, SessionContext, SyntaxKind, SyntaxTree,
    VisitScope, VisitorModifier,
};

/// Rule id of max-line-length.
pub const ID: RuleId = RuleId::from_static("standard:max-line-length");

/// Excludes backticked identifiers from the measured line length.
pub const IGNORE_BACKTICKED_IDENTIFIER: &str = "ktlint_ignore_back_ticked_identifier";

/// Reports lines longer than the configured maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxLineLength;

impl MaxLineLength {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// A leaf with its char range.
struct Span {
    node: NodeId,
    start: usize,
    end: usize,
}

impl Rule for MaxLineLength {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Lines do not exceed max_line_length"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
            .lint_only()
            .with_config()
            .visit(VisitScope::RootOnly)
    }

    fn visitor_modifiers(&self) -> Vec<VisitorModifier> {
        vec![VisitorModifier::RunAsLateAsPossible]
    }

    fn config_properties(&self) -> Vec<PropertyDef> {
        vec![PropertyDef {
            name: IGNORE_BACKTICKED_IDENTIFIER,
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(false),
            description: "Ignore backticked identifiers when measuring lines",
        }]
    }

    fn visit(&self, root: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let Some(max) = ctx.config().max_line_length() else {
            return Ok(Flow::Continue);
        };
        let ignore_backticked = ctx
            .config()
            .get_bool(IGNORE_BACKTICKED_IDENTIFIER)
            .unwrap_or(false);
        let tree = ctx.tree();

        let mut spans = Vec::new();
        let mut offset = 0;
        for node in tree.descendants(root).filter(|&n| tree.is_leaf(n)) {
            let len = tree.text_len(node);
            spans.push(Span {
                node,
                start: offset,
                end: offset + len,
            });
            offset += len;
        }

        let mut line_start = 0;
        let mut first = 0;
        for line in tree.source_text().split('\n') {
            let line_len = line.chars().count();
            let line_end = line_start + line_len;
            while first < spans.len() && spans[first].end <= line_start {
                first += 1;
            }
            let on_line: Vec<&Span> = spans[first..]
                .iter()
                .take_while(|s| s.start <= line_end)
                .filter(|s| s.end > line_start)
                .collect();

            let length = if ignore_backticked {
                line_len - backticked_length(tree, &on_line, line_start, line_end)
            } else {
                line_len
            };

            if length > max && !is_exempt(tree, &on_line) {
                let anchor = on_line
                    .iter()
                    .find(|s| tree.kind(s.node) != SyntaxKind::Whitespace)
                    .or(on_line.first());
                if let Some(anchor) = anchor {
                    ctx.emit_at(
                        anchor.node,
                        line_start + max,
                        format!("Exceeded max line length ({max})"),
                        false,
                    );
                }
            }
            line_start = line_end + 1;
        }
        Ok(Flow::Continue)
    }
}

fn is_exempt(tree: &SyntaxTree, on_line: &[&Span]) -> bool {
    let tokens: Vec<NodeId> = on_line
        .iter()
        .map(|s| s.node)
        .filter(|&n| tree.kind(n) != SyntaxKind::Whitespace)
        .collect();
    if tokens.is_empty() {
        return false;
    }
    if tokens.iter().all(|&n| tree.kind(n).is_comment()) {
        return true;
    }
    tokens.iter().any(|&n| {
        tree.ancestors(n).any(|a| {
            matches!(
                tree.kind(a),
                SyntaxKind::PackageDirective | SyntaxKind::ImportDirective
            ) || is_raw_string(tree, a)
        })
    })
}

fn is_raw_string(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.kind(node) == SyntaxKind::StringTemplate && {
        let text = tree.text(node);
        text.starts_with("\"\"\"") && text.contains('\n')
    }
}

/// Chars taken on the line by backticked identifiers.
fn backticked_length(tree: &SyntaxTree, on_line: &[&Span], line_start: usize, line_end: usize) -> usize {
    on_line
        .iter()
        .filter(|s| s.start >= line_start && s.end <= line_end)
        .filter(|s| tree.kind(s.node) == SyntaxKind::Identifier)
        .filter(|s| {
            tree.leaf_text(s.node)
                .is_some_and(|t| t.len() >= 2 && t.starts_with('`') && t.ends_with('`'))
        })
        .map(|s| s.end - s.start)
        .sum()
}
