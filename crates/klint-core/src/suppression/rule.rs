use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::plan::Plan;
use crate::engine::SessionContext;
use crate::rule::{Capabilities, Flow, Rule, RuleError, RuleId, VisitScope};
use crate::tree::NodeId;

/// Id of the internal rule migrating legacy directives.
pub const SUPPRESSION_RULE_ID: RuleId = RuleId::from_static("internal:ktlint-suppression");

/// Reports legacy `ktlint-disable` / `ktlint-enable` directives and rule ids
/// in suppression annotations that are not fully qualified, and migrates
/// both in format mode.
///
/// The rule visits the root only and plans the whole migration on the
/// unmodified tree. It cannot be disabled and its violations cannot be
/// suppressed.
#[derive(Debug, Clone, Default)]
pub struct SuppressionRule {
    known: BTreeSet<RuleId>,
}

impl SuppressionRule {
    /// Creates the rule for the given loaded rules.
    #[must_use]
    pub fn new(known: BTreeSet<RuleId>) -> Self {
        Self { known }
    }
}

impl Rule for SuppressionRule {
    fn id(&self) -> RuleId {
        SUPPRESSION_RULE_ID
    }

    fn description(&self) -> &'static str {
        "Replaces ktlint-disable and ktlint-enable directives with @Suppress annotations"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default().visit(VisitScope::RootOnly)
    }

    fn visit(&self, _node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        let plan = Plan::build(tree, &self.known);
        if plan.findings().is_empty() {
            return Ok(Flow::Continue);
        }

        let mut approved = HashSet::new();
        for finding in plan.findings() {
            let fix = ctx.emit_at(
                finding.node,
                finding.offset,
                finding.message.clone(),
                finding.can_autocorrect,
            );
            if let Some(index) = finding.fix.filter(|_| fix) {
                approved.insert(index);
            }
        }

        let edits = plan.edits(tree, &approved);
        debug!("Migrating suppressions with {} edit(s)", edits.len());
        for edit in edits {
            ctx.edit(edit);
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSnapshot;
    use crate::engine::{Engine, Mode, SessionOutcome};
    use crate::registry::RuleRegistry;
    use crate::suppression::annotation;
    use crate::suppression::plan::{
        DANGLING, DEPRECATED, DEPRECATED_UNMATCHED, NOT_QUALIFIED, OBSOLETE_ENABLE,
    };
    use crate::tree::fixture::*;
    use crate::tree::{Fragment, SyntaxKind, SyntaxTree};
    use crate::types::Violation;

    /// Reports every node of one kind.
    struct Flag(&'static str, SyntaxKind);

    impl Rule for Flag {
        fn id(&self) -> RuleId {
            RuleId::from_static(self.0)
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::default().lint_only()
        }

        fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
            if ctx.tree().kind(node) == self.1 {
                ctx.emit(node, "flagged", false);
            }
            Ok(Flow::Continue)
        }
    }

    fn registry() -> RuleRegistry {
        RuleRegistry::new(vec![
            Box::new(Flag("standard:foo", SyntaxKind::Property)),
            Box::new(Flag("standard:no-wildcard-imports", SyntaxKind::ImportDirective)),
        ])
        .unwrap()
    }

    fn run(tree: &mut SyntaxTree, mode: Mode) -> SessionOutcome {
        let registry = registry();
        let config = ConfigSnapshot::default();
        Engine::new(&registry, &config, mode).run(tree)
    }

    fn internal(outcome: &SessionOutcome) -> Vec<&Violation> {
        outcome
            .violations
            .iter()
            .filter(|v| v.rule == SUPPRESSION_RULE_ID)
            .collect()
    }

    fn messages(outcome: &SessionOutcome) -> Vec<&str> {
        internal(outcome)
            .into_iter()
            .map(|v| v.message.as_str())
            .collect()
    }

    fn file_suppress(entries: &[&str]) -> Fragment {
        let entries = entries.iter().map(|e| (*e).to_string()).collect();
        Fragment::node(
            SyntaxKind::FileAnnotationList,
            vec![annotation::build("Suppress", &entries, true)],
        )
    }

    #[test]
    fn eol_directive_becomes_annotation_on_declaration() {
        let mut tree = tree(file(vec![
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:foo"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@Suppress(\"ktlint:standard:foo\")\nval foo = \"foo\""
        );
        assert_eq!(outcome.violations.len(), 1);
        let violation = &outcome.violations[0];
        assert_eq!(violation.rule, SUPPRESSION_RULE_ID);
        assert_eq!(violation.message, DEPRECATED);
        assert_eq!((violation.location.line, violation.location.column), (1, 20));
        assert_eq!(violation.location.offset, 19);
        assert!(violation.corrected);
    }

    #[test]
    fn eol_directive_on_import_becomes_file_annotation() {
        let mut tree = tree(file(vec![
            import("foo.bar"),
            ws("\n"),
            import("foobar.*"),
            ws(" "),
            eol("// ktlint-disable no-wildcard-imports"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@file:Suppress(\"ktlint:standard:no-wildcard-imports\")\n\nimport foo.bar\nimport foobar.*"
        );
        assert_eq!(messages(&outcome), [DEPRECATED]);
        assert!(outcome
            .violations
            .iter()
            .all(|v| v.rule.as_str() != "standard:no-wildcard-imports"));
    }

    #[test]
    fn lone_block_directive_suppresses_the_file() {
        let mut tree = tree(file(vec![block_comment("/* ktlint-disable */")]));
        run(&mut tree, Mode::Format);
        assert_eq!(tree.source_text(), "@file:Suppress(\"ktlint\")");
    }

    #[test]
    fn unknown_ids_are_reported_and_dropped() {
        let mut tree = tree(file(vec![
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:unknown-rule-id"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(tree.source_text(), "val foo = \"foo\"");
        let internal = internal(&outcome);
        assert_eq!(internal.len(), 2);
        assert_eq!(internal[0].message, DEPRECATED);
        assert!(internal[0].corrected);
        assert_eq!(
            internal[1].message,
            "Ktlint rule with id 'standard:unknown-rule-id' is unknown or not loaded"
        );
        assert_eq!(internal[1].location.column, 35);
        assert!(!internal[1].can_be_autocorrected);
        assert!(!internal[1].corrected);
    }

    #[test]
    fn ids_merge_into_existing_annotation() {
        let mut tree = tree(file(vec![
            val_with(
                vec![
                    modifiers(vec![annotation("Suppress", &["zzz", "aaa"])]),
                    ws("\n"),
                ],
                "foo",
                "foo",
            ),
            ws(" "),
            eol("// ktlint-disable standard:foo"),
        ]));
        run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@Suppress(\"aaa\", \"ktlint:standard:foo\", \"zzz\")\nval foo = \"foo\""
        );
        let annotations = tree
            .descendants(tree.root())
            .filter(|&n| tree.kind(n) == SyntaxKind::Annotation)
            .count();
        assert_eq!(annotations, 1);
    }

    #[test]
    fn ids_already_suppressed_by_an_ancestor_are_not_added() {
        let mut tree = tree(file(vec![
            file_suppress(&["ktlint"]),
            ws("\n\n"),
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:foo"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@file:Suppress(\"ktlint\")\n\nval foo = \"foo\""
        );
        assert_eq!(messages(&outcome), [DEPRECATED]);
    }

    #[test]
    fn block_pair_around_one_declaration() {
        let mut tree = tree(file(vec![fun(
            "foo",
            vec![
                ws("\n    "),
                block_comment("/* ktlint-disable standard:foo */"),
                ws("\n    "),
                val("a", "x"),
                ws("\n    "),
                block_comment("/* ktlint-enable standard:foo */"),
                ws("\n"),
            ],
        )]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "fun foo() {\n    @Suppress(\"ktlint:standard:foo\")\n    val a = \"x\"\n}"
        );
        assert_eq!(messages(&outcome), [DEPRECATED, OBSOLETE_ENABLE]);
    }

    #[test]
    fn block_pair_around_several_statements_moves_to_the_function() {
        let mut tree = tree(file(vec![fun(
            "foo",
            vec![
                ws("\n    "),
                block_comment("/* ktlint-disable standard:foo */"),
                ws("\n    "),
                call("bar"),
                ws("\n    "),
                call("baz"),
                ws("\n    "),
                block_comment("/* ktlint-enable standard:foo */"),
                ws("\n"),
            ],
        )]));
        run(&mut tree, Mode::Format);

        insta::assert_snapshot!(tree.source_text(), @r#"
        @Suppress("ktlint:standard:foo")
        fun foo() {
            bar()
            baz()
        }
        "#);
    }

    #[test]
    fn block_pairs_nest_by_id_set() {
        let mut tree = tree(file(vec![fun(
            "foo",
            vec![
                ws("\n    "),
                block_comment("/* ktlint-disable standard:foo */"),
                ws("\n    "),
                block_comment("/* ktlint-disable standard:no-wildcard-imports */"),
                ws("\n    "),
                call("bar"),
                ws("\n    "),
                block_comment("/* ktlint-enable standard:no-wildcard-imports */"),
                ws("\n    "),
                call("baz"),
                ws("\n    "),
                block_comment("/* ktlint-enable standard:foo */"),
                ws("\n"),
            ],
        )]));
        let outcome = run(&mut tree, Mode::Format);

        insta::assert_snapshot!(tree.source_text(), @r#"
        @Suppress("ktlint:standard:foo")
        fun foo() {
            @Suppress("ktlint:standard:no-wildcard-imports")
            bar()
            baz()
        }
        "#);
        assert_eq!(
            messages(&outcome),
            [DEPRECATED, DEPRECATED, OBSOLETE_ENABLE, OBSOLETE_ENABLE]
        );
    }

    #[test]
    fn leading_directive_of_declaration_pairs_with_following_enable() {
        let mut tree = tree(file(vec![
            val_with(
                vec![
                    block_comment("/* ktlint-disable standard:foo */"),
                    ws("\n"),
                ],
                "a",
                "x",
            ),
            ws("\n"),
            block_comment("/* ktlint-enable standard:foo */"),
            ws("\n"),
            val("b", "y"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@Suppress(\"ktlint:standard:foo\")\nval a = \"x\"\nval b = \"y\""
        );
        let flagged: Vec<usize> = outcome
            .violations
            .iter()
            .filter(|v| v.rule.as_str() == "standard:foo")
            .map(|v| v.location.line)
            .collect();
        assert_eq!(flagged, [3]);
    }

    #[test]
    fn disable_without_enable_in_same_scope_is_kept() {
        let mut tree = tree(file(vec![
            fun(
                "foo",
                vec![
                    ws("\n    "),
                    block_comment("/* ktlint-disable standard:foo */"),
                    ws("\n    "),
                    val("a", "x"),
                    ws("\n"),
                ],
            ),
            ws("\n"),
            block_comment("/* ktlint-enable standard:foo */"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "fun foo() {\n    /* ktlint-disable standard:foo */\n    val a = \"x\"\n}"
        );
        let internal = internal(&outcome);
        assert_eq!(internal.len(), 2);
        assert_eq!(internal[0].message, DEPRECATED_UNMATCHED);
        assert!(!internal[0].can_be_autocorrected);
        assert!(!internal[0].corrected);
        assert_eq!(internal[1].message, OBSOLETE_ENABLE);
        assert!(internal[1].corrected);
        assert!(outcome
            .violations
            .iter()
            .all(|v| v.rule.as_str() != "standard:foo"));
    }

    #[test]
    fn dangling_eol_directive_is_removed() {
        let mut tree = tree(file(vec![
            val("a", "x"),
            ws("\n"),
            eol("// ktlint-disable standard:foo"),
            ws("\n"),
            val("b", "y"),
        ]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(tree.source_text(), "val a = \"x\"\nval b = \"y\"");
        assert_eq!(messages(&outcome), [DANGLING]);
        let flagged = outcome
            .violations
            .iter()
            .filter(|v| v.rule.as_str() == "standard:foo")
            .count();
        assert_eq!(flagged, 2);
    }

    #[test]
    fn annotation_ids_are_qualified() {
        let mut tree = tree(file(vec![val_with(
            vec![annotation("Suppress", &["ktlint:foo"]), ws("\n")],
            "a",
            "x",
        )]));
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(
            tree.source_text(),
            "@Suppress(\"ktlint:standard:foo\")\nval a = \"x\""
        );
        let internal = internal(&outcome);
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].message, NOT_QUALIFIED);
        assert_eq!(internal[0].location.column, 12);
        assert!(internal[0].corrected);
    }

    #[test]
    fn unknown_annotation_ids_are_reported_but_kept() {
        let mut tree = tree(file(vec![val_with(
            vec![annotation("Suppress", &["ktlint:standard:nope"]), ws("\n")],
            "a",
            "x",
        )]));
        let before = tree.source_text();
        let outcome = run(&mut tree, Mode::Format);

        assert_eq!(tree.source_text(), before);
        assert_eq!(
            messages(&outcome),
            ["Ktlint rule with id 'ktlint:standard:nope' is unknown or not loaded"]
        );
        assert!(!internal(&outcome)[0].can_be_autocorrected);
    }

    #[test]
    fn lint_reports_without_migrating_and_still_filters() {
        let mut tree = tree(file(vec![
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:foo"),
            ws("\n"),
            val("bar", "bar"),
        ]));
        let before = tree.source_text();
        let outcome = run(&mut tree, Mode::Lint);

        assert_eq!(tree.source_text(), before);
        assert_eq!(messages(&outcome), [DEPRECATED]);
        assert!(!outcome.violations[0].corrected);
        let flagged: Vec<usize> = outcome
            .violations
            .iter()
            .filter(|v| v.rule.as_str() == "standard:foo")
            .map(|v| v.location.line)
            .collect();
        assert_eq!(flagged, [2]);
    }

    #[test]
    fn migrated_output_is_stable() {
        let mut tree = tree(file(vec![
            import("foobar.*"),
            ws(" "),
            eol("// ktlint-disable no-wildcard-imports"),
            ws("\n\n"),
            fun(
                "foo",
                vec![
                    ws("\n    "),
                    call("bar"),
                    ws(" "),
                    eol("// ktlint-disable standard:foo"),
                    ws("\n"),
                ],
            ),
        ]));
        let first = run(&mut tree, Mode::Format);
        assert!(first.changed());
        let migrated = tree.source_text();

        let second = run(&mut tree, Mode::Format);
        assert_eq!(second.edits, 0);
        assert!(internal(&second).is_empty());
        assert_eq!(tree.source_text(), migrated);
    }
}
