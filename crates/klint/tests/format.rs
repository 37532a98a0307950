//! Formatting real Kotlin source end to end.

use klint::rules::Preset;
use klint::{
    Capabilities, Code, Flow, NodeId, Rule, RuleEngine, RuleError, RuleId, SessionContext,
    SyntaxKind,
};

/// Reports every property.
struct NoProperties;

impl Rule for NoProperties {
    fn id(&self) -> RuleId {
        RuleId::from_static("standard:foo")
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default().lint_only()
    }

    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        if ctx.tree().kind(node) == SyntaxKind::Property {
            ctx.emit(node, "Property", false);
        }
        Ok(Flow::Continue)
    }
}

fn standard() -> RuleEngine {
    RuleEngine::builder()
        .preset(Preset::Standard)
        .build()
        .unwrap()
}

#[test]
fn eol_directive_is_migrated_to_annotation() {
    let engine = RuleEngine::builder().rule(NoProperties).build().unwrap();
    let code = Code::from_text("val foo = \"foo\" // ktlint-disable standard:foo\n");

    let result = engine.format(&code).unwrap();
    assert_eq!(
        result.formatted.as_deref(),
        Some("@Suppress(\"ktlint:standard:foo\")\nval foo = \"foo\"\n")
    );
    assert_eq!(result.violations.len(), 1);
    let violation = &result.violations[0];
    assert_eq!(violation.rule.as_str(), "internal:ktlint-suppression");
    assert_eq!(violation.location.offset, 19);
    assert!(violation.corrected);
}

#[test]
fn migrated_file_is_stable() {
    let engine = RuleEngine::builder().rule(NoProperties).build().unwrap();
    let first = engine
        .format(&Code::from_text("val foo = \"foo\" // ktlint-disable standard:foo\n"))
        .unwrap();
    let formatted = first.formatted.unwrap();

    let second = engine.format(&Code::from_text(formatted.clone())).unwrap();
    assert_eq!(second.formatted.as_deref(), Some(formatted.as_str()));
    assert!(second.violations.is_empty());
}

#[test]
fn merge_keeps_non_literal_arguments() {
    let engine = RuleEngine::builder().rule(NoProperties).build().unwrap();
    let code = Code::from_text(
        "@Suppress(UNUSED_X, \"aaa\")\nval foo = \"foo\" // ktlint-disable standard:foo\n",
    );

    let result = engine.format(&code).unwrap();
    assert_eq!(
        result.formatted.as_deref(),
        Some("@Suppress(\"aaa\", \"ktlint:standard:foo\", UNUSED_X)\nval foo = \"foo\"\n")
    );
    assert_eq!(result.violations.len(), 1);
    assert!(result.violations[0].corrected);
}

#[test]
fn standard_preset_cleans_up_whitespace() {
    let code = Code::from_text(
        "package a\n\n\n\nclass Foo {\n    val bar  = 1   \n\n\n    fun baz()  =  bar\n}",
    );
    let result = standard().format(&code).unwrap();

    insta::assert_snapshot!(result.formatted.unwrap(), @r"
    package a

    class Foo {
        val bar = 1

        fun baz() = bar
    }
    ");
    assert!(result.violations.iter().all(|v| v.corrected));
    assert!(!result.did_not_stabilize);
}

#[test]
fn formatting_is_idempotent() {
    let engine = standard();
    let code = Code::from_text("fun foo() {\n    val a  =  1  \n\n\n\n    return\n}\n\n\n");
    let once = engine.format(&code).unwrap().formatted.unwrap();
    let twice = engine.format(&Code::from_text(once.clone())).unwrap();

    assert_eq!(twice.formatted.as_deref(), Some(once.as_str()));
    assert!(twice.violations.is_empty());
}

#[test]
fn suppress_annotation_filters_violations() {
    let code = Code::from_text(
        "@Suppress(\"ktlint:standard:no-multi-spaces\")\nval a  = 1\nval b  = 2\n",
    );
    let result = standard().lint(&code).unwrap();

    let lines: Vec<usize> = result.violations.iter().map(|v| v.location.line).collect();
    assert_eq!(lines, [3]);
    assert_eq!(result.violations[0].rule.as_str(), "standard:no-multi-spaces");
}

#[test]
fn file_suppression_silences_everything() {
    let code = Code::from_text("@file:Suppress(\"ktlint\")\n\nimport a.*\n\nval a  = 1   \n");
    let result = standard().lint(&code).unwrap();
    assert!(result.violations.is_empty());
}

#[test]
fn unknown_directive_ids_are_reported() {
    let code = Code::from_text("val a = 1 // ktlint-disable standard:unknown-rule-id\n");
    let result = standard().format(&code).unwrap();

    assert_eq!(result.formatted.as_deref(), Some("val a = 1\n"));
    let messages: Vec<&str> = result.violations.iter().map(|v| v.message.as_str()).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages
        .iter()
        .any(|m| m.contains("'standard:unknown-rule-id' is unknown or not loaded")));
}
