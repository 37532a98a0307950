//! Helpers running a single rule over Kotlin source.

use std::collections::BTreeMap;

use klint_core::{
    ConfigSnapshot, Engine, Mode, RuleBox, RuleRegistry, SourceParser, Violation,
};
use klint_kotlin::KotlinParser;

pub(crate) struct Run {
    pub(crate) text: String,
    pub(crate) violations: Vec<Violation>,
}

pub(crate) fn run(rules: Vec<RuleBox>, code: &str, mode: Mode, properties: &[(&str, &str)]) -> Run {
    let registry = RuleRegistry::new(rules).unwrap();
    let raw: BTreeMap<String, String> = properties
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let config = ConfigSnapshot::from_raw(&registry.property_registry(), raw);
    let mut tree = KotlinParser::new().parse(code, false).unwrap();
    let outcome = Engine::new(&registry, &config, mode).run(&mut tree);
    Run {
        text: tree.source_text(),
        violations: outcome.violations,
    }
}

pub(crate) fn lint(rule: RuleBox, code: &str) -> Vec<Violation> {
    run(vec![rule], code, Mode::Lint, &[]).violations
}

pub(crate) fn format(rule: RuleBox, code: &str) -> String {
    run(vec![rule], code, Mode::Format, &[]).text
}

/// `(line, column, message)` of each violation.
pub(crate) fn positions(violations: &[Violation]) -> Vec<(usize, usize, &str)> {
    violations
        .iter()
        .map(|v| (v.location.line, v.location.column, v.message.as_str()))
        .collect()
}
