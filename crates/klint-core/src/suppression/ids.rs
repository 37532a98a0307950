//! Canonical forms of rule references in directives and annotations.

use std::collections::BTreeSet;

use crate::rule::RuleId;

/// Suppression id covering every rule.
pub const SUPPRESS_ALL: &str = "ktlint";

const SUPPRESSION_PREFIX: &str = "ktlint:";
const DEFAULT_RULE_SET: &str = "standard";
const LEGACY_RULE_SET: &str = "experimental";

/// Qualifies a rule reference with its rule set.
///
/// Accepts `name`, `ruleSet:name` and `ktlint:ruleSet:name`. References
/// without a rule set belong to the standard rule set, as do references to
/// the legacy experimental rule set.
#[must_use]
pub fn qualify(reference: &str) -> String {
    let id = reference
        .strip_prefix(SUPPRESSION_PREFIX)
        .unwrap_or(reference)
        .to_lowercase();
    let (rule_set, name) = id
        .split_once(':')
        .unwrap_or((DEFAULT_RULE_SET, id.as_str()));
    let rule_set = if rule_set == LEGACY_RULE_SET {
        DEFAULT_RULE_SET
    } else {
        rule_set
    };
    format!("{rule_set}:{name}")
}

/// Suppression id of a qualified rule id, e.g. `ktlint:standard:foo`.
#[must_use]
pub fn suppression_id(qualified: &str) -> String {
    format!("{SUPPRESSION_PREFIX}{qualified}")
}

/// Returns true for annotation entries that refer to ktlint rules.
#[must_use]
pub fn is_rule_suppression(entry: &str) -> bool {
    entry.starts_with(SUPPRESSION_PREFIX)
}

/// Canonical form of an annotation entry.
///
/// Entries that do not refer to ktlint rules are returned unchanged.
#[must_use]
pub fn normalize_entry(entry: &str) -> String {
    if is_rule_suppression(entry) {
        suppression_id(&qualify(entry))
    } else {
        entry.to_string()
    }
}

/// Returns true if the qualified id names a loaded rule.
pub(crate) fn is_known(qualified: &str, known: &BTreeSet<RuleId>) -> bool {
    RuleId::parse(qualified).is_ok_and(|id| known.contains(&id))
}

/// Merges annotation entries, dropping rule-specific entries once every rule
/// is suppressed.
pub(crate) fn merge<'s>(
    existing: impl IntoIterator<Item = String>,
    added: impl IntoIterator<Item = &'s String>,
) -> BTreeSet<String> {
    let mut merged: BTreeSet<String> = existing.into_iter().collect();
    merged.extend(added.into_iter().cloned());
    if merged.contains(SUPPRESS_ALL) {
        merged.retain(|entry| !is_rule_suppression(entry));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualification() {
        assert_eq!(qualify("foo"), "standard:foo");
        assert_eq!(qualify("custom:foo"), "custom:foo");
        assert_eq!(qualify("experimental:foo"), "standard:foo");
        assert_eq!(qualify("ktlint:foo"), "standard:foo");
        assert_eq!(qualify("ktlint:custom:foo"), "custom:foo");
        assert_eq!(qualify("Standard:No-Semi"), "standard:no-semi");
    }

    #[test]
    fn entries_are_normalized_only_for_rule_suppressions() {
        assert_eq!(normalize_entry("ktlint:foo"), "ktlint:standard:foo");
        assert_eq!(
            normalize_entry("ktlint:experimental:foo"),
            "ktlint:standard:foo"
        );
        assert_eq!(normalize_entry("ktlint"), "ktlint");
        assert_eq!(normalize_entry("UNUSED_PARAMETER"), "UNUSED_PARAMETER");
    }

    #[test]
    fn merge_sorts_and_deduplicates() {
        let merged = merge(
            ["zzz".to_string(), "aaa".to_string()],
            &["ktlint:standard:foo".to_string(), "aaa".to_string()],
        );
        assert_eq!(
            merged.into_iter().collect::<Vec<_>>(),
            ["aaa", "ktlint:standard:foo", "zzz"]
        );
    }

    #[test]
    fn suppress_all_absorbs_rule_entries() {
        let merged = merge(
            ["ktlint:standard:foo".to_string(), "aaa".to_string()],
            &[SUPPRESS_ALL.to_string()],
        );
        assert_eq!(merged.into_iter().collect::<Vec<_>>(), ["aaa", "ktlint"]);
    }

    #[test]
    fn known_ids() {
        let known = BTreeSet::from([RuleId::from_static("standard:foo")]);
        assert!(is_known("standard:foo", &known));
        assert!(!is_known("standard:bar", &known));
        assert!(!is_known("not-qualified", &known));
    }
}
