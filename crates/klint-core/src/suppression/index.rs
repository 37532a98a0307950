//! Lookup of the rules suppressed on a node.

use std::collections::{BTreeSet, HashMap};

use super::ids::SUPPRESS_ALL;
use super::plan::{existing_scopes, Plan};
use crate::rule::RuleId;
use crate::tree::{NodeId, SyntaxKind, SyntaxTree};

/// Suppression scopes of a tree: annotated nodes and the nodes that legacy
/// directives stand for, each with the suppression ids that apply within.
#[derive(Debug, Clone, Default)]
pub struct SuppressionIndex {
    scopes: HashMap<NodeId, BTreeSet<String>>,
}

impl SuppressionIndex {
    /// An index without any suppression.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collects the scopes of `tree`. Directive ids are resolved against the
    /// `known` rules.
    #[must_use]
    pub fn build(tree: &SyntaxTree, known: &BTreeSet<RuleId>) -> Self {
        let mut scopes = existing_scopes(tree);
        for (target, ids) in Plan::build(tree, known).scopes() {
            scopes.entry(*target).or_default().extend(ids.iter().cloned());
        }

        let wrapped: Vec<(NodeId, BTreeSet<String>)> = scopes
            .iter()
            .filter(|(n, _)| tree.kind(**n) == SyntaxKind::AnnotatedExpression)
            .flat_map(|(&n, ids)| {
                tree.children(n)
                    .iter()
                    .copied()
                    .filter(|&c| tree.kind(c).is_expression())
                    .map(move |c| (c, ids.clone()))
            })
            .collect();
        for (inner, ids) in wrapped {
            scopes.entry(inner).or_default().extend(ids);
        }

        Self { scopes }
    }

    /// Returns true if `rule` is suppressed on the first node of `chain`,
    /// given as the node followed by its ancestors.
    #[must_use]
    pub fn suppresses(&self, rule: &RuleId, chain: &[NodeId]) -> bool {
        if self.scopes.is_empty() {
            return false;
        }
        let id = rule.suppression_id();
        chain
            .iter()
            .filter_map(|n| self.scopes.get(n))
            .any(|ids| ids.contains(SUPPRESS_ALL) || ids.contains(&id))
    }

    /// Suppression ids directly attached to a node.
    #[must_use]
    pub fn ids_on(&self, node: NodeId) -> Option<&BTreeSet<String>> {
        self.scopes.get(&node)
    }

    /// Returns true if the tree has no suppression at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixture::*;
    use crate::tree::Fragment;

    fn known() -> BTreeSet<RuleId> {
        BTreeSet::from([
            RuleId::from_static("standard:foo"),
            RuleId::from_static("standard:bar"),
        ])
    }

    fn chain(tree: &SyntaxTree, node: NodeId) -> Vec<NodeId> {
        std::iter::once(node).chain(tree.ancestors(node)).collect()
    }

    #[test]
    fn annotation_scopes_cover_descendants_only() {
        let tree = tree(file(vec![
            val_with(
                vec![annotation("Suppress", &["ktlint:standard:foo"]), ws("\n")],
                "a",
                "x",
            ),
            ws("\n"),
            val("b", "y"),
        ]));
        let index = SuppressionIndex::build(&tree, &known());
        let in_a = nth(&tree, SyntaxKind::StringTemplate, 1);
        let in_b = nth(&tree, SyntaxKind::StringTemplate, 2);
        let foo = RuleId::from_static("standard:foo");
        let bar = RuleId::from_static("standard:bar");

        assert!(index.suppresses(&foo, &chain(&tree, in_a)));
        assert!(!index.suppresses(&bar, &chain(&tree, in_a)));
        assert!(!index.suppresses(&foo, &chain(&tree, in_b)));
    }

    #[test]
    fn file_annotation_suppresses_everything_in_file() {
        let tree = tree(file(vec![
            Fragment::node(
                SyntaxKind::FileAnnotationList,
                vec![Fragment::node(
                    SyntaxKind::Annotation,
                    vec![
                        op("@"),
                        kw("file"),
                        op(":"),
                        ident("Suppress"),
                        Fragment::node(
                            SyntaxKind::ValueArgumentList,
                            vec![
                                op("("),
                                Fragment::node(SyntaxKind::ValueArgument, vec![string("ktlint")]),
                                op(")"),
                            ],
                        ),
                    ],
                )],
            ),
            ws("\n\n"),
            val("a", "x"),
        ]));
        let index = SuppressionIndex::build(&tree, &known());
        let value = nth(&tree, SyntaxKind::StringTemplate, 1);
        assert!(index.suppresses(&RuleId::from_static("custom:any"), &chain(&tree, value)));
    }

    #[test]
    fn unqualified_annotation_entries_still_suppress() {
        let tree = tree(file(vec![val_with(
            vec![annotation("SuppressWarnings", &["ktlint:foo"]), ws("\n")],
            "a",
            "x",
        )]));
        let index = SuppressionIndex::build(&tree, &known());
        let value = nth(&tree, SyntaxKind::StringTemplate, 1);
        assert!(index.suppresses(&RuleId::from_static("standard:foo"), &chain(&tree, value)));
    }

    #[test]
    fn eol_directive_scopes_its_declaration() {
        let tree = tree(file(vec![
            val("a", "x"),
            ws(" "),
            eol("// ktlint-disable standard:foo"),
            ws("\n"),
            val("b", "y"),
        ]));
        let index = SuppressionIndex::build(&tree, &known());
        let foo = RuleId::from_static("standard:foo");
        let a = nth(&tree, SyntaxKind::Property, 0);
        let b = nth(&tree, SyntaxKind::Property, 1);
        assert_eq!(
            index.ids_on(a),
            Some(&BTreeSet::from(["ktlint:standard:foo".to_string()]))
        );
        assert!(index.suppresses(&foo, &chain(&tree, nth(&tree, SyntaxKind::StringTemplate, 0))));
        assert!(!index.suppresses(&foo, &chain(&tree, b)));
    }

    #[test]
    fn plain_trees_have_no_scopes() {
        let tree = tree(file(vec![val("a", "x")]));
        let index = SuppressionIndex::build(&tree, &known());
        assert!(index.is_empty());
        assert!(!index.suppresses(&RuleId::from_static("standard:foo"), &[tree.root()]));
    }
}
