//! Migration of directives to annotations, planned against an unmodified tree.
//!
//! Planning is pure: it reads the tree and produces findings, the suppression
//! scopes the directives stand for, and the edits that migrate them. Block
//! directives are paired with an explicit stack per parent node.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::annotation;
use super::directive::{DirectiveKind, IdToken, ParsedDirective};
use super::ids;
use crate::rule::RuleId;
use crate::tree::{Edit, NodeId, SyntaxKind, SyntaxTree};

pub(crate) const DEPRECATED: &str =
    "Directive 'ktlint-disable' is deprecated. Replace with @Suppress annotation";
pub(crate) const DEPRECATED_UNMATCHED: &str = "Directive 'ktlint-disable' is deprecated. The matching \
     'ktlint-enable' directive is not found in same scope. Replace with @Suppress annotation";
pub(crate) const OBSOLETE_ENABLE: &str =
    "Directive 'ktlint-enable' is obsolete after migrating to suppress annotations";
pub(crate) const DANGLING: &str =
    "Directive 'ktlint-disable' in EOL comment is ignored as it is not preceded by a code element";
pub(crate) const NOT_QUALIFIED: &str =
    "Identifier to suppress ktlint rule must be fully qualified with the rule set id";

pub(crate) fn unknown(id: &str) -> String {
    format!("Ktlint rule with id '{id}' is unknown or not loaded")
}

/// A violation the suppression rule reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub(crate) node: NodeId,
    pub(crate) offset: usize,
    pub(crate) message: String,
    pub(crate) can_autocorrect: bool,
    /// Fix carried out when this finding is corrected.
    pub(crate) fix: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fix {
    /// Remove a directive comment, migrating its ids to `target`.
    Directive {
        removals: Vec<NodeId>,
        target: Option<(NodeId, BTreeSet<String>)>,
    },
    /// Rewrite an annotation entry to its qualified form.
    Qualify { template: NodeId, entry: String },
}

/// How a comment is positioned among the children of its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// The comment itself is a child of the scope.
    Own,
    /// The comment leads the child it is nested in.
    Before,
    /// The comment trails the child it is nested in.
    After,
}

#[derive(Debug)]
struct Directive {
    comment: NodeId,
    block: bool,
    parsed: ParsedDirective,
    offset: usize,
    scope: NodeId,
    slot: NodeId,
    placement: Placement,
}

impl Directive {
    /// Suppression ids of the loaded rules it names, and the unknown tokens.
    fn resolve<'d>(
        &'d self,
        known: &BTreeSet<RuleId>,
    ) -> (BTreeSet<String>, Vec<&'d IdToken>) {
        if self.parsed.tokens.is_empty() {
            return (BTreeSet::from([ids::SUPPRESS_ALL.to_string()]), Vec::new());
        }
        let (valid, unknown): (Vec<_>, Vec<_>) = self
            .parsed
            .tokens
            .iter()
            .partition(|t| ids::is_known(&t.qualified, known));
        (
            valid
                .into_iter()
                .map(|t| ids::suppression_id(&t.qualified))
                .collect(),
            unknown,
        )
    }

    /// First child index of the scope after the directive.
    fn after(&self, tree: &SyntaxTree) -> usize {
        let index = tree.index_in_parent(self.slot).unwrap_or(0);
        match self.placement {
            Placement::Before => index,
            Placement::Own | Placement::After => index + 1,
        }
    }

    /// Child index of the scope where the directive's region ends, exclusive.
    fn before(&self, tree: &SyntaxTree) -> usize {
        let index = tree.index_in_parent(self.slot).unwrap_or(0);
        match self.placement {
            Placement::After => index + 1,
            Placement::Own | Placement::Before => index,
        }
    }
}

/// Findings, scopes and fixes for one tree.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    findings: Vec<Finding>,
    fixes: Vec<Fix>,
    scopes: Vec<(NodeId, BTreeSet<String>)>,
}

impl Plan {
    pub(crate) fn build(tree: &SyntaxTree, known: &BTreeSet<RuleId>) -> Self {
        let mut plan = Self::default();
        plan.annotation_entries(tree, known);

        let directives = collect(tree);
        let pairs = pair(&directives);
        for (i, directive) in directives.iter().enumerate() {
            match directive.parsed.kind {
                DirectiveKind::Enable => plan.enable(tree, directive),
                DirectiveKind::Disable if !directive.block => plan.eol_disable(tree, known, directive),
                DirectiveKind::Disable => match pairs.get(&i) {
                    Some(&end) => plan.paired_disable(tree, known, directive, &directives[end]),
                    None => plan.unpaired_disable(tree, known, directive),
                },
            }
        }
        plan
    }

    pub(crate) fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Nodes suppressed by directives, with their suppression ids.
    pub(crate) fn scopes(&self) -> &[(NodeId, BTreeSet<String>)] {
        &self.scopes
    }

    /// Edits carrying out the approved fixes.
    ///
    /// Ids already suppressed on the target or one of its ancestors are not
    /// added again. Annotation changes come before comment removals so that
    /// insertion positions computed on the original tree stay valid.
    pub(crate) fn edits(&self, tree: &SyntaxTree, approved: &HashSet<usize>) -> Vec<Edit> {
        let mut edits = Vec::new();
        let mut targets: BTreeMap<NodeId, BTreeSet<String>> = BTreeMap::new();
        let mut removals = Vec::new();

        for (i, fix) in self.fixes.iter().enumerate() {
            if !approved.contains(&i) {
                continue;
            }
            match fix {
                Fix::Qualify { template, entry } => edits.push(Edit::Replace {
                    target: *template,
                    with: vec![annotation::string_template(entry)],
                }),
                Fix::Directive {
                    removals: nodes,
                    target,
                } => {
                    if let Some((target, wanted)) = target {
                        targets
                            .entry(*target)
                            .or_default()
                            .extend(wanted.iter().cloned());
                    }
                    removals.extend(nodes.iter().copied());
                }
            }
        }

        let existing = existing_scopes(tree);
        for (target, wanted) in targets {
            let covered: BTreeSet<&String> = std::iter::once(target)
                .chain(tree.ancestors(target))
                .filter_map(|n| existing.get(&n))
                .flatten()
                .collect();
            if covered.iter().any(|c| c.as_str() == ids::SUPPRESS_ALL) {
                continue;
            }
            let added: Vec<&String> = wanted.iter().filter(|id| !covered.contains(id)).collect();
            if added.is_empty() {
                continue;
            }
            let present = annotation::suppressions_on(tree, target);
            let preferred = present
                .iter()
                .copied()
                .find(|&a| annotation::name(tree, a) == Some(annotation::SUPPRESS))
                .or_else(|| present.first().copied());
            match preferred {
                Some(existing_annotation) => {
                    let entries = annotation::entries(tree, existing_annotation)
                        .into_iter()
                        .map(|(_, entry)| ids::normalize_entry(&entry));
                    let merged = ids::merge(entries, added);
                    edits.push(annotation::rewrite(tree, existing_annotation, &merged));
                }
                None => {
                    let entries = ids::merge(std::iter::empty(), added);
                    edits.push(annotation::insert(tree, target, &entries));
                }
            }
        }

        edits.extend(removals.into_iter().map(Edit::Remove));
        edits
    }

    fn push_fix(&mut self, fix: Fix) -> usize {
        self.fixes.push(fix);
        self.fixes.len() - 1
    }

    fn report(
        &mut self,
        node: NodeId,
        offset: usize,
        message: impl Into<String>,
        fix: Option<usize>,
    ) {
        self.findings.push(Finding {
            node,
            offset,
            message: message.into(),
            can_autocorrect: fix.is_some(),
            fix,
        });
    }

    /// Rule ids inside existing suppression annotations.
    fn annotation_entries(&mut self, tree: &SyntaxTree, known: &BTreeSet<RuleId>) {
        let annotations: Vec<NodeId> = tree
            .descendants(tree.root())
            .filter(|&n| annotation::is_suppression(tree, n))
            .collect();
        for node in annotations {
            for (template, entry) in annotation::entries(tree, node) {
                if !ids::is_rule_suppression(&entry) {
                    continue;
                }
                let offset = tree.offset(template) + 1;
                let qualified = ids::qualify(&entry);
                let canonical = ids::suppression_id(&qualified);
                if !ids::is_known(&qualified, known) {
                    self.report(template, offset, unknown(&canonical), None);
                } else if canonical != entry {
                    let fix = self.push_fix(Fix::Qualify {
                        template,
                        entry: canonical,
                    });
                    self.report(template, offset, NOT_QUALIFIED, Some(fix));
                }
            }
        }
    }

    fn enable(&mut self, tree: &SyntaxTree, directive: &Directive) {
        let fix = self.push_fix(Fix::Directive {
            removals: removals(tree, directive.comment, false),
            target: None,
        });
        self.report(directive.comment, directive.offset, OBSOLETE_ENABLE, Some(fix));
    }

    fn eol_disable(&mut self, tree: &SyntaxTree, known: &BTreeSet<RuleId>, directive: &Directive) {
        let dangling = tree
            .prev_leaf(directive.comment)
            .is_some_and(|l| is_line_break(tree, l));
        if dangling {
            let fix = self.push_fix(Fix::Directive {
                removals: removals(tree, directive.comment, false),
                target: None,
            });
            self.report(directive.comment, directive.offset, DANGLING, Some(fix));
            return;
        }
        let target = eol_anchor(tree, directive.comment);
        self.migrate(tree, known, directive, Some(target));
    }

    fn paired_disable(
        &mut self,
        tree: &SyntaxTree,
        known: &BTreeSet<RuleId>,
        disable: &Directive,
        enable: &Directive,
    ) {
        let start = disable.after(tree);
        let end = enable.before(tree);
        let enclosed: Vec<NodeId> = tree
            .children(disable.scope)
            .get(start..end.max(start))
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&c| annotation::is_annotatable(tree, c))
            .collect();
        let target = match enclosed.as_slice() {
            [single] => Some(*single),
            [] if disable.scope == tree.root() => Some(tree.root()),
            [] => None,
            _ => Some(annotation::nearest_annotatable(tree, disable.scope)),
        };
        self.migrate(tree, known, disable, target);
    }

    fn unpaired_disable(&mut self, tree: &SyntaxTree, known: &BTreeSet<RuleId>, directive: &Directive) {
        if directive.scope == tree.root() {
            self.migrate(tree, known, directive, Some(tree.root()));
            return;
        }
        // Nothing delimits the region, so the comment stays and only filters.
        let (suppressions, _) = directive.resolve(known);
        let target = tree
            .children(directive.scope)
            .get(directive.after(tree)..)
            .unwrap_or_default()
            .iter()
            .copied()
            .find(|&c| annotation::is_annotatable(tree, c))
            .unwrap_or_else(|| tree.root());
        if !suppressions.is_empty() {
            self.scopes.push((target, suppressions));
        }
        self.report(directive.comment, directive.offset, DEPRECATED_UNMATCHED, None);
    }

    /// Reports a migratable disable directive and plans its fix.
    fn migrate(
        &mut self,
        tree: &SyntaxTree,
        known: &BTreeSet<RuleId>,
        directive: &Directive,
        target: Option<NodeId>,
    ) {
        let (suppressions, unknown_tokens) = directive.resolve(known);
        let target = target.filter(|_| !suppressions.is_empty());
        if let Some(target) = target {
            self.scopes.push((target, suppressions.clone()));
        }
        let fix = self.push_fix(Fix::Directive {
            removals: removals(tree, directive.comment, directive.block),
            target: target.map(|t| (t, suppressions)),
        });
        self.report(directive.comment, directive.offset, DEPRECATED, Some(fix));
        let comment_offset = tree.offset(directive.comment);
        for token in unknown_tokens {
            self.report(
                directive.comment,
                comment_offset + directive.parsed.token_offset(token),
                unknown(&token.qualified),
                None,
            );
        }
    }
}

/// Directive comments in document order.
fn collect(tree: &SyntaxTree) -> Vec<Directive> {
    tree.descendants(tree.root())
        .filter(|&n| tree.kind(n).is_comment())
        .filter_map(|comment| {
            let parsed = ParsedDirective::parse(tree.leaf_text(comment)?)?;
            let block = tree.kind(comment) == SyntaxKind::BlockComment;
            let (scope, slot, placement) = position(tree, comment);
            Some(Directive {
                comment,
                block,
                offset: tree.offset(comment) + parsed.marker_offset,
                parsed,
                scope,
                slot,
                placement,
            })
        })
        .collect()
}

/// Scope a comment is matched in.
///
/// A comment leading or trailing a declaration is treated as a sibling of
/// that declaration.
fn position(tree: &SyntaxTree, comment: NodeId) -> (NodeId, NodeId, Placement) {
    let Some(parent) = tree.parent(comment) else {
        return (comment, comment, Placement::Own);
    };
    if let Some(grandparent) = tree.parent(parent).filter(|_| tree.kind(parent).is_declaration()) {
        let children = tree.children(parent);
        let index = tree.index_in_parent(comment).unwrap_or(0);
        let trivia = |nodes: &[NodeId]| nodes.iter().all(|&n| tree.kind(n).is_trivia());
        if trivia(&children[..index]) {
            return (grandparent, parent, Placement::Before);
        }
        if trivia(&children[index + 1..]) {
            return (grandparent, parent, Placement::After);
        }
    }
    (parent, comment, Placement::Own)
}

/// Matches block disable directives with enable directives: per parent, an
/// enable closes the most recent open disable with the same ids.
fn pair(directives: &[Directive]) -> HashMap<usize, usize> {
    let mut open: HashMap<NodeId, Vec<usize>> = HashMap::new();
    let mut pairs = HashMap::new();
    for (i, directive) in directives.iter().enumerate() {
        match directive.parsed.kind {
            DirectiveKind::Disable if directive.block => {
                open.entry(directive.scope).or_default().push(i);
            }
            DirectiveKind::Disable => {}
            DirectiveKind::Enable => {
                let Some(stack) = open.get_mut(&directive.scope) else {
                    continue;
                };
                let key = directive.parsed.key();
                if let Some(pos) = stack
                    .iter()
                    .rposition(|&d| directives[d].parsed.key() == key)
                {
                    pairs.insert(stack.remove(pos), i);
                }
            }
        }
    }
    pairs
}

/// Node an end-of-line directive applies to: the closest annotatable node
/// around the code preceding it on its line.
fn eol_anchor(tree: &SyntaxTree, comment: NodeId) -> NodeId {
    let mut leaf = tree.prev_leaf(comment);
    while let Some(l) = leaf.filter(|&l| tree.kind(l) == SyntaxKind::Whitespace) {
        leaf = tree.prev_leaf(l);
    }
    let Some(code) = leaf else {
        return tree.root();
    };
    let in_list = tree.parent(code).is_some_and(|p| {
        matches!(
            tree.kind(p),
            SyntaxKind::ValueArgumentList | SyntaxKind::ValueParameterList
        )
    });
    let code = if in_list && tree.leaf_text(code) == Some(",") {
        let mut element = tree.prev_sibling(code);
        while let Some(e) = element.filter(|&e| tree.kind(e).is_trivia()) {
            element = tree.prev_sibling(e);
        }
        element.unwrap_or(code)
    } else {
        code
    };
    annotation::nearest_annotatable(tree, code)
}

fn is_line_break(tree: &SyntaxTree, leaf: NodeId) -> bool {
    tree.kind(leaf) == SyntaxKind::Whitespace
        && tree.leaf_text(leaf).is_some_and(|t| t.contains('\n'))
}

/// Nodes to remove with a directive comment.
///
/// End-of-line comments take the whitespace before them. Block comments take
/// the line break after them, or else the whitespace before them.
fn removals(tree: &SyntaxTree, comment: NodeId, block: bool) -> Vec<NodeId> {
    let before = tree
        .prev_leaf(comment)
        .filter(|&l| tree.kind(l) == SyntaxKind::Whitespace);
    let after = tree
        .next_leaf(comment)
        .filter(|&l| is_line_break(tree, l));
    let whitespace = if block { after.or(before) } else { before };
    whitespace.into_iter().chain([comment]).collect()
}

/// Suppression ids of existing annotations, by annotated node.
pub(crate) fn existing_scopes(tree: &SyntaxTree) -> HashMap<NodeId, BTreeSet<String>> {
    let mut scopes: HashMap<NodeId, BTreeSet<String>> = HashMap::new();
    for node in tree.descendants(tree.root()) {
        if !annotation::is_suppression(tree, node) {
            continue;
        }
        let Some(target) = annotation::annotated_node(tree, node) else {
            continue;
        };
        let entries: BTreeSet<String> = annotation::entries(tree, node)
            .into_iter()
            .map(|(_, entry)| ids::normalize_entry(&entry))
            .collect();
        scopes.entry(target).or_default().extend(entries);
    }
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixture::*;

    fn known(ids: &[&'static str]) -> BTreeSet<RuleId> {
        ids.iter().map(|&id| RuleId::from_static(id)).collect()
    }

    #[test]
    fn directive_ids_become_one_sorted_canonical_set() {
        let tree = tree(file(vec![
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:foo custom:foo Standard:Bar standard:foo"),
        ]));
        let known = known(&["standard:foo", "custom:foo", "standard:bar"]);

        let plan = Plan::build(&tree, &known);

        let property = nth(&tree, SyntaxKind::Property, 0);
        let scopes: Vec<(NodeId, Vec<&str>)> = plan
            .scopes()
            .iter()
            .map(|(node, ids)| (*node, ids.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            scopes,
            [(
                property,
                vec!["ktlint:custom:foo", "ktlint:standard:bar", "ktlint:standard:foo"]
            )]
        );
        let messages: Vec<&str> = plan.findings().iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, [DEPRECATED]);
    }

    #[test]
    fn directive_without_loaded_ids_has_no_scope() {
        let tree = tree(file(vec![
            val("foo", "foo"),
            ws(" "),
            eol("// ktlint-disable standard:unknown-rule-id"),
        ]));

        let plan = Plan::build(&tree, &known(&["standard:foo"]));

        assert!(plan.scopes().is_empty());
        let messages: Vec<String> = plan.findings().iter().map(|f| f.message.clone()).collect();
        assert_eq!(messages, [DEPRECATED.to_string(), unknown("standard:unknown-rule-id")]);
    }
}
