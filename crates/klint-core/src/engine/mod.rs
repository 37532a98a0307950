//! Lint and format sessions over a single tree.
//!
//! One pass visits the tree depth-first in document order and, at every node,
//! invokes each scheduled rule in order. Edits queued by a rule are applied
//! before the next rule runs. In format mode passes repeat until a pass makes
//! no edit or the pass cap is reached.

mod context;

pub use context::SessionContext;
pub(crate) use context::Emission;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ConfigSnapshot;
use crate::registry::{RuleRegistry, INTERNAL_RULE_SET};
use crate::rule::{Capabilities, Flow, Rule, RuleId, VisitScope};
use crate::suppression::SuppressionIndex;
use crate::tree::{Edit, Fragment, LineIndex, NodeId, SyntaxKind, SyntaxTree};
use crate::types::{Location, Violation};

/// Default cap on format passes per file.
pub const DEFAULT_MAX_FORMAT_PASSES: usize = 3;

/// What a session does with fixable violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report only; the tree is never modified.
    Lint,
    /// Report and fix, iterating to a fixed point.
    Format,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lint => write!(f, "lint"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// Signal to stop a session between passes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    /// Violations after suppression filtering, ordered by position.
    pub violations: Vec<Violation>,
    /// Number of passes run, excluding the final lint pass after hitting the cap.
    pub passes: usize,
    /// Number of edits applied to the tree.
    pub edits: usize,
    /// Format mode hit the pass cap while edits were still happening.
    pub did_not_stabilize: bool,
    /// The session was cancelled before it completed.
    pub partial: bool,
}

impl SessionOutcome {
    /// Returns true if the tree was modified.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.edits > 0
    }
}

#[derive(Clone)]
struct ScheduledRule {
    rule: Arc<dyn Rule>,
    id: RuleId,
    capabilities: Capabilities,
}

/// Drives lint and format sessions.
///
/// # Example
///
/// ```ignore
/// let registry = RuleRegistry::new(rules)?;
/// let config = resolver.resolve(path);
/// let outcome = Engine::new(&registry, &config, Mode::Format)
///     .path(path)
///     .run(&mut tree);
/// ```
pub struct Engine<'a> {
    rules: Vec<ScheduledRule>,
    known: &'a BTreeSet<RuleId>,
    config: &'a ConfigSnapshot,
    path: Option<&'a Path>,
    mode: Mode,
    max_passes: usize,
    cancellation: Option<CancellationToken>,
}

impl<'a> Engine<'a> {
    /// Creates an engine running the registry's rules enabled for `config`.
    #[must_use]
    pub fn new(registry: &'a RuleRegistry, config: &'a ConfigSnapshot, mode: Mode) -> Self {
        let rules = registry
            .rules_for(config)
            .into_iter()
            .map(|rule| ScheduledRule {
                id: rule.id(),
                capabilities: rule.capabilities(),
                rule,
            })
            .collect();
        Self {
            rules,
            known: registry.ids(),
            config,
            path: None,
            mode,
            max_passes: DEFAULT_MAX_FORMAT_PASSES,
            cancellation: None,
        }
    }

    /// Sets the path of the file being processed.
    #[must_use]
    pub fn path(mut self, path: &'a Path) -> Self {
        self.path = Some(path);
        self
    }

    /// Sets the cap on format passes. Values below one are raised to one.
    #[must_use]
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Lets the caller cancel the session between passes.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Runs the session, modifying `tree` in format mode.
    #[must_use]
    pub fn run(&self, tree: &mut SyntaxTree) -> SessionOutcome {
        let mut session = Session::new(self, tree);
        let mut outcome = SessionOutcome::default();
        let mut collected: Vec<Emission> = Vec::new();

        loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                info!("Session cancelled after {} pass(es)", outcome.passes);
                outcome.partial = true;
                break;
            }

            outcome.passes += 1;
            let (emissions, edits) = session.run_pass(tree, self.mode);
            debug!("Pass {} applied {} edit(s)", outcome.passes, edits);
            outcome.edits += edits;
            collected.extend(emissions);

            if self.mode == Mode::Lint || edits == 0 {
                break;
            }
            if outcome.passes >= self.max_passes {
                warn!(
                    "Format was not able to resolve all violations which (theoretically) can be \
                     autocorrected in file {} in {} passes",
                    self.path.map_or_else(|| "<text>".to_string(), |p| p.display().to_string()),
                    outcome.passes
                );
                outcome.did_not_stabilize = true;
                let (emissions, _) = session.run_pass(tree, Mode::Lint);
                collected.extend(emissions);
                break;
            }
        }

        session.refresh(tree);
        let index = &session.suppressions;
        let mut violations: Vec<Violation> = latest_reports(collected)
            .into_iter()
            .chain(session.failures)
            .filter(|e| {
                e.violation.rule.rule_set() == INTERNAL_RULE_SET
                    || !index.suppresses(&e.violation.rule, &e.chain)
            })
            .map(|e| e.violation)
            .collect();
        violations.sort_by(|a, b| {
            (a.location.line, a.location.column, &a.rule, &a.message, a.corrected).cmp(&(
                b.location.line,
                b.location.column,
                &b.rule,
                &b.message,
                b.corrected,
            ))
        });
        violations.dedup();
        outcome.violations = violations;
        outcome
    }
}

/// Drops uncorrected reports that a later pass repeated on the same node.
///
/// Edits between passes can move a finding that is not fixed, so the same
/// finding may come back at a different line and column.
fn latest_reports(emissions: Vec<Emission>) -> Vec<Emission> {
    fn key(e: &Emission) -> (RuleId, String, Option<NodeId>, usize) {
        (
            e.violation.rule.clone(),
            e.violation.message.clone(),
            e.chain.first().copied(),
            e.delta,
        )
    }

    let mut latest = HashMap::new();
    for (i, e) in emissions.iter().enumerate() {
        if !e.violation.corrected {
            latest.insert(key(e), i);
        }
    }
    emissions
        .into_iter()
        .enumerate()
        .filter(|(i, e)| e.violation.corrected || latest.get(&key(e)) == Some(i))
        .map(|(_, e)| e)
        .collect()
}

/// Mutable state shared by the passes of one session.
struct Session<'e, 'a> {
    engine: &'e Engine<'a>,
    disabled: HashSet<RuleId>,
    failures: Vec<Emission>,
    lines: LineIndex,
    lines_dirty: bool,
    suppressions: SuppressionIndex,
    suppressions_dirty: bool,
}

impl<'e, 'a> Session<'e, 'a> {
    fn new(engine: &'e Engine<'a>, tree: &SyntaxTree) -> Self {
        Self {
            engine,
            disabled: HashSet::new(),
            failures: Vec::new(),
            lines: tree.line_index(),
            lines_dirty: false,
            suppressions: SuppressionIndex::build(tree, engine.known),
            suppressions_dirty: false,
        }
    }

    fn refresh(&mut self, tree: &SyntaxTree) {
        if self.lines_dirty {
            self.lines = tree.line_index();
            self.lines_dirty = false;
        }
        if self.suppressions_dirty {
            self.suppressions = SuppressionIndex::build(tree, self.engine.known);
            self.suppressions_dirty = false;
        }
    }

    /// Runs one pass and returns its emissions and the number of applied edits.
    fn run_pass(&mut self, tree: &mut SyntaxTree, mode: Mode) -> (Vec<Emission>, usize) {
        let root = tree.root();
        let mut emissions = Vec::new();
        let mut edits = 0;
        let engine = self.engine;
        let rules = &engine.rules;

        let mut current = Some(root);
        while let Some(node) = current {
            let ancestors: Vec<NodeId> = tree.ancestors(node).collect();
            let next_sibling = tree.next_sibling(node);
            let index = tree.index_in_parent(node);
            let mut descend = true;
            let mut jump = None;

            for scheduled in rules {
                let applies = match scheduled.capabilities.visit {
                    VisitScope::EveryNode => true,
                    VisitScope::RootOnly => node == root,
                    VisitScope::RootOnlyRunLast => false,
                };
                if !applies {
                    continue;
                }
                match self.invoke(scheduled, node, tree, mode, &mut emissions, &mut edits) {
                    Some(Flow::SkipChildren) => descend = false,
                    Some(Flow::ContinueAt(target)) => jump = Some(target),
                    Some(Flow::Continue) | None => {}
                }
                if !tree.is_attached(node) {
                    break;
                }
            }

            current = advance(tree, node, descend, jump, &ancestors, next_sibling, index);
        }

        for scheduled in rules
            .iter()
            .filter(|r| r.capabilities.visit == VisitScope::RootOnlyRunLast)
        {
            let root = tree.root();
            self.invoke(scheduled, root, tree, mode, &mut emissions, &mut edits);
        }

        (emissions, edits)
    }

    /// Invokes one rule callback and applies its effects.
    ///
    /// Returns `None` when the rule is disabled or failed.
    fn invoke(
        &mut self,
        scheduled: &ScheduledRule,
        node: NodeId,
        tree: &mut SyntaxTree,
        mode: Mode,
        emissions: &mut Vec<Emission>,
        edits: &mut usize,
    ) -> Option<Flow> {
        if self.disabled.contains(&scheduled.id) {
            return None;
        }
        self.refresh(tree);

        let mut ctx = SessionContext::new(
            tree,
            self.engine.config,
            self.engine.path,
            mode,
            scheduled.id.clone(),
            scheduled.capabilities,
            &self.lines,
            &self.suppressions,
        );
        let result = panic::catch_unwind(AssertUnwindSafe(|| scheduled.rule.visit(node, &mut ctx)));
        let (emitted, queued) = ctx.into_effects();

        let detail = match result {
            Ok(Ok(flow)) => {
                emissions.extend(emitted);
                *edits += self.apply(tree, queued, &scheduled.id);
                return Some(flow);
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.fail(scheduled, node, tree, &detail);
        None
    }

    fn apply(&mut self, tree: &mut SyntaxTree, queued: Vec<Edit>, rule: &RuleId) -> usize {
        let internal = rule.rule_set() == INTERNAL_RULE_SET;
        let mut applied = 0;
        for edit in queued {
            let touches = internal || touches_suppression(tree, &edit);
            match tree.apply(edit) {
                Ok(()) => {
                    applied += 1;
                    self.lines_dirty = true;
                    self.suppressions_dirty |= touches;
                }
                Err(e) => debug!("Skipping edit from rule '{}': {}", rule, e),
            }
        }
        applied
    }

    fn fail(&mut self, scheduled: &ScheduledRule, node: NodeId, tree: &SyntaxTree, detail: &str) {
        warn!(
            "Rule '{}' failed and is skipped for the rest of the file: {}",
            scheduled.id, detail
        );
        self.refresh(tree);
        let offset = tree.offset(node);
        let (line, column) = self.lines.line_col(offset);
        let violation = Violation::new(
            scheduled.id.clone(),
            Location::new(line, column, offset),
            format!("Rule '{}' failed with an internal error: {detail}", scheduled.id),
            false,
        );
        self.failures.push(Emission {
            violation,
            chain: std::iter::once(node).chain(tree.ancestors(node)).collect(),
            delta: 0,
        });
        self.disabled.insert(scheduled.id.clone());
    }
}

/// Picks the next node to visit after `node`.
fn advance(
    tree: &SyntaxTree,
    node: NodeId,
    descend: bool,
    jump: Option<NodeId>,
    ancestors: &[NodeId],
    next_sibling: Option<NodeId>,
    index: Option<usize>,
) -> Option<NodeId> {
    if let Some(target) = jump.filter(|&n| tree.is_attached(n)) {
        return Some(target);
    }
    if tree.is_attached(node) {
        if descend {
            if let Some(&first) = tree.children(node).first() {
                return Some(first);
            }
        }
        return next_after(tree, node);
    }

    // The node was removed or replaced: resume where it used to be.
    let parent = ancestors.first().copied();
    if let Some(sibling) = next_sibling.filter(|&s| tree.is_attached(s) && tree.parent(s) == parent) {
        return Some(sibling);
    }
    match parent.filter(|&p| tree.is_attached(p)) {
        Some(parent) => index
            .and_then(|i| tree.children(parent).get(i).copied())
            .or_else(|| next_after(tree, parent)),
        None => {
            let anchor = ancestors.iter().copied().find(|&a| tree.is_attached(a))?;
            next_after(tree, anchor)
        }
    }
}

/// Next node in document order outside the subtree of `node`.
fn next_after(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if let Some(sibling) = tree.next_sibling(current) {
            return Some(sibling);
        }
        current = tree.parent(current)?;
    }
}

fn is_suppression_kind(kind: SyntaxKind) -> bool {
    kind.is_comment()
        || matches!(
            kind,
            SyntaxKind::Annotation | SyntaxKind::FileAnnotationList | SyntaxKind::AnnotatedExpression
        )
}

fn fragment_touches(fragment: &Fragment) -> bool {
    match fragment {
        Fragment::Leaf { kind, .. } => is_suppression_kind(*kind),
        Fragment::Node { kind, children } => {
            is_suppression_kind(*kind) || children.iter().any(fragment_touches)
        }
        Fragment::Existing(_) => false,
    }
}

/// Returns true if applying `edit` may change the suppressions of the tree.
fn touches_suppression(tree: &SyntaxTree, edit: &Edit) -> bool {
    let anchor = edit.anchor();
    let anchor_touches = match edit {
        Edit::InsertBefore { .. } | Edit::InsertAfter { .. } | Edit::InsertChildren { .. } => false,
        Edit::Remove(_) | Edit::Replace { .. } | Edit::SetText { .. } => {
            tree.descendants(anchor)
                .chain(tree.ancestors(anchor))
                .any(|n| is_suppression_kind(tree.kind(n)))
        }
    };
    let inserted_touch = match edit {
        Edit::InsertBefore { nodes, .. }
        | Edit::InsertAfter { nodes, .. }
        | Edit::InsertChildren { nodes, .. }
        | Edit::Replace { with: nodes, .. } => nodes.iter().any(fragment_touches),
        Edit::Remove(_) | Edit::SetText { .. } => false,
    };
    anchor_touches || inserted_touch
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
