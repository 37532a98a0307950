//! Per-callback view of a session handed to rules.

use std::path::Path;

use tracing::{debug, trace};

use super::Mode;
use crate::config::ConfigSnapshot;
use crate::registry::INTERNAL_RULE_SET;
use crate::rule::{Capabilities, RuleId};
use crate::suppression::SuppressionIndex;
use crate::tree::{Edit, LineIndex, NodeId, SyntaxTree};
use crate::types::{Location, Violation};

/// A violation together with the node chain it was reported on.
///
/// The chain (node first, then its ancestors) is what suppression filtering
/// matches against, so it stays valid even after later edits move text.
#[derive(Debug, Clone)]
pub(crate) struct Emission {
    pub(crate) violation: Violation,
    pub(crate) chain: Vec<NodeId>,
    /// Offset of the violation from the start of the node it was reported on.
    pub(crate) delta: usize,
}

/// Read access to the tree and configuration, plus the effect queues of one
/// rule callback.
///
/// Edits are not applied immediately: the engine applies them in order once
/// the callback returns, so the tree a rule sees never changes during its
/// own callback.
pub struct SessionContext<'a> {
    tree: &'a SyntaxTree,
    config: &'a ConfigSnapshot,
    path: Option<&'a Path>,
    mode: Mode,
    rule: RuleId,
    capabilities: Capabilities,
    lines: &'a LineIndex,
    suppressions: &'a SuppressionIndex,
    emissions: Vec<Emission>,
    edits: Vec<Edit>,
}

impl<'a> SessionContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tree: &'a SyntaxTree,
        config: &'a ConfigSnapshot,
        path: Option<&'a Path>,
        mode: Mode,
        rule: RuleId,
        capabilities: Capabilities,
        lines: &'a LineIndex,
        suppressions: &'a SuppressionIndex,
    ) -> Self {
        Self {
            tree,
            config,
            path,
            mode,
            rule,
            capabilities,
            lines,
            suppressions,
            emissions: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// The tree as of the start of this callback.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    /// Configuration of the file.
    #[must_use]
    pub fn config(&self) -> &'a ConfigSnapshot {
        self.config
    }

    /// Path of the file, when known.
    #[must_use]
    pub fn path(&self) -> Option<&'a Path> {
        self.path
    }

    /// Mode of the current pass.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Id of the rule being invoked.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        &self.rule
    }

    /// Capabilities the rule declared.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Known rule suppressions of the current tree.
    #[must_use]
    pub fn suppressions(&self) -> &'a SuppressionIndex {
        self.suppressions
    }

    /// Returns true if the current rule is suppressed on `node`.
    #[must_use]
    pub fn is_suppressed(&self, node: NodeId) -> bool {
        !self.is_internal() && self.suppressions.suppresses(&self.rule, &self.chain(node))
    }

    /// Reports a violation at the start of `node`.
    ///
    /// Returns true if the rule should fix the violation now, which is the
    /// case in format mode for autocorrectable, unsuppressed violations of
    /// rules that declared they can autocorrect.
    pub fn emit(&mut self, node: NodeId, message: impl Into<String>, can_autocorrect: bool) -> bool {
        let offset = self.tree.offset(node);
        self.emit_at(node, offset, message, can_autocorrect)
    }

    /// Reports a violation at an explicit offset, attributed to `node`.
    ///
    /// See [`SessionContext::emit`] for the return value.
    pub fn emit_at(
        &mut self,
        node: NodeId,
        offset: usize,
        message: impl Into<String>,
        can_autocorrect: bool,
    ) -> bool {
        if !self.capabilities.emits_violations {
            debug!("Ignoring violation of '{}', which declared it emits none", self.rule);
            return false;
        }
        let can_autocorrect = can_autocorrect && self.capabilities.can_autocorrect;
        let chain = self.chain(node);
        if !self.is_internal() && self.suppressions.suppresses(&self.rule, &chain) {
            trace!("Suppressed violation of '{}' at offset {}", self.rule, offset);
            return false;
        }
        let fix = can_autocorrect && self.mode == Mode::Format;
        let (line, column) = self.lines.line_col(offset);
        let violation = Violation::new(
            self.rule.clone(),
            Location::new(line, column, offset),
            message,
            can_autocorrect,
        )
        .corrected(fix);
        let delta = offset.saturating_sub(self.tree.offset(node));
        self.emissions.push(Emission {
            violation,
            chain,
            delta,
        });
        fix
    }

    /// Queues a structural edit, applied after the callback returns.
    ///
    /// Edits are discarded in lint mode and for rules that cannot
    /// autocorrect.
    pub fn edit(&mut self, edit: Edit) {
        if self.mode == Mode::Lint {
            trace!("Discarding edit from '{}' in lint mode", self.rule);
            return;
        }
        if !self.capabilities.can_autocorrect {
            debug!("Discarding edit from lint-only rule '{}'", self.rule);
            return;
        }
        self.edits.push(edit);
    }

    pub(crate) fn into_effects(self) -> (Vec<Emission>, Vec<Edit>) {
        (self.emissions, self.edits)
    }

    fn is_internal(&self) -> bool {
        self.rule.rule_set() == INTERNAL_RULE_SET
    }

    fn chain(&self, node: NodeId) -> Vec<NodeId> {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .collect()
    }
}
