//! Rule trait and rule metadata.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PropertyDef;
use crate::engine::SessionContext;
use crate::tree::{NodeId, TreeError};

/// Namespaced rule identifier of the form `<ruleSetId>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Cow<'static, str>);

/// Errors from parsing a [`RuleId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleIdError {
    /// The id is not of the form `<ruleSetId>:<name>`.
    #[error("rule id '{0}' must have the form '<ruleSetId>:<name>'")]
    Malformed(String),
}

impl RuleId {
    /// Creates an id from a static string without validation.
    ///
    /// The registry validates every id at registration, so a malformed
    /// constant surfaces as a startup error.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Parses and validates an id.
    ///
    /// # Errors
    ///
    /// Returns [`RuleIdError::Malformed`] unless the id has exactly one `:`
    /// separating two non-empty parts without whitespace.
    pub fn parse(id: &str) -> Result<Self, RuleIdError> {
        let id = Self(Cow::Owned(id.to_string()));
        id.validate()?;
        Ok(id)
    }

    /// Checks the `<ruleSetId>:<name>` shape.
    ///
    /// # Errors
    ///
    /// See [`RuleId::parse`].
    pub fn validate(&self) -> Result<(), RuleIdError> {
        let malformed = || RuleIdError::Malformed(self.0.to_string());
        let (set, name) = self.0.split_once(':').ok_or_else(malformed)?;
        let valid_part =
            |part: &str| !part.is_empty() && !part.contains(':') && !part.contains(char::is_whitespace);
        if valid_part(set) && valid_part(name) {
            Ok(())
        } else {
            Err(malformed())
        }
    }

    /// The full id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rule set part.
    #[must_use]
    pub fn rule_set(&self) -> &str {
        self.as_str()
            .split_once(':')
            .map_or(self.as_str(), |(set, _)| set)
    }

    /// The name part.
    #[must_use]
    pub fn name(&self) -> &str {
        self.as_str()
            .split_once(':')
            .map_or(self.as_str(), |(_, name)| name)
    }

    /// The id as written in a suppression annotation, e.g. `ktlint:standard:foo`.
    #[must_use]
    pub fn suppression_id(&self) -> String {
        format!("ktlint:{}", self.0)
    }
}

impl FromStr for RuleId {
    type Err = RuleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a rule is invoked during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitScope {
    /// Invoked on every node in document order.
    #[default]
    EveryNode,
    /// Invoked once, on the root, before its children are visited.
    RootOnly,
    /// Invoked once, on the root, after the traversal of the pass completed.
    RootOnlyRunLast,
}

/// What a rule is able to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The rule reports violations.
    pub emits_violations: bool,
    /// The rule can fix what it reports.
    pub can_autocorrect: bool,
    /// The rule reads configuration properties. Properties of rules that do
    /// not declare this are not registered.
    pub uses_config: bool,
    /// Where the rule is invoked.
    pub visit: VisitScope,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            emits_violations: true,
            can_autocorrect: true,
            uses_config: false,
            visit: VisitScope::EveryNode,
        }
    }
}

impl Capabilities {
    /// Marks the rule as lint-only.
    #[must_use]
    pub fn lint_only(mut self) -> Self {
        self.can_autocorrect = false;
        self
    }

    /// Marks the rule as reporting nothing, e.g. one that only rewrites.
    #[must_use]
    pub fn without_violations(mut self) -> Self {
        self.emits_violations = false;
        self
    }

    /// Marks the rule as reading configuration.
    #[must_use]
    pub fn with_config(mut self) -> Self {
        self.uses_config = true;
        self
    }

    /// Sets where the rule is invoked.
    #[must_use]
    pub fn visit(mut self, scope: VisitScope) -> Self {
        self.visit = scope;
        self
    }
}

/// Behavior when a `runs-after` target is not loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAfterMode {
    /// The constraint is ignored when the other rule is not loaded.
    Regardless,
    /// Loading this rule without the other one is a configuration error.
    RequiresLoaded,
}

/// Ordering constraint declared by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorModifier {
    /// The rule must run after the rule with `rule_id`.
    RunAfter {
        /// Rule that must run first.
        rule_id: RuleId,
        /// What to do if that rule is not loaded.
        mode: RunAfterMode,
    },
    /// The rule is placed after all rules without this modifier.
    RunAsLateAsPossible,
}

/// Where traversal continues after a rule callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Continue normally.
    #[default]
    Continue,
    /// Do not descend into the children of the visited node.
    SkipChildren,
    /// Continue traversal at the given node.
    ///
    /// Used after an edit moved or replaced the visited node.
    ContinueAt(NodeId),
}

/// Failure reported by a rule callback.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule could not complete.
    #[error("{0}")]
    Failed(String),

    /// The rule hit an invalid tree operation.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A lint rule over a [`SyntaxTree`](crate::tree::SyntaxTree).
///
/// Rules are stateless: every callback receives the node and a
/// [`SessionContext`] through which it reads the tree and configuration,
/// reports violations, and queues edits.
///
/// # Example
///
/// ```ignore
/// use klint_core::{Flow, Rule, RuleError, RuleId, SessionContext, SyntaxKind};
///
/// pub struct NoTabs;
///
/// impl Rule for NoTabs {
///     fn id(&self) -> RuleId { RuleId::from_static("custom:no-tabs") }
///
///     fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
///         if ctx.tree().kind(node) == SyntaxKind::Whitespace
///             && ctx.tree().leaf_text(node).is_some_and(|t| t.contains('\t'))
///         {
///             ctx.emit(node, "Unexpected tab character(s)", false);
///         }
///         Ok(Flow::Continue)
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the rule id.
    fn id(&self) -> RuleId;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the rule's capabilities.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Returns the ordering constraints of this rule.
    fn visitor_modifiers(&self) -> Vec<VisitorModifier> {
        Vec::new()
    }

    /// Returns configuration properties this rule reads.
    fn config_properties(&self) -> Vec<PropertyDef> {
        Vec::new()
    }

    /// Visits a node.
    ///
    /// # Errors
    ///
    /// An error is reported as an internal-error violation attributed to this
    /// rule; the rule is not invoked again for the rest of the session.
    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
