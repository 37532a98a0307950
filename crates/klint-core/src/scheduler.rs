//! Deterministic rule ordering.
//!
//! Rules are sorted topologically over their `runs-after` constraints with
//! Kahn's algorithm. Among the rules that are ready at any step, rules without
//! [`VisitorModifier::RunAsLateAsPossible`] come first, then lower
//! registration index.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::fmt::Write;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::rule::{Rule, RuleId, RuleIdError, RunAfterMode, VisitorModifier};

/// Fatal configuration errors detected while ordering rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A rule id is malformed.
    #[error(transparent)]
    InvalidRuleId(#[from] RuleIdError),

    /// Two rules share an id.
    #[error("Rule with id '{0}' is registered more than once")]
    DuplicateRule(RuleId),

    /// A rule requires another rule that is not loaded.
    #[error("Rule with id '{rule}' requires rule with id '{required}' to be loaded")]
    RequiredRuleNotLoaded {
        /// Rule declaring the requirement.
        rule: RuleId,
        /// Missing rule.
        required: RuleId,
    },

    /// The `runs-after` constraints contain a cycle.
    #[error("{report}")]
    Cycle {
        /// Human-readable cycle report.
        report: String,
        /// Rules that could not be ordered.
        rules: Vec<RuleId>,
    },
}

/// Orders rules so that every rule runs after the rules it depends on.
///
/// # Errors
///
/// Returns a [`ScheduleError`] for malformed or duplicate ids, a missing
/// required rule, or a dependency cycle.
pub fn schedule(rules: Vec<Arc<dyn Rule>>) -> Result<Vec<Arc<dyn Rule>>, ScheduleError> {
    let ids: Vec<RuleId> = rules.iter().map(|r| r.id()).collect();
    let mut index_of: HashMap<&RuleId, usize> = HashMap::new();
    for (i, id) in ids.iter().enumerate() {
        id.validate()?;
        if index_of.insert(id, i).is_some() {
            return Err(ScheduleError::DuplicateRule(id.clone()));
        }
    }

    let n = rules.len();
    let mut late = vec![false; n];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut predecessors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

    for (i, rule) in rules.iter().enumerate() {
        for modifier in rule.visitor_modifiers() {
            match modifier {
                VisitorModifier::RunAsLateAsPossible => late[i] = true,
                VisitorModifier::RunAfter { rule_id, mode } => match index_of.get(&rule_id) {
                    Some(&before) => {
                        if predecessors[i].insert(before) {
                            successors[before].push(i);
                        }
                    }
                    None if mode == RunAfterMode::RequiresLoaded => {
                        return Err(ScheduleError::RequiredRuleNotLoaded {
                            rule: ids[i].clone(),
                            required: rule_id,
                        });
                    }
                    None => {
                        debug!(
                            "Rule '{}' runs after '{}' which is not loaded; ignoring",
                            ids[i], rule_id
                        );
                    }
                },
            }
        }
    }

    let mut in_degree: Vec<usize> = predecessors.iter().map(BTreeSet::len).collect();
    let mut ready: BinaryHeap<Reverse<(bool, usize)>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(|i| Reverse((late[i], i)))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse((_, i))) = ready.pop() {
        order.push(i);
        for &next in &successors[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((late[next], next)));
            }
        }
    }

    if order.len() < n {
        return Err(cycle_error(&ids, &predecessors, &in_degree));
    }

    debug!(
        "Rule execution order: {}",
        order
            .iter()
            .map(|&i| ids[i].as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut slots: Vec<Option<Arc<dyn Rule>>> = rules.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

fn cycle_error(
    ids: &[RuleId],
    predecessors: &[BTreeSet<usize>],
    in_degree: &[usize],
) -> ScheduleError {
    let blocked: Vec<usize> = (0..ids.len()).filter(|&i| in_degree[i] > 0).collect();
    let mut report = String::from(
        "Found cyclic dependencies between required rules that should run after another rule:",
    );
    for &i in &blocked {
        let waiting_on: Vec<&str> = predecessors[i]
            .iter()
            .filter(|&&p| in_degree[p] > 0)
            .map(|&p| ids[p].as_str())
            .collect();
        if !waiting_on.is_empty() {
            let _ = write!(
                report,
                "\n  - Rule with id '{}' should run after rule(s) with id '{}'",
                ids[i],
                waiting_on.join(", ")
            );
        }
    }
    ScheduleError::Cycle {
        report,
        rules: blocked.into_iter().map(|i| ids[i].clone()).collect(),
    }
}
