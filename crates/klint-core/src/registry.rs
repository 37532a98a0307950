//! Immutable set of loaded rules in execution order.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::{ConfigSnapshot, PropertyRegistry};
use crate::rule::{Rule, RuleBox, RuleId};
use crate::scheduler::{schedule, ScheduleError};
use crate::suppression::SuppressionRule;

/// Rule set id reserved for rules provided by the engine itself.
pub const INTERNAL_RULE_SET: &str = "internal";

/// Loaded rules, validated and ordered once at startup.
///
/// The registry always contains the internal suppression rule, registered
/// ahead of all other rules.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    ids: BTreeSet<RuleId>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.id()))
            .finish()
    }
}

impl RuleRegistry {
    /// Registers and schedules rules.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleError`] if the rules cannot be ordered; this is a
    /// fatal configuration error for the whole run.
    pub fn new(rules: Vec<RuleBox>) -> Result<Self, ScheduleError> {
        let known: BTreeSet<RuleId> = rules.iter().map(|r| r.id()).collect();
        let mut all: Vec<Arc<dyn Rule>> = Vec::with_capacity(rules.len() + 1);
        all.push(Arc::new(SuppressionRule::new(known)));
        all.extend(rules.into_iter().map(Arc::from));

        let rules = schedule(all)?;
        let ids = rules.iter().map(|r| r.id()).collect();
        Ok(Self { rules, ids })
    }

    /// Rules in execution order.
    #[must_use]
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// Returns true if a rule with this id is loaded.
    #[must_use]
    pub fn is_loaded(&self, id: &RuleId) -> bool {
        self.ids.contains(id)
    }

    /// Ids of all loaded rules.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<RuleId> {
        &self.ids
    }

    /// Rules that run for a file with the given configuration, in order.
    ///
    /// Internal rules always run.
    #[must_use]
    pub fn rules_for(&self, config: &ConfigSnapshot) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| {
                let id = r.id();
                id.rule_set() == INTERNAL_RULE_SET || config.is_rule_enabled(&id)
            })
            .cloned()
            .collect()
    }

    /// Built-in properties plus the properties declared by the loaded rules
    /// that read configuration.
    #[must_use]
    pub fn property_registry(&self) -> PropertyRegistry {
        PropertyRegistry::new().with(self.rules.iter().flat_map(|r| {
            let properties = r.config_properties();
            if r.capabilities().uses_config {
                properties
            } else {
                if !properties.is_empty() {
                    warn!(
                        "Ignoring properties of '{}', which does not declare it reads configuration",
                        r.id()
                    );
                }
                Vec::new()
            }
        }))
    }
}
