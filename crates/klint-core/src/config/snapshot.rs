//! Resolved, read-only configuration for one file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::property::{
    CodeStyle, IndentStyle, PropertyRegistry, PropertyValue, CODE_STYLE, INDENT_SIZE,
    INDENT_STYLE, INSERT_FINAL_NEWLINE, MAX_LINE_LENGTH,
};
use crate::rule::RuleId;

/// A property value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Property name.
    pub property: String,
    /// Raw value as configured.
    pub value: String,
    /// Why the value was rejected.
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid value '{}' for property '{}': {}",
            self.value, self.property, self.message
        )
    }
}

/// Whether a rule runs for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleExecution {
    /// The rule runs.
    Enabled,
    /// The rule is switched off by configuration.
    Disabled,
}

impl RuleExecution {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enabled" => Some(Self::Enabled),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Immutable map from property name to typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, PropertyValue>,
    raw: BTreeMap<String, String>,
    issues: Vec<ConfigIssue>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::from_raw(&PropertyRegistry::new(), BTreeMap::new())
    }
}

impl ConfigSnapshot {
    /// Types raw values against the registry, falling back to defaults for
    /// unset and malformed values.
    #[must_use]
    pub fn from_raw(registry: &PropertyRegistry, raw: BTreeMap<String, String>) -> Self {
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();
        for def in registry.iter() {
            let value = match raw.get(def.name) {
                Some(text) => def.parse(text).unwrap_or_else(|message| {
                    tracing::warn!(
                        "Invalid value '{}' for property '{}', using default: {}",
                        text,
                        def.name,
                        message
                    );
                    issues.push(ConfigIssue {
                        property: def.name.to_string(),
                        value: text.clone(),
                        message,
                    });
                    def.default.clone()
                }),
                None => def.default.clone(),
            };
            values.insert(def.name.to_string(), value);
        }
        for (key, text) in &raw {
            if is_rule_execution_key(key) && RuleExecution::parse(text).is_none() {
                tracing::warn!("Invalid value '{}' for property '{}', ignoring", text, key);
                issues.push(ConfigIssue {
                    property: key.clone(),
                    value: text.clone(),
                    message: "expected 'enabled' or 'disabled'".to_string(),
                });
            }
        }
        Self {
            values,
            raw,
            issues,
        }
    }

    pub(crate) fn prepend_issues(&mut self, issues: &[ConfigIssue]) {
        if !issues.is_empty() {
            let mut all = issues.to_vec();
            all.append(&mut self.issues);
            self.issues = all;
        }
    }

    /// Returns the typed value of a declared property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Returns the raw configured text of any property, declared or not.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    /// Returns a boolean property.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns an integer property.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(PropertyValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns a text or enumerated property.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(PropertyValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Values that were rejected during resolution.
    #[must_use]
    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    /// Columns per indentation level.
    #[must_use]
    pub fn indent_size(&self) -> usize {
        self.get_int(INDENT_SIZE)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(4)
    }

    /// Indentation character.
    #[must_use]
    pub fn indent_style(&self) -> IndentStyle {
        match self.get_str(INDENT_STYLE) {
            Some("tab") => IndentStyle::Tab,
            _ => IndentStyle::Space,
        }
    }

    /// Text of one indentation level.
    #[must_use]
    pub fn indent_unit(&self) -> String {
        match self.indent_style() {
            IndentStyle::Tab => "\t".to_string(),
            IndentStyle::Space => " ".repeat(self.indent_size()),
        }
    }

    /// Maximum line length, or `None` when switched off.
    #[must_use]
    pub fn max_line_length(&self) -> Option<usize> {
        self.get_int(MAX_LINE_LENGTH)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Whether files end with a newline.
    #[must_use]
    pub fn insert_final_newline(&self) -> bool {
        self.get_bool(INSERT_FINAL_NEWLINE).unwrap_or(true)
    }

    /// Code style preset.
    #[must_use]
    pub fn code_style(&self) -> CodeStyle {
        CodeStyle::parse_value(self.get(CODE_STYLE))
    }

    /// Execution switch for a rule.
    ///
    /// `ktlint_<ruleSet>_<rule>` takes precedence over `ktlint_<ruleSet>`.
    /// Rules are enabled unless switched off.
    #[must_use]
    pub fn rule_execution(&self, rule: &RuleId) -> RuleExecution {
        let rule_key = format!("ktlint_{}_{}", rule.rule_set(), rule.name());
        let set_key = format!("ktlint_{}", rule.rule_set());
        [rule_key, set_key]
            .iter()
            .find_map(|key| self.raw(key).and_then(RuleExecution::parse))
            .unwrap_or(RuleExecution::Enabled)
    }

    /// Returns true unless configuration disables the rule.
    #[must_use]
    pub fn is_rule_enabled(&self, rule: &RuleId) -> bool {
        self.rule_execution(rule) == RuleExecution::Enabled
    }
}

fn is_rule_execution_key(key: &str) -> bool {
    key.starts_with("ktlint_") && key != CODE_STYLE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        let raw = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConfigSnapshot::from_raw(&PropertyRegistry::new(), raw)
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ConfigSnapshot::default();
        assert_eq!(config.indent_size(), 4);
        assert_eq!(config.indent_style(), IndentStyle::Space);
        assert_eq!(config.indent_unit(), "    ");
        assert_eq!(config.max_line_length(), None);
        assert!(config.insert_final_newline());
        assert_eq!(config.code_style(), CodeStyle::KtlintOfficial);
        assert!(config.issues().is_empty());
    }

    #[test]
    fn malformed_value_falls_back_for_that_property_only() {
        let config = snapshot(&[(INDENT_SIZE, "wide"), (MAX_LINE_LENGTH, "100")]);
        assert_eq!(config.indent_size(), 4);
        assert_eq!(config.max_line_length(), Some(100));
        assert_eq!(config.issues().len(), 1);
        assert_eq!(config.issues()[0].property, INDENT_SIZE);
        assert_eq!(config.issues()[0].value, "wide");
    }

    #[test]
    fn tab_indent_unit() {
        let config = snapshot(&[(INDENT_STYLE, "tab")]);
        assert_eq!(config.indent_unit(), "\t");
    }

    #[test]
    fn rule_switch_beats_rule_set_switch() {
        let config = snapshot(&[
            ("ktlint_standard", "disabled"),
            ("ktlint_standard_final-newline", "enabled"),
        ]);
        assert!(config.is_rule_enabled(&RuleId::from_static("standard:final-newline")));
        assert!(!config.is_rule_enabled(&RuleId::from_static("standard:no-multi-spaces")));
        assert!(config.is_rule_enabled(&RuleId::from_static("custom:foo")));
    }

    #[test]
    fn malformed_rule_switch_is_reported_and_ignored() {
        let config = snapshot(&[("ktlint_standard_final-newline", "nope")]);
        assert!(config.is_rule_enabled(&RuleId::from_static("standard:final-newline")));
        assert_eq!(config.issues().len(), 1);
    }

    #[test]
    fn undeclared_properties_are_kept_raw() {
        let config = snapshot(&[("my_rule_option", "42")]);
        assert_eq!(config.raw("my_rule_option"), Some("42"));
        assert_eq!(config.get("my_rule_option"), None);
    }
}
