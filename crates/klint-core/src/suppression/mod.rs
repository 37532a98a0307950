//! Rule suppression.
//!
//! Suppressions are `@Suppress("ktlint:<ruleSet>:<rule>")` annotations (or
//! `@SuppressWarnings`) on declarations, parameters, arguments, statements
//! and the file. `"ktlint"` suppresses every rule.
//!
//! Legacy `ktlint-disable` / `ktlint-enable` comments are still honored when
//! filtering violations, and [`SuppressionRule`] migrates them to annotations
//! in format mode.

pub mod annotation;
pub mod directive;
pub mod ids;
mod index;
mod plan;
mod rule;

pub use index::SuppressionIndex;
pub use rule::{SuppressionRule, SUPPRESSION_RULE_ID};
