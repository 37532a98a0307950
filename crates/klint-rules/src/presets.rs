//! Rule presets for common configurations.

use crate::{
    FinalNewline, MaxLineLength, NoConsecutiveBlankLines, NoMultiSpaces, NoTrailingSpaces,
    NoWildcardImports,
};
use klint_core::RuleBox;

/// Preset configurations for klint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Every built-in rule.
    Standard,
    /// Only rules that can fix what they report.
    Formatting,
    /// Whitespace hygiene only, for gradual adoption.
    Minimal,
}

impl Preset {
    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        match self {
            Self::Standard => standard_rules(),
            Self::Formatting => formatting_rules(),
            Self::Minimal => minimal_rules(),
        }
    }
}

/// Returns the standard set of rules.
///
/// Includes all formatting rules plus:
/// - `max-line-length` - Reports lines longer than `max_line_length`
/// - `no-wildcard-imports` - Reports `import a.b.*`
#[must_use]
pub fn standard_rules() -> Vec<RuleBox> {
    let mut rules = formatting_rules();
    rules.push(Box::new(MaxLineLength::new()));
    rules.push(Box::new(NoWildcardImports::new()));
    rules
}

/// Returns the rules that can autocorrect.
///
/// Includes:
/// - `no-trailing-spaces`
/// - `no-multi-spaces`
/// - `no-consecutive-blank-lines`
/// - `final-newline`
#[must_use]
pub fn formatting_rules() -> Vec<RuleBox> {
    vec![
        Box::new(NoTrailingSpaces::new()),
        Box::new(NoMultiSpaces::new()),
        Box::new(NoConsecutiveBlankLines::new()),
        Box::new(FinalNewline::new()),
    ]
}

/// Returns the minimal set of rules.
#[must_use]
pub fn minimal_rules() -> Vec<RuleBox> {
    vec![
        Box::new(NoTrailingSpaces::new()),
        Box::new(FinalNewline::new()),
    ]
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    standard_rules()
}
