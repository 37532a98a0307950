//! # klint-rules
//!
//! Built-in Kotlin lint and format rules for klint.
//!
//! ## Available Rules
//!
//! | Id | Autocorrect | Description |
//! |----|-------------|-------------|
//! | `standard:no-trailing-spaces` | yes | Removes spaces and tabs at the end of lines |
//! | `standard:no-multi-spaces` | yes | Collapses runs of spaces between tokens |
//! | `standard:no-consecutive-blank-lines` | yes | Allows at most one blank line in a row |
//! | `standard:final-newline` | yes | Enforces `insert_final_newline` |
//! | `standard:max-line-length` | no | Reports lines exceeding `max_line_length` |
//! | `standard:no-wildcard-imports` | no | Reports wildcard imports |
//!
//! ## Usage
//!
//! ```ignore
//! use klint_core::RuleRegistry;
//! use klint_rules::{NoTrailingSpaces, Preset};
//!
//! let registry = RuleRegistry::new(Preset::Standard.rules())?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod final_newline;
mod max_line_length;
mod no_consecutive_blank_lines;
mod no_multi_spaces;
mod no_trailing_spaces;
mod no_wildcard_imports;
mod presets;

#[cfg(test)]
mod testing;

pub use final_newline::FinalNewline;
pub use max_line_length::{MaxLineLength, IGNORE_BACKTICKED_IDENTIFIER};
pub use no_consecutive_blank_lines::NoConsecutiveBlankLines;
pub use no_multi_spaces::NoMultiSpaces;
pub use no_trailing_spaces::NoTrailingSpaces;
pub use no_wildcard_imports::{NoWildcardImports, PACKAGES_TO_USE_IMPORT_ON_DEMAND};
pub use presets::{all_rules, formatting_rules, minimal_rules, standard_rules, Preset};

/// Re-export core types for convenience.
pub use klint_core::{Rule, RuleId, Violation};
