//! Core types for lint violations and results.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rule::RuleId;

/// Source code location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Character offset in the text the violation was reported against.
    pub offset: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// A lint violation found during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that reported the violation.
    pub rule: RuleId,
    /// Primary location of the violation.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Whether the rule can fix the violation.
    pub can_be_autocorrected: bool,
    /// Whether the violation was fixed in this run.
    pub corrected: bool,
}

impl Violation {
    /// Creates a new, uncorrected violation.
    #[must_use]
    pub fn new(
        rule: RuleId,
        location: Location,
        message: impl Into<String>,
        can_be_autocorrected: bool,
    ) -> Self {
        Self {
            rule,
            location,
            message: message.into(),
            can_be_autocorrected,
            corrected: false,
        }
    }

    /// Marks the violation as fixed.
    #[must_use]
    pub fn corrected(mut self, corrected: bool) -> Self {
        self.corrected = corrected;
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        let suffix = if self.corrected {
            " (corrected)"
        } else if !self.can_be_autocorrected {
            " (cannot be auto-corrected)"
        } else {
            ""
        };
        format!(
            "{}:{}: {} ({}){suffix}",
            self.location.line, self.location.column, self.message, self.rule
        )
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// Converts a Violation to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(v: &Violation) -> Self {
        Self {
            message: v.message.clone(),
            help: (v.can_be_autocorrected && !v.corrected)
                .then(|| "can be fixed automatically in format mode".to_string()),
            span: SourceSpan::from((v.location.offset, 0)),
            label_message: v.rule.to_string(),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileResult {
    /// Path of the file, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Violations remaining after suppression, ordered by position.
    pub violations: Vec<Violation>,
    /// Formatted text, in format mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Format mode stopped at the pass cap while edits were still happening.
    #[serde(default)]
    pub did_not_stabilize: bool,
    /// The session was cancelled before completing.
    #[serde(default)]
    pub partial: bool,
    /// The file could not be processed, e.g. a parse error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    /// Returns true if violations remain that were not corrected.
    #[must_use]
    pub fn has_uncorrected(&self) -> bool {
        self.violations.iter().any(|v| !v.corrected)
    }
}

/// Result of processing a batch of files.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// Per-file outcomes, in input order.
    pub files: Vec<FileResult>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files processed.
    #[must_use]
    pub fn files_checked(&self) -> usize {
        self.files.len()
    }

    /// Iterates over all violations of all files.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.files.iter().flat_map(|f| f.violations.iter())
    }

    /// Returns true if any file has uncorrected violations or failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.files
            .iter()
            .any(|f| f.has_uncorrected() || f.error.is_some())
    }

    /// Counts `(uncorrected, corrected)` violations.
    #[must_use]
    pub fn count(&self) -> (usize, usize) {
        let corrected = self.violations().filter(|v| v.corrected).count();
        let total = self.violations().count();
        (total - corrected, corrected)
    }

    /// Formats violations as a test failure report.
    ///
    /// Produces a human-readable multi-line report suitable for `panic!()` messages
    /// in `cargo test` integration.
    #[must_use]
    pub fn format_test_report(&self) -> String {
        use std::fmt::Write;

        let (uncorrected, corrected) = self.count();
        let mut report = String::new();
        let _ = writeln!(report, "\n=== klint: {uncorrected} violation(s) ===\n");

        for file in &self.files {
            let name = file
                .path
                .as_ref()
                .map_or_else(|| "<text>".to_string(), |p| p.display().to_string());
            if let Some(error) = &file.error {
                let _ = writeln!(report, "{name}: {error}");
            }
            for v in file.violations.iter().filter(|v| !v.corrected) {
                let _ = writeln!(report, "{name}:{v}");
            }
            if file.did_not_stabilize {
                let _ = writeln!(report, "{name}: format did not stabilize");
            }
        }

        let _ = writeln!(
            report,
            "\nTotal: {uncorrected} violation(s), {corrected} corrected in {} file(s)",
            self.files_checked()
        );
        report
    }

    /// Adds files from another result.
    pub fn extend(&mut self, other: Self) {
        self.files.extend(other.files);
    }
}
