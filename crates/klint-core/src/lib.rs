//! # klint-core
//!
//! Core rule engine for linting and formatting Kotlin syntax trees.
//!
//! This crate provides the engine the `klint` facade drives. It includes:
//!
//! - [`SyntaxTree`] arena with deferred structural [`Edit`]s
//! - [`Rule`] trait and [`RuleRegistry`] with deterministic scheduling
//! - [`Engine`] running lint passes and format passes to a fixed point
//! - [`ConfigResolver`] cascading per-directory properties into a [`ConfigSnapshot`]
//! - [`suppression`] of rules by annotations and legacy directives
//!
//! ## Example
//!
//! ```ignore
//! use klint_core::{ConfigSnapshot, Engine, Mode, RuleRegistry};
//!
//! let registry = RuleRegistry::new(rules)?;
//! let config = ConfigSnapshot::default();
//! let outcome = Engine::new(&registry, &config, Mode::Format).run(&mut tree);
//!
//! for violation in &outcome.violations {
//!     println!("{violation}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod engine;
mod parse;
mod registry;
mod rule;
mod scheduler;
pub mod suppression;
pub mod tree;
mod types;

pub use config::{ConfigError, ConfigResolver, ConfigSnapshot};
pub use engine::{
    CancellationToken, Engine, Mode, SessionContext, SessionOutcome, DEFAULT_MAX_FORMAT_PASSES,
};
pub use parse::{ParseError, SourceParser};
pub use registry::{RuleRegistry, INTERNAL_RULE_SET};
pub use rule::{
    Capabilities, Flow, Rule, RuleBox, RuleError, RuleId, RuleIdError, RunAfterMode, VisitScope,
    VisitorModifier,
};
pub use scheduler::{schedule, ScheduleError};
pub use tree::{Edit, Fragment, NodeId, SyntaxKind, SyntaxTree, TreeBuilder, TreeError};
pub use types::{FileResult, LintResult, Location, Violation, ViolationDiagnostic};
