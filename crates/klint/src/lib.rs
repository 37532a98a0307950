//! # klint
//!
//! Kotlin linter and formatter.
//!
//! This is the facade crate: it re-exports the rule engine from `klint-core`,
//! the built-in rules from `klint-rules`, and the Tree-sitter based parser
//! from `klint-kotlin`, and adds [`RuleEngine`], which processes whole files
//! (optionally many of them in parallel).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use klint::{Code, RuleEngine};
//! use klint::rules::Preset;
//!
//! let engine = RuleEngine::builder()
//!     .preset(Preset::Standard)
//!     .override_value("max_line_length", "120")
//!     .build()?;
//!
//! let result = engine.format(&Code::from_path("src/Main.kt")?)?;
//! for violation in &result.violations {
//!     println!("{violation}");
//! }
//! ```
//!
//! ## Configuration
//!
//! Per-directory `.klint.toml` files cascade up to the nearest one marked
//! `root = true`:
//!
//! ```toml
//! root = true
//! max_line_length = 120
//! ktlint_standard_no-wildcard-imports = "disabled"
//! ```
//!
//! ```rust,ignore
//! use klint::config::TomlPropertySource;
//!
//! let engine = RuleEngine::builder()
//!     .preset(Preset::Standard)
//!     .config_source(TomlPropertySource::default())
//!     .build()?;
//! ```
//!
//! ## Suppressions
//!
//! Violations are suppressed with `@Suppress("ktlint:<rule-id>")` on the
//! element or with `@file:Suppress("ktlint")` for the whole file. Legacy
//! `// ktlint-disable` comment directives are reported and, in format mode,
//! migrated into such annotations.

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use klint_core::*;

pub use klint_kotlin::KotlinParser;

/// Built-in rules and presets.
pub mod rules {
    pub use klint_rules::*;
}

mod code;
mod rule_engine;

pub use code::Code;
pub use rule_engine::{EngineError, RuleEngine, RuleEngineBuilder};
