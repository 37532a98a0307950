//! Configuration model and cascading resolution.
//!
//! A [`PropertySource`] supplies raw per-directory sections, the
//! [`ConfigResolver`] cascades and caches them, and each session receives an
//! immutable [`ConfigSnapshot`] with typed values.

mod property;
mod resolver;
mod snapshot;
mod source;

pub use property::{
    builtin_properties, CodeStyle, IndentStyle, PropertyDef, PropertyKind, PropertyRegistry,
    PropertyValue, CODE_STYLE, INDENT_SIZE, INDENT_STYLE, INSERT_FINAL_NEWLINE, MAX_LINE_LENGTH,
    TRAILING_COMMA_ON_CALL_SITE, TRAILING_COMMA_ON_DECLARATION_SITE,
};
pub use resolver::ConfigResolver;
pub use snapshot::{ConfigIssue, ConfigSnapshot, RuleExecution};
pub use source::{
    MemoryPropertySource, PropertySource, RawSection, TomlPropertySource, CONFIG_FILE_NAME,
};

use std::path::PathBuf;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading a config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in a config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// File that failed to parse, when known.
        path: Option<PathBuf>,
        /// Parse error message.
        message: String,
    },
}
