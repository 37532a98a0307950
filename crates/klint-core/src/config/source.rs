//! Per-directory raw property sources.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use super::ConfigError;

/// Raw properties configured for one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSection {
    /// Stops the cascade: parent directories are not consulted.
    pub root: bool,
    /// Property values as text.
    pub properties: BTreeMap<String, String>,
}

impl RawSection {
    /// Creates an empty, non-root section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the section as the cascade root.
    #[must_use]
    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Supplies already-parsed property maps per directory.
pub trait PropertySource: Send + Sync {
    /// Returns the section configured directly in `dir`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read.
    fn load(&self, dir: &Path) -> Result<Option<RawSection>, ConfigError>;
}

/// In-memory source keyed by directory.
#[derive(Debug, Default)]
pub struct MemoryPropertySource {
    sections: HashMap<PathBuf, RawSection>,
    loads: AtomicUsize,
}

impl MemoryPropertySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the section for a directory.
    #[must_use]
    pub fn with_section(mut self, dir: impl Into<PathBuf>, section: RawSection) -> Self {
        self.sections.insert(dir.into(), section);
        self
    }

    /// Number of `load` calls served so far.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PropertySource for MemoryPropertySource {
    fn load(&self, dir: &Path) -> Result<Option<RawSection>, ConfigError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.sections.get(dir).cloned())
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".klint.toml";

#[derive(Debug, Deserialize)]
struct TomlSection {
    #[serde(default)]
    root: bool,
    #[serde(flatten)]
    properties: BTreeMap<String, toml::Value>,
}

/// Reads one TOML file per directory.
///
/// ```toml
/// root = true
/// indent_size = 2
/// max_line_length = "off"
/// ktlint_standard_no-multi-spaces = "disabled"
/// ```
#[derive(Debug, Clone)]
pub struct TomlPropertySource {
    file_name: String,
}

impl Default for TomlPropertySource {
    fn default() -> Self {
        Self::new(CONFIG_FILE_NAME)
    }
}

impl TomlPropertySource {
    /// Creates a source reading `file_name` in each directory.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Parses a section from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<RawSection, ConfigError> {
        let section: TomlSection = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        let properties = section
            .properties
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect();
        Ok(RawSection {
            root: section.root,
            properties,
        })
    }
}

impl PropertySource for TomlPropertySource {
    fn load(&self, dir: &Path) -> Result<Option<RawSection>, ConfigError> {
        let path = dir.join(&self.file_name);
        if !path.is_file() {
            return Ok(None);
        }
        tracing::debug!("Reading config layer: {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        Self::parse(&content)
            .map(Some)
            .map_err(|e| match e {
                ConfigError::Parse { message, .. } => ConfigError::Parse {
                    path: Some(path),
                    message,
                },
                other => other,
            })
    }
}
