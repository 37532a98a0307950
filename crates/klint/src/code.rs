//! Source text handed to the engine.

use std::path::{Path, PathBuf};

/// A Kotlin source file or script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Source text.
    pub text: String,
    /// Path of the file, used to resolve configuration.
    pub path: Option<PathBuf>,
    /// Whether the text is a Kotlin script (`.kts`).
    pub script: bool,
}

impl Code {
    /// Creates code from text without a path.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
            script: false,
        }
    }

    /// Creates code from text with the path it belongs to.
    ///
    /// A `.kts` extension marks the code as a script.
    #[must_use]
    pub fn with_path(text: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let script = is_script(&path);
        Self {
            text: text.into(),
            path: Some(path),
            script,
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)?;
        Ok(Self::with_path(text, path))
    }

    /// Marks the code as a script.
    #[must_use]
    pub fn script(mut self, script: bool) -> Self {
        self.script = script;
        self
    }
}

fn is_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "kts")
}

/// Line separator used by a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineSeparator {
    Lf,
    CrLf,
}

impl LineSeparator {
    /// Separator of the first line break; `\n` when there is none.
    pub(crate) fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    /// Text with every `\r\n` replaced by `\n`.
    pub(crate) fn normalize(text: &str) -> String {
        text.replace("\r\n", "\n")
    }

    /// Converts normalized text back to this separator.
    pub(crate) fn restore(self, text: String) -> String {
        match self {
            Self::Lf => text,
            Self::CrLf => text.replace('\n', "\r\n"),
        }
    }
}
