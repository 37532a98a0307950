//! Declared configuration properties and their typed values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type accepted by a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `true` or `false`.
    Bool,
    /// Integer not below `min`.
    Int {
        /// Smallest accepted value.
        min: i64,
    },
    /// Positive integer, or `off`. Zero and negative values mean `off`.
    IntOrOff,
    /// One of a fixed set of lowercase names.
    Enum(&'static [&'static str]),
    /// Free-form text.
    Str,
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Text or enumerated value.
    Str(String),
    /// Explicitly switched off.
    Off,
}

/// Declaration of a configuration property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Property name as written in configuration.
    pub name: &'static str,
    /// Accepted value type.
    pub kind: PropertyKind,
    /// Value used when the property is unset or malformed.
    pub default: PropertyValue,
    /// Short description.
    pub description: &'static str,
}

impl PropertyDef {
    /// Parses a raw value according to this property's kind.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value is not acceptable.
    pub fn parse(&self, raw: &str) -> Result<PropertyValue, String> {
        let raw = raw.trim();
        match self.kind {
            PropertyKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(PropertyValue::Bool(true)),
                "false" => Ok(PropertyValue::Bool(false)),
                _ => Err(format!("expected 'true' or 'false', got '{raw}'")),
            },
            PropertyKind::Int { min } => match raw.parse::<i64>() {
                Ok(n) if n >= min => Ok(PropertyValue::Int(n)),
                Ok(n) => Err(format!("expected an integer of at least {min}, got {n}")),
                Err(_) => Err(format!("expected an integer, got '{raw}'")),
            },
            PropertyKind::IntOrOff => {
                if raw.eq_ignore_ascii_case("off") || raw.eq_ignore_ascii_case("unset") {
                    return Ok(PropertyValue::Off);
                }
                match raw.parse::<i64>() {
                    Ok(n) if n > 0 => Ok(PropertyValue::Int(n)),
                    Ok(_) => Ok(PropertyValue::Off),
                    Err(_) => Err(format!("expected an integer or 'off', got '{raw}'")),
                }
            }
            PropertyKind::Enum(allowed) => {
                let lower = raw.to_ascii_lowercase();
                if allowed.contains(&lower.as_str()) {
                    Ok(PropertyValue::Str(lower))
                } else {
                    Err(format!(
                        "expected one of [{}], got '{raw}'",
                        allowed.join(", ")
                    ))
                }
            }
            PropertyKind::Str => Ok(PropertyValue::Str(raw.to_string())),
        }
    }
}

/// `indent_size`
pub const INDENT_SIZE: &str = "indent_size";
/// `indent_style`
pub const INDENT_STYLE: &str = "indent_style";
/// `max_line_length`
pub const MAX_LINE_LENGTH: &str = "max_line_length";
/// `insert_final_newline`
pub const INSERT_FINAL_NEWLINE: &str = "insert_final_newline";
/// `ktlint_code_style`
pub const CODE_STYLE: &str = "ktlint_code_style";
/// `ij_kotlin_allow_trailing_comma`
pub const TRAILING_COMMA_ON_DECLARATION_SITE: &str = "ij_kotlin_allow_trailing_comma";
/// `ij_kotlin_allow_trailing_comma_on_call_site`
pub const TRAILING_COMMA_ON_CALL_SITE: &str = "ij_kotlin_allow_trailing_comma_on_call_site";

/// Indentation character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// Indent with spaces.
    Space,
    /// Indent with tabs.
    Tab,
}

/// Code style preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStyle {
    /// Default style.
    KtlintOfficial,
    /// IntelliJ IDEA default formatter compatible style.
    IntellijIdea,
    /// Android Studio compatible style.
    AndroidStudio,
}

impl CodeStyle {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ktlint_official" => Some(Self::KtlintOfficial),
            "intellij_idea" => Some(Self::IntellijIdea),
            "android_studio" => Some(Self::AndroidStudio),
            _ => None,
        }
    }

    pub(crate) fn parse_value(value: Option<&PropertyValue>) -> Self {
        match value {
            Some(PropertyValue::Str(name)) => Self::from_name(name).unwrap_or(Self::KtlintOfficial),
            _ => Self::KtlintOfficial,
        }
    }
}

/// Properties understood by the engine itself.
#[must_use]
pub fn builtin_properties() -> Vec<PropertyDef> {
    vec![
        PropertyDef {
            name: INDENT_SIZE,
            kind: PropertyKind::Int { min: 1 },
            default: PropertyValue::Int(4),
            description: "Number of columns per indentation level",
        },
        PropertyDef {
            name: INDENT_STYLE,
            kind: PropertyKind::Enum(&["space", "tab"]),
            default: PropertyValue::Str("space".to_string()),
            description: "Indent with spaces or tabs",
        },
        PropertyDef {
            name: MAX_LINE_LENGTH,
            kind: PropertyKind::IntOrOff,
            default: PropertyValue::Off,
            description: "Maximum line length, or 'off'",
        },
        PropertyDef {
            name: INSERT_FINAL_NEWLINE,
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(true),
            description: "Whether a file ends with a newline",
        },
        PropertyDef {
            name: CODE_STYLE,
            kind: PropertyKind::Enum(&["ktlint_official", "intellij_idea", "android_studio"]),
            default: PropertyValue::Str("ktlint_official".to_string()),
            description: "Code style preset",
        },
        PropertyDef {
            name: TRAILING_COMMA_ON_DECLARATION_SITE,
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(true),
            description: "Require trailing commas on declaration sites",
        },
        PropertyDef {
            name: TRAILING_COMMA_ON_CALL_SITE,
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(true),
            description: "Require trailing commas on call sites",
        },
    ]
}

/// Set of declared properties, keyed by name.
#[derive(Debug, Clone)]
pub struct PropertyRegistry {
    defs: BTreeMap<&'static str, PropertyDef>,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        let mut registry = Self {
            defs: BTreeMap::new(),
        };
        for def in builtin_properties() {
            registry.register(def);
        }
        registry
    }
}

impl PropertyRegistry {
    /// Creates a registry holding the built-in properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property. A later declaration with the same name wins.
    pub fn register(&mut self, def: PropertyDef) {
        self.defs.insert(def.name, def);
    }

    /// Adds several declarations.
    #[must_use]
    pub fn with(mut self, defs: impl IntoIterator<Item = PropertyDef>) -> Self {
        for def in defs {
            self.register(def);
        }
        self
    }

    /// Looks up a declaration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyDef> {
        self.defs.get(name)
    }

    /// Iterates over all declarations.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDef> {
        self.defs.values()
    }
}
