//! Legacy `ktlint-disable` / `ktlint-enable` comment directives.

use std::collections::BTreeSet;

use super::ids;

/// Marker of a disable directive.
pub const DISABLE_MARKER: &str = "ktlint-disable";
/// Marker of an enable directive.
pub const ENABLE_MARKER: &str = "ktlint-enable";

/// Kind of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Starts suppressing rules.
    Disable,
    /// Stops suppressing rules.
    Enable,
}

impl DirectiveKind {
    /// Marker text introducing the directive.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Disable => DISABLE_MARKER,
            Self::Enable => ENABLE_MARKER,
        }
    }
}

/// One rule reference listed after the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdToken {
    /// Text as written.
    pub raw: String,
    /// Qualified rule id, e.g. `standard:foo`.
    pub qualified: String,
    /// Character position of the token, relative to the end of the marker.
    pub position: usize,
}

/// Content of a comment holding a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDirective {
    /// Disable or enable.
    pub kind: DirectiveKind,
    /// Character position of the marker inside the comment text.
    pub marker_offset: usize,
    /// Referenced rules, first occurrence of each qualified id only.
    pub tokens: Vec<IdToken>,
}

impl ParsedDirective {
    /// Parses the text of an end-of-line (`//`) or block (`/* */`) comment.
    ///
    /// Returns `None` when the comment is not a directive.
    #[must_use]
    pub fn parse(comment: &str) -> Option<Self> {
        let body = if let Some(rest) = comment.strip_prefix("//") {
            rest
        } else {
            let rest = comment.strip_prefix("/*")?;
            rest.strip_suffix("*/").unwrap_or(rest)
        };
        let body = body.trim();
        let kind = if body.starts_with(DISABLE_MARKER) {
            DirectiveKind::Disable
        } else if body.starts_with(ENABLE_MARKER) {
            DirectiveKind::Enable
        } else {
            return None;
        };
        let marker = kind.marker();
        let marker_offset = comment
            .find(marker)
            .map_or(0, |byte| comment[..byte].chars().count());
        Some(Self {
            kind,
            marker_offset,
            tokens: tokenize(&body[marker.len()..]),
        })
    }

    /// Qualified ids as a set, used to match enable directives with disable
    /// directives.
    #[must_use]
    pub fn key(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(|t| t.qualified.as_str()).collect()
    }

    /// Character position of a token relative to the start of the comment.
    #[must_use]
    pub fn token_offset(&self, token: &IdToken) -> usize {
        self.marker_offset + self.kind.marker().chars().count() + token.position
    }
}

fn tokenize(ids: &str) -> Vec<IdToken> {
    let mut tokens: Vec<IdToken> = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (position, c) in ids.chars().chain(std::iter::once(' ')).enumerate() {
        if !c.is_whitespace() {
            if current.is_empty() {
                start = position;
            }
            current.push(c);
            continue;
        }
        if current.is_empty() {
            continue;
        }
        let raw = std::mem::take(&mut current);
        let qualified = ids::qualify(&raw);
        if tokens.iter().all(|t| t.qualified != qualified) {
            tokens.push(IdToken {
                raw,
                qualified,
                position: start,
            });
        }
    }
    tokens
}
