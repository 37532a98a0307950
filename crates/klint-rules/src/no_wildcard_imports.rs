//! Rule to forbid wildcard imports.
//!
//! Packages listed in `ij_kotlin_packages_to_use_import_on_demand` may still
//! be imported with `*`. A pattern ending in `.*` allows the package itself,
//! one ending in `.**` also allows its subpackages. When the property is not
//! set, the `ktlint_official` code style allows nothing and the other styles
//! allow `java.util.*` and `kotlinx.android.synthetic.**`.

use klint_core::config::{CodeStyle, PropertyDef, PropertyKind, PropertyValue};
use klint_core::{
    Capabilities, Flow, NodeId, Rule, RuleError, RuleId, SessionContext, SyntaxKind,
};

/// Rule id of no-wildcard-imports.
pub const ID: RuleId = RuleId::from_static("standard:no-wildcard-imports");

/// Packages allowed to be imported on demand.
pub const PACKAGES_TO_USE_IMPORT_ON_DEMAND: &str = "ij_kotlin_packages_to_use_import_on_demand";

const IDEA_DEFAULT: &str = "java.util.*,kotlinx.android.synthetic.**";

/// Reports `import a.b.*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWildcardImports;

impl NoWildcardImports {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Pattern {
    package: String,
    with_subpackages: bool,
}

impl Pattern {
    fn matches(&self, package: &str) -> bool {
        package == self.package
            || (self.with_subpackages
                && package
                    .strip_prefix(self.package.as_str())
                    .is_some_and(|rest| rest.starts_with('.')))
    }
}

fn parse_patterns(value: &str) -> Vec<Pattern> {
    if value.eq_ignore_ascii_case("unset") {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter_map(|entry| {
            if let Some(package) = entry.strip_suffix(".**") {
                Some(Pattern {
                    package: package.to_string(),
                    with_subpackages: true,
                })
            } else {
                entry.strip_suffix(".*").map(|package| Pattern {
                    package: package.to_string(),
                    with_subpackages: false,
                })
            }
        })
        .collect()
}

impl Rule for NoWildcardImports {
    fn id(&self) -> RuleId {
        ID
    }

    fn description(&self) -> &'static str {
        "Wildcard imports are not allowed"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default().lint_only().with_config()
    }

    fn config_properties(&self) -> Vec<PropertyDef> {
        vec![PropertyDef {
            name: PACKAGES_TO_USE_IMPORT_ON_DEMAND,
            kind: PropertyKind::Str,
            default: PropertyValue::Str(String::new()),
            description: "Comma separated packages allowed to be imported with '*'",
        }]
    }

    fn visit(&self, node: NodeId, ctx: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != SyntaxKind::ImportDirective {
            return Ok(Flow::Continue);
        }
        let text = tree.text(node);
        let path = text
            .trim()
            .trim_start_matches("import")
            .trim()
            .trim_end_matches(';')
            .trim_end();
        let Some(package) = path.strip_suffix(".*") else {
            return Ok(Flow::SkipChildren);
        };
        let package: String = package.chars().filter(|c| !c.is_whitespace()).collect();

        let config = ctx.config();
        let allowed = match config.raw(PACKAGES_TO_USE_IMPORT_ON_DEMAND) {
            Some(_) => parse_patterns(config.get_str(PACKAGES_TO_USE_IMPORT_ON_DEMAND).unwrap_or("")),
            None if config.code_style() == CodeStyle::KtlintOfficial => Vec::new(),
            None => parse_patterns(IDEA_DEFAULT),
        };
        if !allowed.iter().any(|p| p.matches(&package)) {
            ctx.emit(node, "Wildcard import", false);
        }
        Ok(Flow::SkipChildren)
    }
}
