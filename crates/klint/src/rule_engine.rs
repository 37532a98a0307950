//! Entry point tying rules, configuration, and the parser together.

use std::path::Path;

use klint_core::config::{MemoryPropertySource, PropertySource};
use klint_core::{
    CancellationToken, ConfigResolver, ConfigSnapshot, Engine, FileResult, LintResult, Mode,
    ParseError, Rule, RuleBox, RuleRegistry, ScheduleError, SourceParser,
    DEFAULT_MAX_FORMAT_PASSES,
};
use klint_kotlin::KotlinParser;
use klint_rules::Preset;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::code::{Code, LineSeparator};

/// Errors that can occur while processing code.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rules could not be scheduled.
    #[error("Invalid rule set: {0}")]
    Schedule(#[from] ScheduleError),

    /// The code is not valid Kotlin.
    #[error("{path}: {source}")]
    Parse {
        /// File that failed to parse, or `<text>`.
        path: String,
        /// Parser error.
        source: ParseError,
    },
}

/// Builder for configuring a [`RuleEngine`].
#[derive(Default)]
pub struct RuleEngineBuilder {
    rules: Vec<RuleBox>,
    parser: Option<Box<dyn SourceParser>>,
    source: Option<Box<dyn PropertySource>>,
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
    max_passes: Option<usize>,
}

impl RuleEngineBuilder {
    /// Creates a new builder without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds the rules of a preset.
    #[must_use]
    pub fn preset(mut self, preset: Preset) -> Self {
        self.rules.extend(preset.rules());
        self
    }

    /// Replaces the Kotlin parser.
    #[must_use]
    pub fn parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Sets where per-directory configuration is read from.
    ///
    /// Without a source, only defaults and overrides apply.
    #[must_use]
    pub fn config_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Adds a property value applying below all configuration files.
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.push((name.into(), value.into()));
        self
    }

    /// Adds a property value applying above all configuration files.
    #[must_use]
    pub fn override_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    /// Sets the cap on format passes.
    #[must_use]
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules cannot be scheduled, e.g. because of a
    /// cyclic `runs-after` dependency.
    pub fn build(self) -> Result<RuleEngine, EngineError> {
        let registry = RuleRegistry::new(self.rules)?;
        info!("Loaded {} rule(s)", registry.rules().len());

        let mut resolver = match self.source {
            Some(source) => ConfigResolver::new(BoxedSource(source)),
            None => ConfigResolver::new(MemoryPropertySource::new()),
        }
        .registry(registry.property_registry());
        for (name, value) in self.defaults {
            resolver = resolver.default_value(name, value);
        }
        for (name, value) in self.overrides {
            resolver = resolver.override_value(name, value);
        }

        Ok(RuleEngine {
            registry,
            resolver,
            parser: self
                .parser
                .unwrap_or_else(|| Box::new(KotlinParser::new())),
            max_passes: self.max_passes.unwrap_or(DEFAULT_MAX_FORMAT_PASSES),
        })
    }
}

struct BoxedSource(Box<dyn PropertySource>);

impl PropertySource for BoxedSource {
    fn load(
        &self,
        dir: &Path,
    ) -> Result<Option<klint_core::config::RawSection>, klint_core::ConfigError> {
        self.0.load(dir)
    }
}

/// Lints and formats Kotlin code.
///
/// Use [`RuleEngine::builder()`] to construct an instance. The engine is
/// `Sync`; one instance serves any number of files and threads.
///
/// # Example
///
/// ```ignore
/// use klint::{Code, RuleEngine};
/// use klint::rules::Preset;
///
/// let engine = RuleEngine::builder().preset(Preset::Standard).build()?;
/// let result = engine.format(&Code::from_text("val a = 1  \n"))?;
/// assert_eq!(result.formatted.as_deref(), Some("val a = 1\n"));
/// ```
pub struct RuleEngine {
    registry: RuleRegistry,
    resolver: ConfigResolver,
    parser: Box<dyn SourceParser>,
    max_passes: usize,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.registry.ids())
            .field("max_passes", &self.max_passes)
            .finish_non_exhaustive()
    }
}

impl RuleEngine {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RuleEngineBuilder {
        RuleEngineBuilder::new()
    }

    /// Returns the loaded rules.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Resolves the configuration that applies to `path`.
    #[must_use]
    pub fn config_for(&self, path: &Path) -> ConfigSnapshot {
        self.resolver.resolve(path)
    }

    /// Reports violations without modifying the code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be parsed.
    pub fn lint(&self, code: &Code) -> Result<FileResult, EngineError> {
        self.run(code, Mode::Lint, None)
    }

    /// Fixes what can be fixed and reports all violations.
    ///
    /// The formatted text is returned in [`FileResult::formatted`].
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be parsed.
    pub fn format(&self, code: &Code) -> Result<FileResult, EngineError> {
        self.run(code, Mode::Format, None)
    }

    /// Runs a session that the caller may cancel between passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be parsed.
    pub fn run(
        &self,
        code: &Code,
        mode: Mode,
        cancellation: Option<CancellationToken>,
    ) -> Result<FileResult, EngineError> {
        let path = code.path.as_deref();
        debug!("{} {}", mode, display_name(path));

        let separator = LineSeparator::detect(&code.text);
        let text = LineSeparator::normalize(&code.text);
        let mut tree = self
            .parser
            .parse(&text, code.script)
            .map_err(|source| EngineError::Parse {
                path: display_name(path),
                source,
            })?;

        let config = self.resolver.resolve(path.unwrap_or_else(|| Path::new("")));
        for issue in config.issues() {
            debug!("Configuration issue for '{}': {}", issue.property, issue.message);
        }

        let mut engine = Engine::new(&self.registry, &config, mode).max_passes(self.max_passes);
        if let Some(path) = path {
            engine = engine.path(path);
        }
        if let Some(token) = cancellation {
            engine = engine.cancellation(token);
        }
        let outcome = engine.run(&mut tree);

        Ok(FileResult {
            path: code.path.clone(),
            violations: outcome.violations,
            formatted: (mode == Mode::Format).then(|| separator.restore(tree.source_text())),
            did_not_stabilize: outcome.did_not_stabilize,
            partial: outcome.partial,
            error: None,
        })
    }

    /// Lints many files in parallel.
    ///
    /// Files that cannot be parsed are reported in [`FileResult::error`].
    #[must_use]
    pub fn lint_all(&self, codes: &[Code]) -> LintResult {
        self.run_all(codes, Mode::Lint)
    }

    /// Formats many files in parallel.
    ///
    /// Files that cannot be parsed are reported in [`FileResult::error`].
    #[must_use]
    pub fn format_all(&self, codes: &[Code]) -> LintResult {
        self.run_all(codes, Mode::Format)
    }

    fn run_all(&self, codes: &[Code], mode: Mode) -> LintResult {
        info!("Starting {} of {} file(s)", mode, codes.len());

        let files: Vec<FileResult> = codes
            .par_iter()
            .map(|code| {
                self.run(code, mode, None).unwrap_or_else(|e| {
                    warn!("{}", e);
                    FileResult {
                        path: code.path.clone(),
                        error: Some(e.to_string()),
                        ..FileResult::default()
                    }
                })
            })
            .collect();

        let result = LintResult { files };
        let (uncorrected, corrected) = result.count();
        info!(
            "{} complete: {} violation(s), {} corrected in {} file(s)",
            mode,
            uncorrected,
            corrected,
            result.files_checked()
        );
        result
    }
}

fn display_name(path: Option<&Path>) -> String {
    path.map_or_else(|| "<text>".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use klint_core::{Flow, NodeId, RuleError, RuleId, RunAfterMode, SessionContext, VisitorModifier};

    struct After(&'static str, &'static str);

    impl Rule for After {
        fn id(&self) -> RuleId {
            RuleId::parse(self.0).unwrap()
        }

        fn visitor_modifiers(&self) -> Vec<VisitorModifier> {
            vec![VisitorModifier::RunAfter {
                rule_id: RuleId::parse(self.1).unwrap(),
                mode: RunAfterMode::Regardless,
            }]
        }

        fn visit(&self, _: NodeId, _: &mut SessionContext<'_>) -> Result<Flow, RuleError> {
            Ok(Flow::Continue)
        }
    }

    #[test]
    fn builder_rejects_cycles() {
        let result = RuleEngine::builder()
            .rule(After("custom:a", "custom:b"))
            .rule(After("custom:b", "custom:a"))
            .build();
        assert!(matches!(result, Err(EngineError::Schedule(ScheduleError::Cycle { .. }))));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let engine = RuleEngine::builder().build().unwrap();
        let error = engine
            .lint(&Code::with_path("fun foo( {\n", "src/Broken.kt"))
            .unwrap_err();
        let message = error.to_string();
        assert!(message.starts_with("src/Broken.kt: Not a valid Kotlin file ("));
    }

    #[test]
    fn lint_returns_no_formatted_text() {
        let engine = RuleEngine::builder().preset(Preset::Minimal).build().unwrap();
        let result = engine.lint(&Code::from_text("val a = 1  \n")).unwrap();
        assert!(result.formatted.is_none());
        assert_eq!(result.violations.len(), 1);
        assert!(!result.violations[0].corrected);
    }

    #[test]
    fn crlf_input_keeps_crlf() {
        let engine = RuleEngine::builder().preset(Preset::Minimal).build().unwrap();
        let result = engine
            .format(&Code::from_text("val a = 1  \r\nval b = 2\r\n"))
            .unwrap();
        assert_eq!(result.formatted.as_deref(), Some("val a = 1\r\nval b = 2\r\n"));
        assert_eq!(result.violations[0].location.column, 10);
    }

    #[test]
    fn overrides_apply_to_every_file() {
        let engine = RuleEngine::builder()
            .override_value("max_line_length", "120")
            .build()
            .unwrap();
        assert_eq!(engine.config_for(Path::new("a/B.kt")).max_line_length(), Some(120));
    }
}
