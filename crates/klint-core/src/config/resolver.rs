//! Cascading configuration resolution with a per-directory cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::{debug, warn};

use super::property::PropertyRegistry;
use super::snapshot::{ConfigIssue, ConfigSnapshot};
use super::source::{MemoryPropertySource, PropertySource};

/// Merged raw properties visible from one directory.
#[derive(Debug, Default)]
struct Layer {
    properties: BTreeMap<String, String>,
    issues: Vec<ConfigIssue>,
}

/// Resolves the effective configuration of a file.
///
/// Sections cascade from the file's directory upward until a section marked
/// `root`; closer directories override farther ones. Each directory's merged
/// layer is computed at most once and shared by all callers, including
/// concurrent ones.
pub struct ConfigResolver {
    source: Box<dyn PropertySource>,
    registry: PropertyRegistry,
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
    layers: DashMap<PathBuf, Arc<OnceLock<Arc<Layer>>>>,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("cached_layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(MemoryPropertySource::new())
    }
}

impl ConfigResolver {
    /// Creates a resolver over a property source.
    #[must_use]
    pub fn new(source: impl PropertySource + 'static) -> Self {
        Self {
            source: Box::new(source),
            registry: PropertyRegistry::new(),
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
            layers: DashMap::new(),
        }
    }

    /// Replaces the property registry used for typing values.
    #[must_use]
    pub fn registry(mut self, registry: PropertyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a default that applies below every directory section.
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Adds an override that applies above every directory section.
    #[must_use]
    pub fn override_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    /// Returns the property registry.
    #[must_use]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Resolves the snapshot for a file path.
    ///
    /// Never fails: unreadable sections and malformed values are recorded as
    /// [`ConfigIssue`]s and the affected properties fall back to defaults.
    #[must_use]
    pub fn resolve(&self, file_path: &Path) -> ConfigSnapshot {
        let dir = file_path.parent().unwrap_or_else(|| Path::new(""));
        let layer = self.layer(dir);

        let mut raw = self.defaults.clone();
        raw.extend(layer.properties.clone());
        raw.extend(self.overrides.clone());

        let mut snapshot = ConfigSnapshot::from_raw(&self.registry, raw);
        snapshot.prepend_issues(&layer.issues);
        snapshot
    }

    /// Number of directories with a cached layer.
    #[must_use]
    pub fn cached_layers(&self) -> usize {
        self.layers.len()
    }

    fn layer(&self, dir: &Path) -> Arc<Layer> {
        // The map guard is released before the layer is computed, so the
        // recursive lookup of the parent never waits on a held shard.
        let cell = self.layers.entry(dir.to_path_buf()).or_default().clone();
        cell.get_or_init(|| self.compute_layer(dir)).clone()
    }

    fn compute_layer(&self, dir: &Path) -> Arc<Layer> {
        debug!("Computing config layer for {}", dir.display());
        let (own, issue) = match self.source.load(dir) {
            Ok(section) => (section.unwrap_or_default(), None),
            Err(e) => {
                warn!("Ignoring unreadable config in {}: {}", dir.display(), e);
                let issue = ConfigIssue {
                    property: String::new(),
                    value: dir.display().to_string(),
                    message: e.to_string(),
                };
                (super::RawSection::default(), Some(issue))
            }
        };

        let mut layer = Layer::default();
        if !own.root {
            if let Some(parent) = dir.parent() {
                let inherited = self.layer(parent);
                layer.properties.clone_from(&inherited.properties);
                layer.issues.clone_from(&inherited.issues);
            }
        }
        layer.properties.extend(own.properties);
        layer.issues.extend(issue);
        Arc::new(layer)
    }
}
