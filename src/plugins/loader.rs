//! Plugin loader and lifecycle manager

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::discovery::{DiscoveredPlugin, discover_plugins};
use super::manifest::read_settings;
use super::registry::{Plugin, PluginRegistry};
use crate::Result;
use crate::service::ServiceHandle;

/// A plugin that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    /// Plugin identifier
    pub id: String,
    /// Human-readable reason
    pub reason: String,
}

/// Result of one pass over the plugin directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Plugins loaded in this pass, in load order
    pub loaded: Vec<String>,
    /// Plugins that failed in this pass
    pub failed: Vec<LoadFailure>,
    /// Plugins skipped because they were already resident
    pub skipped: Vec<String>,
}

/// Loads plugins named in the plugin directory and keeps them resident
pub struct PluginManager {
    registry: PluginRegistry,
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new(PluginRegistry::builtin())
    }
}

impl PluginManager {
    /// Create a manager over a plugin registry
    #[must_use]
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry,
            plugins: BTreeMap::new(),
        }
    }

    /// Load every plugin described in `dir`
    ///
    /// Each plugin is built from the registry, set up against `handle` and
    /// has its commands registered. A failing plugin is logged and recorded
    /// in the report; the remaining plugins still load. Plugins already
    /// resident are not loaded again.
    pub async fn load_all(&mut self, dir: &Path, handle: &ServiceHandle) -> LoadReport {
        let mut report = LoadReport::default();

        let discovered = match discover_plugins(dir) {
            Ok(discovered) => discovered,
            Err(e) => {
                tracing::error!(path = %dir.display(), error = %e, "failed to read plugin directory");
                return report;
            }
        };

        for entry in discovered {
            if self.plugins.contains_key(&entry.id) {
                tracing::debug!(plugin_id = %entry.id, "plugin already loaded, skipping");
                report.skipped.push(entry.id);
                continue;
            }

            match self.load_one(&entry, handle).await {
                Ok(plugin) => {
                    tracing::info!(plugin_id = %entry.id, "loaded plugin");
                    self.plugins.insert(entry.id.clone(), plugin);
                    report.loaded.push(entry.id);
                }
                Err(e) => {
                    tracing::warn!(
                        plugin_id = %entry.id,
                        path = %entry.path.display(),
                        error = %e,
                        "failed to load plugin"
                    );
                    report.failed.push(LoadFailure {
                        id: entry.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "plugin load finished"
        );
        report
    }

    async fn load_one(
        &self,
        entry: &DiscoveredPlugin,
        handle: &ServiceHandle,
    ) -> Result<Arc<dyn Plugin>> {
        let settings = read_settings(&entry.path)?;
        let plugin = self.registry.create(&entry.id, &settings)?;
        plugin.setup(handle).await?;
        handle.commands().register_plugin(&plugin).await?;
        Ok(plugin)
    }

    /// Get a loaded plugin by ID
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(id)
    }

    /// IDs of all loaded plugins, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Registry this manager builds plugins from
    #[must_use]
    pub const fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Number of loaded plugins
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
