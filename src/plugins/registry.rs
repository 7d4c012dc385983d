//! Plugin trait and the compile-time plugin registry
//!
//! Plugins are linked into the binary and looked up by identifier. The plugin
//! directory only decides which of them run and with what settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{CommandInteraction, Context};

use super::commands::CommandSpec;
use crate::service::ServiceHandle;
use crate::{Error, Result};

/// A unit of command/event handling registered against the service handle
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin identifier, matching its descriptor file stem
    fn id(&self) -> &str;

    /// Called once when the plugin is loaded
    ///
    /// # Errors
    ///
    /// Returns error if the plugin cannot run with the given services
    async fn setup(&self, handle: &ServiceHandle) -> Result<()>;

    /// Slash commands this plugin answers
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }

    /// Handle one of the plugin's slash commands
    ///
    /// # Errors
    ///
    /// Returns error if the command fails; the gateway reports it to the user
    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        let _ = ctx;
        Err(Error::Plugin(format!(
            "plugin {} has no handler for /{}",
            self.id(),
            command.data.name
        )))
    }
}

/// Builds a plugin from its descriptor settings
pub type PluginFactory = fn(&serde_json::Value) -> Result<Arc<dyn Plugin>>;

/// Mapping from plugin identifier to factory
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every plugin shipped in this crate
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(super::template::ID, super::template::factory);
        registry.register(super::live::ID, super::live::factory);
        registry
    }

    /// Register a factory, replacing any previous one with the same id
    pub fn register(&mut self, id: impl Into<String>, factory: PluginFactory) {
        let id = id.into();
        if self.factories.insert(id.clone(), factory).is_some() {
            tracing::warn!(plugin_id = %id, "plugin factory replaced");
        }
    }

    /// Whether a factory exists for `id`
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers in sorted order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the plugin registered under `id`
    ///
    /// # Errors
    ///
    /// Returns error if no factory is registered for `id`, the factory
    /// rejects the settings, or the built plugin reports a different id
    pub fn create(&self, id: &str, settings: &serde_json::Value) -> Result<Arc<dyn Plugin>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| Error::Plugin(format!("no plugin registered as '{id}'")))?;

        let plugin = factory(settings)?;
        if plugin.id() != id {
            return Err(Error::Plugin(format!(
                "factory for '{id}' built plugin '{}'",
                plugin.id()
            )));
        }
        Ok(plugin)
    }

    /// Number of registered factories
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factories are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
