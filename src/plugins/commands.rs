//! Slash command table shared between plugins and the gateway

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serenity::all::{CommandInteraction, Context, CreateCommand, CreateCommandOption};
use tokio::sync::RwLock;

use super::registry::Plugin;
use crate::{Error, Result};

/// A slash command definition together with its name
#[derive(Debug, Clone)]
pub struct CommandSpec {
    name: String,
    definition: CreateCommand,
}

impl CommandSpec {
    /// Create a command with a name and description
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let definition = CreateCommand::new(name.clone()).description(description);
        Self { name, definition }
    }

    /// Add an option to the command
    #[must_use]
    pub fn option(mut self, option: CreateCommandOption) -> Self {
        self.definition = self.definition.add_option(option);
        self
    }

    /// Command name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder sent to Discord when syncing
    #[must_use]
    pub fn definition(&self) -> &CreateCommand {
        &self.definition
    }
}

struct RegisteredCommand {
    spec: CommandSpec,
    plugin: Arc<dyn Plugin>,
}

/// Commands registered by loaded plugins, keyed by command name
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Arc<RwLock<BTreeMap<String, RegisteredCommand>>>,
}

impl CommandRegistry {
    /// Create an empty command table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command a plugin declares
    ///
    /// Either all of the plugin's commands are added or none are.
    ///
    /// # Errors
    ///
    /// Returns error if a command name is already taken or declared twice
    pub async fn register_plugin(&self, plugin: &Arc<dyn Plugin>) -> Result<usize> {
        let specs = plugin.commands();
        let mut commands = self.commands.write().await;

        let mut seen = HashSet::new();
        for spec in &specs {
            if let Some(existing) = commands.get(spec.name()) {
                return Err(Error::Plugin(format!(
                    "command /{} already registered by {}",
                    spec.name(),
                    existing.plugin.id()
                )));
            }
            if !seen.insert(spec.name().to_string()) {
                return Err(Error::Plugin(format!(
                    "command /{} declared twice by {}",
                    spec.name(),
                    plugin.id()
                )));
            }
        }

        let count = specs.len();
        for spec in specs {
            tracing::debug!(plugin_id = %plugin.id(), command = %spec.name(), "command registered");
            commands.insert(
                spec.name().to_string(),
                RegisteredCommand {
                    spec,
                    plugin: Arc::clone(plugin),
                },
            );
        }

        Ok(count)
    }

    /// Definitions of all registered commands, sorted by name
    pub async fn definitions(&self) -> Vec<CreateCommand> {
        self.commands
            .read()
            .await
            .values()
            .map(|c| c.spec.definition().clone())
            .collect()
    }

    /// Names of all registered commands, sorted
    pub async fn names(&self) -> Vec<String> {
        self.commands.read().await.keys().cloned().collect()
    }

    /// Plugin that owns a command
    pub async fn owner(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.commands
            .read()
            .await
            .get(name)
            .map(|c| Arc::clone(&c.plugin))
    }

    /// Route a command interaction to the plugin that registered it
    ///
    /// Returns `Ok(false)` when no plugin owns the command.
    ///
    /// # Errors
    ///
    /// Returns the plugin's error if its handler fails
    pub async fn dispatch(&self, ctx: &Context, command: &CommandInteraction) -> Result<bool> {
        // Release the lock before running the handler
        let Some(plugin) = self.owner(&command.data.name).await else {
            return Ok(false);
        };

        plugin.handle_command(ctx, command).await?;
        Ok(true)
    }

    /// Number of registered commands
    pub async fn len(&self) -> usize {
        self.commands.read().await.len()
    }

    /// Whether no commands are registered
    pub async fn is_empty(&self) -> bool {
        self.commands.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::service::ServiceHandle;

    struct WithCommands {
        id: &'static str,
        names: Vec<&'static str>,
    }

    #[async_trait]
    impl Plugin for WithCommands {
        fn id(&self) -> &str {
            self.id
        }

        async fn setup(&self, _handle: &ServiceHandle) -> Result<()> {
            Ok(())
        }

        fn commands(&self) -> Vec<CommandSpec> {
            self.names
                .iter()
                .map(|n| CommandSpec::new(*n, "test command"))
                .collect()
        }
    }

    fn plugin(id: &'static str, names: Vec<&'static str>) -> Arc<dyn Plugin> {
        Arc::new(WithCommands { id, names })
    }

    #[tokio::test]
    async fn registers_and_lists_commands() {
        let registry = CommandRegistry::new();
        let count = registry
            .register_plugin(&plugin("a", vec!["zeta", "alpha"]))
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.names().await, vec!["alpha", "zeta"]);
        assert_eq!(registry.definitions().await.len(), 2);
        assert_eq!(registry.owner("alpha").await.unwrap().id(), "a");
    }

    #[tokio::test]
    async fn name_collision_rejects_whole_plugin() {
        let registry = CommandRegistry::new();
        registry
            .register_plugin(&plugin("a", vec!["shared"]))
            .await
            .unwrap();

        let err = registry
            .register_plugin(&plugin("b", vec!["fresh", "shared"]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("shared"));
        assert_eq!(registry.names().await, vec!["shared"]);
    }

    #[tokio::test]
    async fn duplicate_within_plugin_rejected() {
        let registry = CommandRegistry::new();
        let result = registry
            .register_plugin(&plugin("a", vec!["twice", "twice"]))
            .await;
        assert!(result.is_err());
        assert!(registry.is_empty().await);
    }
}
