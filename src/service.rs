//! Shared service handle passed to every plugin

use std::sync::Arc;

use serenity::http::Http;

use crate::config::Config;
use crate::db::Database;
use crate::plugins::CommandRegistry;
use crate::{Error, Result};

/// Runtime context shared by the bootstrap and all plugins
///
/// Built once per process after the gateway client exists. Cloning is cheap;
/// every clone refers to the same configuration, REST client, database pool
/// and command table.
#[derive(Clone)]
pub struct ServiceHandle {
    config: Arc<Config>,
    http: Arc<Http>,
    database: Option<Database>,
    commands: CommandRegistry,
}

impl ServiceHandle {
    /// Create a new service handle
    #[must_use]
    pub const fn new(
        config: Arc<Config>,
        http: Arc<Http>,
        database: Option<Database>,
        commands: CommandRegistry,
    ) -> Self {
        Self {
            config,
            http,
            database,
            commands,
        }
    }

    /// Process configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discord REST client
    #[must_use]
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    /// Database handle, if one is configured
    #[must_use]
    pub const fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Database handle, failing when none is configured
    ///
    /// # Errors
    ///
    /// Returns error if the configuration has no `database` section
    pub fn require_database(&self) -> Result<&Database> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::Config("no database configured".to_string()))
    }

    /// Slash commands registered by plugins
    #[must_use]
    pub const fn commands(&self) -> &CommandRegistry {
        &self.commands
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("config", &self.config)
            .field("database", &self.database.is_some())
            .finish_non_exhaustive()
    }
}
