//! Daemon that runs the bot against the real services

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::Client;

use crate::bootstrap::{self, Outcome, Stages};
use crate::bundle::{self, InstallReport};
use crate::config::{BundleConfig, Config, DatabaseConfig};
use crate::db::Database;
use crate::gateway;
use crate::plugins::{CommandRegistry, LoadReport, PluginManager, PluginRegistry};
use crate::service::ServiceHandle;
use crate::{Error, Result};

/// Timeout for the bundle download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Main cogbot daemon
pub struct Daemon {
    config_path: PathBuf,
    http_client: reqwest::Client,
    plugins: PluginManager,
    commands: CommandRegistry,
    client: Option<Client>,
}

impl Daemon {
    /// Create a daemon reading its configuration from `config_path`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config_path: impl Into<PathBuf>, registry: PluginRegistry) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("cogbot/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            config_path: config_path.into(),
            http_client,
            plugins: PluginManager::new(registry),
            commands: CommandRegistry::new(),
            client: None,
        })
    }

    /// Run startup and serve until the gateway stops
    ///
    /// # Errors
    ///
    /// Returns error if a fatal startup stage fails or the gateway errors
    pub async fn run(mut self) -> Result<Outcome> {
        bootstrap::run(&mut self).await
    }
}

#[async_trait]
impl Stages for Daemon {
    async fn load_config(&mut self) -> Result<Config> {
        Config::load(&self.config_path)
    }

    async fn sync_bundle(
        &mut self,
        config: &Config,
        bundle: &BundleConfig,
    ) -> Result<InstallReport> {
        bundle::install(
            &self.http_client,
            &bundle.repo_url,
            &bundle.repo_temp,
            &config.staging_dir,
            &config.plugin_dir,
        )
        .await
    }

    async fn connect_database(&mut self, database: &DatabaseConfig) -> Result<Database> {
        Database::connect(database).await
    }

    async fn connect_gateway(
        &mut self,
        config: Arc<Config>,
        database: Option<Database>,
    ) -> Result<ServiceHandle> {
        let client = gateway::build_client(&config, self.commands.clone()).await?;
        let handle = ServiceHandle::new(
            config,
            Arc::clone(&client.http),
            database,
            self.commands.clone(),
        );
        self.client = Some(client);
        Ok(handle)
    }

    async fn load_plugins(&mut self, handle: &ServiceHandle) -> LoadReport {
        let dir = handle.config().plugin_dir.clone();
        self.plugins.load_all(&dir, handle).await
    }

    async fn sync_commands(&mut self, handle: &ServiceHandle) -> Result<usize> {
        gateway::sync_global_commands(handle.http(), handle.commands()).await
    }

    async fn serve(&mut self) -> Result<()> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| {
                Error::Gateway("serve called before the gateway connected".to_string())
            })?;
        gateway::serve(client).await
    }
}
