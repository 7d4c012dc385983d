//! Ordered startup sequence
//!
//! ```text
//! ConfigLoading → BundleSync? → DatabaseConnect? → GatewayConnect
//!               → PluginLoad → CommandSync → Serving
//! ```
//!
//! Each stage is a method on [`Stages`] and runs only after the previous one
//! has finished. Optional stages are entered only when the configuration asks
//! for them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::bundle::InstallReport;
use crate::config::{BundleConfig, Config, DatabaseConfig};
use crate::db::Database;
use crate::plugins::LoadReport;
use crate::service::ServiceHandle;

/// Startup stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConfigLoading,
    BundleSync,
    DatabaseConnect,
    GatewayConnect,
    PluginLoad,
    CommandSync,
    Serving,
}

impl Stage {
    /// Stage name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigLoading => "config_loading",
            Self::BundleSync => "bundle_sync",
            Self::DatabaseConnect => "database_connect",
            Self::GatewayConnect => "gateway_connect",
            Self::PluginLoad => "plugin_load",
            Self::CommandSync => "command_sync",
            Self::Serving => "serving",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How startup ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No token configured; nothing was started
    MissingToken,
    /// The gateway ran and has stopped
    Stopped,
}

/// The work behind each startup stage
#[async_trait]
pub trait Stages: Send {
    /// Read and validate the configuration
    async fn load_config(&mut self) -> Result<Config>;

    /// Refresh the plugin directory from the remote repository
    async fn sync_bundle(&mut self, config: &Config, bundle: &BundleConfig)
    -> Result<InstallReport>;

    /// Open the database connection
    async fn connect_database(&mut self, database: &DatabaseConfig) -> Result<Database>;

    /// Build the gateway client and the shared service handle
    async fn connect_gateway(
        &mut self,
        config: Arc<Config>,
        database: Option<Database>,
    ) -> Result<ServiceHandle>;

    /// Load every plugin in the plugin directory
    async fn load_plugins(&mut self, handle: &ServiceHandle) -> LoadReport;

    /// Publish registered commands globally
    async fn sync_commands(&mut self, handle: &ServiceHandle) -> Result<usize>;

    /// Run the gateway event loop
    async fn serve(&mut self) -> Result<()>;
}

fn enter(stage: Stage) {
    tracing::info!(stage = %stage, "entering startup stage");
}

/// Run every startup stage in order
///
/// Bundle sync and command sync failures are logged and skipped; failures in
/// the other stages end startup with an error.
///
/// # Errors
///
/// Returns error if configuration, database, gateway or serving fails
pub async fn run<S: Stages + ?Sized>(stages: &mut S) -> Result<Outcome> {
    enter(Stage::ConfigLoading);
    let config = stages.load_config().await?;
    if config.token.is_none() {
        tracing::warn!("no token found in config, not starting");
        return Ok(Outcome::MissingToken);
    }
    let config = Arc::new(config);

    if let Some(bundle) = &config.bundle {
        enter(Stage::BundleSync);
        match stages.sync_bundle(&config, bundle).await {
            Ok(report) => tracing::info!(
                url = %report.archive_url,
                files = report.files_copied,
                "plugin bundle installed"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "plugin bundle sync failed, using plugins already on disk"
            ),
        }
    }

    let database = match &config.database {
        Some(db_config) => {
            enter(Stage::DatabaseConnect);
            Some(stages.connect_database(db_config).await?)
        }
        None => None,
    };

    enter(Stage::GatewayConnect);
    let handle = stages.connect_gateway(Arc::clone(&config), database).await?;

    enter(Stage::PluginLoad);
    let report = stages.load_plugins(&handle).await;
    if !report.failed.is_empty() {
        tracing::warn!(failed = report.failed.len(), "some plugins failed to load");
    }

    enter(Stage::CommandSync);
    if let Err(e) = stages.sync_commands(&handle).await {
        tracing::warn!(error = %e, "command sync failed");
    }

    enter(Stage::Serving);
    stages.serve().await?;

    tracing::info!("gateway stopped");
    Ok(Outcome::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::ConfigLoading.to_string(), "config_loading");
        assert_eq!(Stage::Serving.as_str(), "serving");
    }
}
