//! Template plugin
//!
//! Starting point for new plugins. It has no commands of its own; it shows
//! how a plugin keeps the service handle and reaches the shared database.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;

use super::registry::Plugin;
use crate::service::ServiceHandle;
use crate::{Error, Result};

/// Plugin identifier and descriptor file stem
pub const ID: &str = "template";

const RECONNECT_ATTEMPTS: u32 = 3;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Example plugin holding the shared services
#[derive(Debug, Default)]
pub struct TemplatePlugin {
    handle: OnceLock<ServiceHandle>,
}

/// Build the template plugin; it takes no settings
///
/// # Errors
///
/// Never fails
pub fn factory(_settings: &serde_json::Value) -> Result<Arc<dyn Plugin>> {
    Ok(Arc::new(TemplatePlugin::default()))
}

impl TemplatePlugin {
    /// Services captured during setup
    #[must_use]
    pub fn handle(&self) -> Option<&ServiceHandle> {
        self.handle.get()
    }

    /// Ping the database, reconnecting if the connection dropped
    ///
    /// Failures are logged, not returned.
    pub async fn reconnect_database(&self) {
        let Some(database) = self.handle().and_then(ServiceHandle::database) else {
            tracing::error!(plugin_id = ID, "reconnect requested before setup");
            return;
        };

        if let Err(e) = database
            .reconnect(RECONNECT_ATTEMPTS, RECONNECT_DELAY)
            .await
        {
            tracing::error!(plugin_id = ID, error = %e, "error reconnecting to the database");
        }
    }
}

#[async_trait]
impl Plugin for TemplatePlugin {
    fn id(&self) -> &str {
        ID
    }

    async fn setup(&self, handle: &ServiceHandle) -> Result<()> {
        handle.require_database()?;
        self.handle
            .set(handle.clone())
            .map_err(|_| Error::Plugin(format!("{ID} set up twice")))?;

        tracing::info!(plugin_id = ID, "template plugin loaded");
        Ok(())
    }
}
