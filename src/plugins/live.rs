//! `/live` command plugin backed by [`LiveChecker`]

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommandOption, EditInteractionResponse,
};

use super::commands::CommandSpec;
use super::registry::Plugin;
use crate::live::{LiveChecker, TikTokStatusApi};
use crate::service::ServiceHandle;
use crate::{Error, Result};

/// Plugin identifier and descriptor file stem
pub const ID: &str = "live";

const COMMAND: &str = "live";
const USERNAME_OPTION: &str = "username";

/// Upper bound on one room info lookup; the reply is deferred meanwhile
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Descriptor settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LiveSettings {
    /// Overrides the configured room info endpoint
    api_url: Option<String>,
}

/// Answers `/live <username>` with the account's broadcast status
pub struct LivePlugin {
    api_url: Option<String>,
    checker: OnceLock<LiveChecker>,
}

/// Build the live plugin from descriptor settings
///
/// # Errors
///
/// Returns error if the settings contain unknown keys or wrong types
pub fn factory(settings: &serde_json::Value) -> Result<Arc<dyn Plugin>> {
    let settings = LiveSettings::deserialize(settings)?;
    Ok(Arc::new(LivePlugin {
        api_url: settings.api_url,
        checker: OnceLock::new(),
    }))
}

/// Reply text for a status lookup
#[must_use]
pub fn status_message(username: &str, online: bool) -> String {
    let username = username.trim_start_matches('@');
    if online {
        format!("🔴 **{username}** is live right now!")
    } else {
        format!("**{username}** is not live.")
    }
}

impl LivePlugin {
    /// Checker built during setup
    #[must_use]
    pub fn checker(&self) -> Option<&LiveChecker> {
        self.checker.get()
    }
}

#[async_trait]
impl Plugin for LivePlugin {
    fn id(&self) -> &str {
        ID
    }

    async fn setup(&self, handle: &ServiceHandle) -> Result<()> {
        let api_url = self
            .api_url
            .clone()
            .unwrap_or_else(|| handle.config().live.api_url.clone());

        tracing::debug!(plugin_id = ID, api_url = %api_url, "live status endpoint");
        let source = TikTokStatusApi::with_timeout(api_url, LOOKUP_TIMEOUT)?;
        self.checker
            .set(LiveChecker::new(Arc::new(source)))
            .map_err(|_| Error::Plugin(format!("{ID} set up twice")))?;
        Ok(())
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new(COMMAND, "Check whether a TikTok account is live").option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    USERNAME_OPTION,
                    "TikTok username",
                )
                .required(true),
            ),
        ]
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) -> Result<()> {
        let checker = self
            .checker()
            .ok_or_else(|| Error::Plugin(format!("{ID} used before setup")))?;

        let username = command
            .data
            .options
            .iter()
            .find(|o| o.name == USERNAME_OPTION)
            .and_then(|o| o.value.as_str())
            .ok_or_else(|| Error::Plugin(format!("/{COMMAND} requires a username")))?;

        // Discord drops unacknowledged interactions after 3 s
        command.defer(&ctx.http).await?;

        let online = checker.is_account_online(username).await;
        command
            .edit_response(
                &ctx.http,
                EditInteractionResponse::new().content(status_message(username, online)),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serenity::http::Http;

    use super::*;
    use crate::config::Config;
    use crate::plugins::CommandRegistry;

    fn handle() -> ServiceHandle {
        ServiceHandle::new(
            Arc::new(Config::default()),
            Arc::new(Http::new("")),
            None,
            CommandRegistry::new(),
        )
    }

    #[test]
    fn factory_rejects_unknown_settings() {
        assert!(factory(&serde_json::json!({"nope": 1})).is_err());
    }

    #[tokio::test]
    async fn setup_builds_checker_and_declares_command() {
        let plugin = factory(&serde_json::json!({"api_url": "http://127.0.0.1:9/room"})).unwrap();
        plugin.setup(&handle()).await.unwrap();

        let commands = plugin.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name(), "live");
    }

    #[test]
    fn message_variants() {
        assert_eq!(status_message("@alice", true), "🔴 **alice** is live right now!");
        assert_eq!(status_message("bob", false), "**bob** is not live.");
    }
}
