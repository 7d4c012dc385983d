//! Discord gateway wiring using serenity
//!
//! Builds the client, syncs slash commands and routes interactions to the
//! plugins that registered them. Sharding, reconnects and rate limits are
//! left to serenity.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serenity::Client;
use serenity::all::{
    ActivityData, ApplicationId, Command, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, EventHandler, GatewayIntents,
    Guild, GuildId, Interaction, OnlineStatus, Ready, ShardManager,
};
use serenity::http::Http;
use serenity::prelude::TypeMapKey;

use crate::config::Config;
use crate::plugins::CommandRegistry;
use crate::{Error, Result};

/// Reply shown when a command handler fails
const COMMAND_FAILED_REPLY: &str = "Something went wrong while running that command.";

/// Shard manager stored in the client's type map for latency reporting
struct ShardManagerKey;

impl TypeMapKey for ShardManagerKey {
    type Value = Arc<ShardManager>;
}

/// Gateway intents the bot subscribes to
#[must_use]
pub fn intents() -> GatewayIntents {
    GatewayIntents::non_privileged()
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Build the gateway client with the bot's event handler attached
///
/// # Errors
///
/// Returns error if no token is configured or serenity rejects the setup
pub async fn build_client(config: &Config, commands: CommandRegistry) -> Result<Client> {
    let token = config
        .token
        .as_ref()
        .ok_or_else(|| Error::Config("no token configured".to_string()))?;

    let handler = Handler {
        commands,
        status: config.status().to_string(),
    };

    let mut builder = Client::builder(token.expose_secret(), intents()).event_handler(handler);
    if let Some(id) = config.application_id {
        builder = builder.application_id(ApplicationId::new(id));
    }

    let client = builder.await?;
    client
        .data
        .write()
        .await
        .insert::<ShardManagerKey>(Arc::clone(&client.shard_manager));

    tracing::info!(application_id = ?config.application_id, "gateway client built");
    Ok(client)
}

/// Publish all registered commands globally
///
/// # Errors
///
/// Returns error if Discord rejects the command set
pub async fn sync_global_commands(http: &Http, commands: &CommandRegistry) -> Result<usize> {
    let definitions = commands.definitions().await;
    let synced = Command::set_global_commands(http, definitions).await?;
    tracing::info!(count = synced.len(), "global commands synced");
    Ok(synced.len())
}

/// Publish all registered commands to one guild
///
/// # Errors
///
/// Returns error if Discord rejects the command set
pub async fn sync_guild_commands(
    http: &Http,
    guild_id: GuildId,
    commands: &CommandRegistry,
) -> Result<usize> {
    let definitions = commands.definitions().await;
    let synced = guild_id.set_commands(http, definitions).await?;
    tracing::info!(guild_id = %guild_id, count = synced.len(), "guild commands synced");
    Ok(synced.len())
}

/// Run the gateway with automatic sharding until it fails or Ctrl-C arrives
///
/// # Errors
///
/// Returns error if the gateway stops with an error
pub async fn serve(client: &mut Client) -> Result<()> {
    let shard_manager = Arc::clone(&client.shard_manager);

    tokio::select! {
        result = client.start_autosharded() => {
            result?;
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}

/// Discord event handler
struct Handler {
    commands: CommandRegistry,
    status: String,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        ctx.set_presence(
            Some(ActivityData::playing(self.status.clone())),
            OnlineStatus::Online,
        );

        let (shard_id, shard_count) = ready
            .shard
            .map_or((0, 1), |shard| (shard.id.0, shard.total));
        tracing::info!(
            user = %ready.user.name,
            user_id = %ready.user.id,
            shard_id,
            shard_count,
            "Discord bot ready"
        );

        let data = ctx.data.read().await;
        if let Some(manager) = data.get::<ShardManagerKey>() {
            let runners = manager.runners.lock().await;
            for (id, runner) in runners.iter() {
                let latency_ms = runner.latency.map(|l| l.as_secs_f64() * 1000.0);
                tracing::info!(shard_id = id.0, latency_ms = ?latency_ms, "shard latency");
            }
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }

        tracing::info!(guild_id = %guild.id, name = %guild.name, "joined guild");
        if let Err(e) = sync_guild_commands(&ctx.http, guild.id, &self.commands).await {
            tracing::warn!(guild_id = %guild.id, error = %e, "guild command sync failed");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        match self.commands.dispatch(&ctx, &command).await {
            Ok(true) => {
                tracing::debug!(command = %command.data.name, user = %command.user.name, "command handled");
            }
            Ok(false) => {
                tracing::warn!(command = %command.data.name, "no plugin owns command");
            }
            Err(e) => {
                tracing::error!(command = %command.data.name, error = %e, "command failed");
                let reply = CreateInteractionResponseMessage::new()
                    .content(COMMAND_FAILED_REPLY)
                    .ephemeral(true);
                let responded = command
                    .create_response(&ctx.http, CreateInteractionResponse::Message(reply))
                    .await;
                // A handler that deferred has already acknowledged the interaction
                if responded.is_err() {
                    let edit = EditInteractionResponse::new().content(COMMAND_FAILED_REPLY);
                    if let Err(e) = command.edit_response(&ctx.http, edit).await {
                        tracing::debug!(error = %e, "failed to report command error");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_include_members_and_content() {
        let intents = intents();
        assert!(intents.contains(GatewayIntents::GUILDS));
        assert!(intents.contains(GatewayIntents::GUILD_MEMBERS));
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
    }

    #[tokio::test]
    async fn build_client_requires_token() {
        let err = build_client(&Config::default(), CommandRegistry::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
