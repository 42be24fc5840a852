pub mod botmsg;
pub mod check;
pub mod render;

use anyhow::{Context, Result};
use modbot_core::BotConfig;
use modbot_core::platform::DiscordClient;

pub(crate) fn discord_client(config: &BotConfig) -> Result<DiscordClient> {
    Ok(DiscordClient::new(config.discord_client_config())?)
}

pub(crate) fn guild_id(config: &BotConfig) -> Result<&str> {
    config
        .discord
        .guild_id
        .as_deref()
        .context("No guild configured, pass --guild or set DISCORD_GUILD_ID")
}
