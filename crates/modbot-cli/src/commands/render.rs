use anyhow::{Context, Result};
use std::path::Path;

use modbot_core::BotConfig;
use modbot_core::platform::Platform;
use modbot_core::template::{ensure_length, render};

use super::{discord_client, guild_id};

pub async fn run(config: &BotConfig, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let platform = discord_client(config)?;
    let context = platform.resolution_context(guild_id(config)?).await?;
    let rendered = render(&text, &context, config.templating.unresolved)?;
    ensure_length(&rendered, config.limits.max_message_length)?;

    println!("{rendered}");
    Ok(())
}
