use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing::debug;

use modbot_core::BotConfig;
use modbot_core::command::botmsg::{NAME, OPTION_MESSAGE_ID, OPTION_TEXT, OPTION_URL};
use modbot_core::command::{
    CommandContext, CommandRegistry, InMemoryVerificationStore, Interaction, Invoker,
};
use modbot_core::fetch::HttpFetcher;
use modbot_core::platform::Platform;

use super::{discord_client, guild_id};
use crate::cli::{BotmsgAction, BotmsgArgs};

fn interaction(action: &BotmsgAction) -> Interaction {
    match action {
        BotmsgAction::Add { text } => Interaction::slash(NAME, "add").with_option(OPTION_TEXT, text),
        BotmsgAction::Edit { message_id, text } => Interaction::slash(NAME, "edit")
            .with_option(OPTION_MESSAGE_ID, message_id)
            .with_option(OPTION_TEXT, text),
        BotmsgAction::Fetch { message_id, url } => Interaction::slash(NAME, "fetch")
            .with_option(OPTION_MESSAGE_ID, message_id)
            .with_option(OPTION_URL, url),
        BotmsgAction::Load { url } => Interaction::slash(NAME, "load").with_option(OPTION_URL, url),
    }
}

pub async fn run(config: &BotConfig, args: BotmsgArgs) -> Result<()> {
    let platform = discord_client(config)?;
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    let guild_id = guild_id(config)?;

    let member = platform.fetch_member(guild_id, &args.as_user).await?;
    debug!("Running as {} with {} role(s)", member.username, member.role_ids.len());

    let ctx = CommandContext {
        platform: &platform,
        fetcher: &fetcher,
        config,
        invoker: Invoker::new(member.user_id, member.role_ids),
        guild_id: Some(guild_id.to_string()),
        channel_id: args.channel,
    };
    // verification codes are never submitted from the CLI
    let registry =
        CommandRegistry::with_builtin(config, Arc::new(InMemoryVerificationStore::new()));

    let reply = registry.dispatch(&interaction(&args.action), &ctx).await?;
    println!("{} {}", "✓".green().bold(), reply.content);
    Ok(())
}
