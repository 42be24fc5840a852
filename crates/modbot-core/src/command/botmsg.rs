//! `/botmsg`: moderator management of the bot's own messages.
//!
//! - `add <text>` posts a new message in the current channel
//! - `edit <messageid> <text>` replaces the text of a bot message
//! - `fetch <messageid> <url>` replaces a bot message with a rendered
//!   markdown/text document
//! - `load <url>` synchronizes every message listed in a JSON manifest

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{
    Command, CommandContext, CommandSpec, Permission, Reply, SlashHandler, SlashInput,
};
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::fetch::{MANIFEST_EXTENSIONS, TEXT_EXTENSIONS, parse_http_url_with_ext};
use crate::platform::{MessageEdit, ensure_snowflake};
use crate::sync::{BatchSynchronizer, SyncOptions};

pub const NAME: &str = "botmsg";
pub const ACTION_SUCCESSFUL: &str = "Action completed successfully.";

pub const OPTION_TEXT: &str = "text";
pub const OPTION_MESSAGE_ID: &str = "messageid";
pub const OPTION_URL: &str = "url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Add,
    Edit,
    Fetch,
    Load,
}

impl Subcommand {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "add" => Ok(Self::Add),
            "edit" => Ok(Self::Edit),
            "fetch" => Ok(Self::Fetch),
            "load" => Ok(Self::Load),
            other => Err(BotError::UnknownCommand(format!("{NAME} {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Fetch => "fetch",
            Self::Load => "load",
        }
    }
}

/// The `/botmsg` command, restricted to the configured privileged roles.
pub fn command(config: &BotConfig) -> Command {
    Command::Slash(CommandSpec::new(
        NAME,
        Permission::AnyRole(config.moderation.privileged_roles.clone()),
        Arc::new(BotMessage),
    ))
}

pub struct BotMessage;

#[async_trait]
impl SlashHandler for BotMessage {
    async fn execute(&self, ctx: &CommandContext<'_>, input: &SlashInput) -> Result<Reply> {
        let subcommand = Subcommand::parse(input.subcommand.as_deref().unwrap_or_default())?;
        match subcommand {
            Subcommand::Add => add(ctx, input).await?,
            Subcommand::Edit => edit(ctx, input).await?,
            Subcommand::Fetch => fetch(ctx, input).await?,
            Subcommand::Load => load(ctx, input).await?,
        }
        info!("botmsg {} completed", subcommand.as_str());
        Ok(Reply::silent(ACTION_SUCCESSFUL))
    }
}

async fn add(ctx: &CommandContext<'_>, input: &SlashInput) -> Result<()> {
    let channel_id = ctx.channel_id()?;
    let text = input.required_text(OPTION_TEXT)?;
    ctx.ensure_length(text)?;

    ctx.platform.send_message(channel_id, text).await?;
    Ok(())
}

async fn edit(ctx: &CommandContext<'_>, input: &SlashInput) -> Result<()> {
    let channel_id = ctx.channel_id()?;
    let message_id = ensure_snowflake("message id", input.required(OPTION_MESSAGE_ID)?)?;
    let text = input.required_text(OPTION_TEXT)?;
    ctx.ensure_length(text)?;

    let message = ctx.platform.fetch_message(channel_id, message_id).await?;
    ctx.ensure_own_message(&message.author_id).await?;

    ctx.platform
        .edit_message(channel_id, message_id, &MessageEdit::content(text))
        .await
}

async fn fetch(ctx: &CommandContext<'_>, input: &SlashInput) -> Result<()> {
    let channel_id = ctx.channel_id()?;
    let message_id = ensure_snowflake("message id", input.required(OPTION_MESSAGE_ID)?)?;
    let url = parse_http_url_with_ext(input.required(OPTION_URL)?, TEXT_EXTENSIONS)?;

    let message = ctx.platform.fetch_message(channel_id, message_id).await?;
    ctx.ensure_own_message(&message.author_id).await?;

    let document = ctx.fetcher.fetch_text(&url).await?;
    let context = ctx.resolution_context().await?;
    let content = ctx.render(&document, &context)?;

    ctx.platform
        .edit_message(channel_id, message_id, &MessageEdit::content(content))
        .await
}

async fn load(ctx: &CommandContext<'_>, input: &SlashInput) -> Result<()> {
    let url = parse_http_url_with_ext(input.required(OPTION_URL)?, MANIFEST_EXTENSIONS)?;
    let guild_id = ctx.guild_id()?;

    let synchronizer =
        BatchSynchronizer::new(ctx.platform, ctx.fetcher, SyncOptions::from(ctx.config));
    synchronizer.synchronize(&url, guild_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandRegistry, InMemoryVerificationStore, Interaction, Invoker};
    use crate::config::RoleTable;
    use crate::error::ErrorKind;
    use crate::testkit::{MockFetcher, MockPlatform, PlatformCall};

    const BOT: &str = "999";
    const MOD_ROLE: &str = "2";

    fn config() -> BotConfig {
        BotConfig {
            roles: RoleTable::new([("Root", "1"), ("Moderator", MOD_ROLE)]),
            ..BotConfig::default()
        }
    }

    fn platform() -> MockPlatform {
        MockPlatform::new(BOT)
            .with_text_channel("10", "general", "g")
            .with_role("20", "Student")
            .with_member("30", "alice", &[])
            .with_message("10", "100", BOT, "old")
            .with_message("10", "101", "555", "someone else")
    }

    async fn run(
        platform: &MockPlatform,
        fetcher: &MockFetcher,
        interaction: Interaction,
        roles: &[&str],
        guild_id: Option<&str>,
    ) -> Result<Reply> {
        let config = config();
        let ctx = CommandContext {
            platform,
            fetcher,
            config: &config,
            invoker: Invoker::new("7", roles.iter().map(|r| r.to_string()).collect()),
            guild_id: guild_id.map(str::to_string),
            channel_id: Some("10".into()),
        };
        let registry =
            CommandRegistry::with_builtin(&config, Arc::new(InMemoryVerificationStore::new()));
        registry.dispatch(&interaction, &ctx).await
    }

    #[tokio::test]
    async fn test_add_sends_to_current_channel() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        let reply = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "add").with_option(OPTION_TEXT, "Hello there"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap();

        assert_eq!(reply, Reply::silent(ACTION_SUCCESSFUL));
        assert_eq!(platform.sent(), vec![("10".to_string(), "Hello there".to_string())]);
    }

    #[tokio::test]
    async fn test_edit_replaces_own_message() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "edit")
                .with_option(OPTION_MESSAGE_ID, " 100 ")
                .with_option(OPTION_TEXT, "new text"),
            &["1"],
            Some("g"),
        )
        .await
        .unwrap();

        assert_eq!(platform.message("10", "100").unwrap().content, "new text");
    }

    #[tokio::test]
    async fn test_edit_refuses_foreign_message() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "edit")
                .with_option(OPTION_MESSAGE_ID, "101")
                .with_option(OPTION_TEXT, "hijack"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Ownership);
        assert!(platform.edits().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_renders_document() {
        let platform = platform();
        let fetcher = MockFetcher::new()
            .with_document("https://example.com/intro.md", "Hi {mention:alice}, see {channel:general}. {role:Student}");
        run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "fetch")
                .with_option(OPTION_MESSAGE_ID, "100")
                .with_option(OPTION_URL, "https://example.com/intro.md"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap();

        assert_eq!(
            platform.message("10", "100").unwrap().content,
            "Hi <@30>, see <#10>. <@&20>"
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_pdf_before_network() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "fetch")
                .with_option(OPTION_MESSAGE_ID, "100")
                .with_option(OPTION_URL, "https://example.com/rules.pdf"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BotError::InvalidUrl(_)));
        assert!(platform.calls().is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_rejects_overlong_document() {
        let platform = platform();
        let fetcher =
            MockFetcher::new().with_document("https://example.com/long.txt", &"x".repeat(2001));
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "fetch")
                .with_option(OPTION_MESSAGE_ID, "100")
                .with_option(OPTION_URL, "https://example.com/long.txt"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BotError::MessageTooLong { length: 2001, .. }));
        assert_eq!(platform.message("10", "100").unwrap().content, "old");
    }

    #[tokio::test]
    async fn test_fetch_outside_guild_leaves_message_untouched() {
        let platform = platform();
        let fetcher = MockFetcher::new().with_document("https://example.com/a.md", "{role:Student}");
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "fetch")
                .with_option(OPTION_MESSAGE_ID, "100")
                .with_option(OPTION_URL, "https://example.com/a.md"),
            &[MOD_ROLE],
            None,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Templating);
        assert!(platform.edits().is_empty());
    }

    #[tokio::test]
    async fn test_edit_and_fetch_reject_non_numeric_message_id() {
        let platform = platform();
        let fetcher = MockFetcher::new().with_document("https://example.com/a.md", "text");
        for interaction in [
            Interaction::slash(NAME, "edit")
                .with_option(OPTION_MESSAGE_ID, "../../77/messages/5")
                .with_option(OPTION_TEXT, "hijack"),
            Interaction::slash(NAME, "fetch")
                .with_option(OPTION_MESSAGE_ID, "100?x=1")
                .with_option(OPTION_URL, "https://example.com/a.md"),
        ] {
            let err = run(&platform, &fetcher, interaction, &[MOD_ROLE], Some("g"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(platform.calls().is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_load_requires_json_url() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "load").with_option(OPTION_URL, "https://example.com/msgs.yaml"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BotError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_load_synchronizes_manifest() {
        let platform = platform();
        let fetcher = MockFetcher::new().with_document(
            "https://example.com/msgs.json",
            r#"{"channelID": "10", "messages": [{"id": "100", "content": ["{role:Student}", "welcome"]}]}"#,
        );
        let reply = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "load").with_option(OPTION_URL, "https://example.com/msgs.json"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap();

        assert_eq!(reply.content, ACTION_SUCCESSFUL);
        assert_eq!(platform.message("10", "100").unwrap().content, "<@&20>\nwelcome");
    }

    #[tokio::test]
    async fn test_unprivileged_caller_is_rejected_without_side_effects() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        for subcommand in ["add", "edit", "fetch", "load"] {
            let err = run(
                &platform,
                &fetcher,
                Interaction::slash(NAME, subcommand)
                    .with_option(OPTION_TEXT, "x")
                    .with_option(OPTION_MESSAGE_ID, "100")
                    .with_option(OPTION_URL, "https://example.com/a.json"),
                &["20"],
                Some("g"),
            )
            .await
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authorization, "{subcommand}");
        }
        assert!(platform.calls().is_empty());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_subcommand_is_routing_error() {
        let (platform, fetcher) = (platform(), MockFetcher::new());
        let err = run(
            &platform,
            &fetcher,
            Interaction::slash(NAME, "delete"),
            &[MOD_ROLE],
            Some("g"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Routing);
        assert!(!platform
            .calls()
            .iter()
            .any(|call| matches!(call, PlatformCall::Edit { .. })));
    }
}
