//! Command dispatch
//!
//! Every interaction the bot handles is one of three closed variants: a
//! slash command, a button press or a modal submission. Each registered
//! [`Command`] carries a name, a [`Permission`] predicate and a handler.
//! [`CommandRegistry::dispatch`] matches the incoming interaction kind and
//! name, checks the permission before the handler sees any input, and
//! returns a single reply.

pub mod botmsg;
pub mod department;
pub mod verification;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::fetch::RemoteFetcher;
use crate::platform::Platform;
use crate::template::{ResolutionContext, ensure_length, render};

pub use verification::{InMemoryVerificationStore, VerificationRecord, VerificationStore};

/// The user who triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub user_id: String,
    pub role_ids: Vec<String>,
}

impl Invoker {
    pub fn new(user_id: impl Into<String>, role_ids: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_ids,
        }
    }
}

/// Options of a slash command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashInput {
    pub subcommand: Option<String>,
    pub options: HashMap<String, String>,
}

impl SlashInput {
    /// A non-blank option value, trimmed.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Like [`option`](Self::option), but the untrimmed text is kept.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn required(&self, name: &str) -> Result<&str> {
        self.option(name)
            .ok_or_else(|| BotError::Validation(format!("missing option '{name}'")))
    }

    pub fn required_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| BotError::Validation(format!("missing option '{name}'")))
    }
}

pub type ModalFields = HashMap<String, String>;

/// An incoming interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Slash { name: String, input: SlashInput },
    Button { custom_id: String },
    Modal { custom_id: String, fields: ModalFields },
}

impl Interaction {
    pub fn slash(name: &str, subcommand: &str) -> Self {
        Self::Slash {
            name: name.to_string(),
            input: SlashInput {
                subcommand: Some(subcommand.to_string()),
                options: HashMap::new(),
            },
        }
    }

    /// Add a slash command option; no-op for other interaction kinds.
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        if let Self::Slash { input, .. } = &mut self {
            input.options.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn button(custom_id: &str) -> Self {
        Self::Button {
            custom_id: custom_id.to_string(),
        }
    }

    pub fn modal(custom_id: &str, fields: ModalFields) -> Self {
        Self::Modal {
            custom_id: custom_id.to_string(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Slash { name, .. } => name,
            Self::Button { custom_id } | Self::Modal { custom_id, .. } => custom_id,
        }
    }
}

/// Everything a handler may use while executing.
pub struct CommandContext<'a> {
    pub platform: &'a dyn Platform,
    pub fetcher: &'a dyn RemoteFetcher,
    pub config: &'a BotConfig,
    pub invoker: Invoker,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
}

impl CommandContext<'_> {
    /// Whether the invoker holds the role configured under `role_name`.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.config
            .roles
            .id(role_name)
            .is_some_and(|role_id| self.invoker.role_ids.iter().any(|id| id == role_id))
    }

    pub fn guild_id(&self) -> Result<&str> {
        self.guild_id
            .as_deref()
            .ok_or_else(|| BotError::Validation("this command must be used inside a guild".into()))
    }

    pub fn channel_id(&self) -> Result<&str> {
        self.channel_id
            .as_deref()
            .ok_or_else(|| BotError::Validation("this command must be used inside a channel".into()))
    }

    /// Lookup tables of the current guild; empty outside a guild.
    pub async fn resolution_context(&self) -> Result<ResolutionContext> {
        match &self.guild_id {
            Some(guild_id) => self.platform.resolution_context(guild_id).await,
            None => Ok(ResolutionContext::detached()),
        }
    }

    /// Render `text` and check it fits in a message.
    pub fn render(&self, text: &str, context: &ResolutionContext) -> Result<String> {
        let rendered = render(text, context, self.config.templating.unresolved)?;
        self.ensure_length(&rendered)?;
        Ok(rendered)
    }

    pub fn ensure_length(&self, text: &str) -> Result<()> {
        ensure_length(text, self.config.limits.max_message_length)
    }

    /// Fail with an ownership error unless the bot wrote `author_id`'s message.
    pub async fn ensure_own_message(&self, author_id: &str) -> Result<()> {
        if author_id != self.platform.bot_user_id().await? {
            return Err(BotError::NotOwnMessage);
        }
        Ok(())
    }
}

/// Reply shown to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Visible only to the invoker.
    pub ephemeral: bool,
}

impl Reply {
    pub fn silent(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Anyone,
    /// The invoker must hold at least one of the named roles.
    AnyRole(Vec<String>),
}

impl Permission {
    pub fn allows(&self, ctx: &CommandContext<'_>) -> bool {
        match self {
            Self::Anyone => true,
            Self::AnyRole(names) => names.iter().any(|name| ctx.has_role(name)),
        }
    }
}

#[async_trait]
pub trait SlashHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext<'_>, input: &SlashInput) -> Result<Reply>;
}

#[async_trait]
pub trait ButtonHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply>;
}

#[async_trait]
pub trait ModalHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext<'_>, fields: &ModalFields) -> Result<Reply>;
}

pub struct CommandSpec<H: ?Sized> {
    pub name: String,
    pub permission: Permission,
    pub handler: Arc<H>,
}

impl<H: ?Sized> CommandSpec<H> {
    pub fn new(name: &str, permission: Permission, handler: Arc<H>) -> Self {
        Self {
            name: name.to_string(),
            permission,
            handler,
        }
    }
}

pub enum Command {
    Slash(CommandSpec<dyn SlashHandler>),
    Button(CommandSpec<dyn ButtonHandler>),
    Modal(CommandSpec<dyn ModalHandler>),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Self::Slash(spec) => &spec.name,
            Self::Button(spec) => &spec.name,
            Self::Modal(spec) => &spec.name,
        }
    }

    fn permission(&self) -> &Permission {
        match self {
            Self::Slash(spec) => &spec.permission,
            Self::Button(spec) => &spec.permission,
            Self::Modal(spec) => &spec.permission,
        }
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command.
    pub fn with_builtin(config: &BotConfig, store: Arc<dyn VerificationStore>) -> Self {
        let mut registry = Self::new();
        registry.register(botmsg::command(config));
        registry.register(department::command());
        registry.register(verification::command(store));
        registry
    }

    /// Register a command, replacing one of the same kind and name.
    pub fn register(&mut self, command: Command) {
        let kind = std::mem::discriminant(&command);
        self.commands.retain(|existing| {
            std::mem::discriminant(existing) != kind || existing.name() != command.name()
        });
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn find(&self, interaction: &Interaction) -> Option<&Command> {
        self.commands.iter().find(|command| {
            let same_kind = matches!(
                (command, interaction),
                (Command::Slash(_), Interaction::Slash { .. })
                    | (Command::Button(_), Interaction::Button { .. })
                    | (Command::Modal(_), Interaction::Modal { .. })
            );
            same_kind && command.name() == interaction.name()
        })
    }

    pub async fn dispatch(
        &self,
        interaction: &Interaction,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply> {
        let command = self
            .find(interaction)
            .ok_or_else(|| BotError::UnknownCommand(interaction.name().to_string()))?;

        if !command.permission().allows(ctx) {
            warn!(
                "User {} is not allowed to run '{}'",
                ctx.invoker.user_id,
                command.name()
            );
            return Err(BotError::Unauthorized);
        }

        info!(
            "Dispatching '{}' for user {}",
            command.name(),
            ctx.invoker.user_id
        );
        match (command, interaction) {
            (Command::Slash(spec), Interaction::Slash { input, .. }) => {
                spec.handler.execute(ctx, input).await
            }
            (Command::Button(spec), Interaction::Button { .. }) => spec.handler.execute(ctx).await,
            (Command::Modal(spec), Interaction::Modal { fields, .. }) => {
                spec.handler.execute(ctx, fields).await
            }
            _ => Err(BotError::UnknownCommand(interaction.name().to_string())),
        }
    }
}
