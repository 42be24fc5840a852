//! Error types for the message-management core

use thiserror::Error;

/// Coarse error classification surfaced to the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Validation,
    Templating,
    Ownership,
    NotFound,
    Upstream,
    Routing,
    Config,
}

/// Step of a batch run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    FetchMessage,
    VerifyOwnership,
    BuildComponents,
    Render,
    Edit,
}

impl std::fmt::Display for SyncStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchMessage => "fetch message",
            Self::VerifyOwnership => "verify ownership",
            Self::BuildComponents => "build components",
            Self::Render => "render content",
            Self::Edit => "edit message",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("You do not have permission to use this command")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Message is {length} characters long, the limit is {limit}")]
    MessageTooLong { length: usize, limit: usize },

    #[error("Unknown button style: {0}")]
    UnknownButtonStyle(String),

    #[error("Templating error: {0}")]
    Templating(String),

    #[error("The bot can only edit its own messages")]
    NotOwnMessage,

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Channel {0} is not a text channel")]
    NotTextChannel(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Message #{index} ({message_id}) failed at step '{step}': {source}")]
    Batch {
        index: usize,
        message_id: String,
        step: SyncStep,
        #[source]
        source: Box<BotError>,
    },
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Authorization,
            Self::Validation(_)
            | Self::InvalidUrl(_)
            | Self::MessageTooLong { .. }
            | Self::UnknownButtonStyle(_) => ErrorKind::Validation,
            Self::Templating(_) => ErrorKind::Templating,
            Self::NotOwnMessage => ErrorKind::Ownership,
            Self::MessageNotFound(_)
            | Self::ChannelNotFound(_)
            | Self::NotTextChannel(_)
            | Self::MemberNotFound(_) => ErrorKind::NotFound,
            Self::Upstream(_) | Self::Http(_) | Self::Json(_) => ErrorKind::Upstream,
            Self::UnknownCommand(_) => ErrorKind::Routing,
            Self::Config(_) => ErrorKind::Config,
            Self::Batch { source, .. } => source.kind(),
        }
    }

    pub(crate) fn at_step(self, index: usize, message_id: &str, step: SyncStep) -> Self {
        Self::Batch {
            index,
            message_id: message_id.to_string(),
            step,
            source: Box::new(self),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, BotError>;
