//! Chat platform seam
//!
//! Everything the core needs from the chat platform goes through the
//! [`Platform`] trait: message fetch/send/edit and guild lookups. The
//! production implementation talks to the Discord REST API
//! ([`discord::DiscordClient`]); tests use the in-memory platform from
//! [`crate::testkit`].

pub mod discord;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::components::ActionRow;
use crate::error::{BotError, Result};
use crate::template::{Directory, DirectoryEntry, ResolutionContext};

pub use discord::{DiscordClient, DiscordConfig};

/// Check that `id` is a Discord snowflake (ASCII digits only).
///
/// Ids end up as REST path segments, so anything else is refused before a
/// request is built.
pub fn ensure_snowflake<'a>(what: &str, id: &'a str) -> Result<&'a str> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BotError::Validation(format!(
            "{what} '{id}' is not a valid Discord id"
        )));
    }
    Ok(id)
}

/// A message as seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Text,
    DirectMessage,
    Voice,
    Category,
    Announcement,
    Thread,
    Stage,
    Forum,
    Other(u8),
}

impl ChannelKind {
    pub fn from_discord(kind: u8) -> Self {
        match kind {
            0 => Self::Text,
            1 | 3 => Self::DirectMessage,
            2 => Self::Voice,
            4 => Self::Category,
            5 => Self::Announcement,
            10..=12 => Self::Thread,
            13 => Self::Stage,
            15 | 16 => Self::Forum,
            other => Self::Other(other),
        }
    }

    /// Whether messages can be posted to and fetched from the channel.
    pub fn is_text_based(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::DirectMessage
                | Self::Voice
                | Self::Announcement
                | Self::Thread
                | Self::Stage
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub guild_id: Option<String>,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub username: String,
    pub global_name: Option<String>,
    pub nick: Option<String>,
    pub role_ids: Vec<String>,
}

impl Member {
    pub fn has_role(&self, role_id: &str) -> bool {
        self.role_ids.iter().any(|id| id == role_id)
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

/// Replacement state of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEdit {
    pub content: String,
    /// `None` leaves the message's components out of the request.
    pub components: Option<Vec<ActionRow>>,
}

impl MessageEdit {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            components: None,
        }
    }

    /// Replace every component row of the message; `None` clears them.
    pub fn with_rows_replaced(mut self, row: Option<ActionRow>) -> Self {
        self.components = Some(row.into_iter().collect());
        self
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Id of the bot's own user.
    async fn bot_user_id(&self) -> Result<String>;

    async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo>;

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Message>;

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        edit: &MessageEdit,
    ) -> Result<()>;

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<ChannelInfo>>;

    async fn list_roles(&self, guild_id: &str) -> Result<Vec<Role>>;

    async fn list_members(&self, guild_id: &str) -> Result<Vec<Member>>;

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member>;

    async fn add_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()>;

    async fn remove_member_role(&self, guild_id: &str, user_id: &str, role_id: &str)
    -> Result<()>;

    /// Snapshot the guild's channel, role and member tables for rendering.
    async fn resolution_context(&self, guild_id: &str) -> Result<ResolutionContext> {
        let channels = self
            .list_channels(guild_id)
            .await?
            .into_iter()
            .map(|channel| DirectoryEntry::new(channel.id, channel.name))
            .collect::<Directory>();
        let roles = self
            .list_roles(guild_id)
            .await?
            .into_iter()
            .map(|role| DirectoryEntry::new(role.id, role.name))
            .collect::<Directory>();
        let members = self
            .list_members(guild_id)
            .await?
            .into_iter()
            .map(|member| {
                let mut entry = DirectoryEntry::new(member.user_id, member.username);
                entry.names.extend(member.global_name);
                entry.names.extend(member.nick);
                entry
            })
            .collect::<Directory>();

        Ok(ResolutionContext::new(channels, roles, members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_based_channel_kinds() {
        assert!(ChannelKind::from_discord(0).is_text_based());
        assert!(ChannelKind::from_discord(5).is_text_based());
        assert!(ChannelKind::from_discord(11).is_text_based());
        assert!(!ChannelKind::from_discord(4).is_text_based());
        assert!(!ChannelKind::from_discord(15).is_text_based());
        assert_eq!(ChannelKind::from_discord(99), ChannelKind::Other(99));
    }

    #[test]
    fn test_message_edit_rows_replaced() {
        assert!(MessageEdit::content("hi").components.is_none());
        let edit = MessageEdit::content("hi").with_rows_replaced(None);
        assert_eq!(edit.components, Some(Vec::new()));
        let edit = MessageEdit::content("hi").with_rows_replaced(Some(ActionRow::default()));
        assert_eq!(edit.components.map(|rows| rows.len()), Some(1));
    }

    #[test]
    fn test_ensure_snowflake() {
        assert_eq!(ensure_snowflake("message id", "1234567890").unwrap(), "1234567890");
        for bad in ["", "12a", "../../77/messages/5", "1 2", "١٢"] {
            let err = ensure_snowflake("message id", bad).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Validation, "{bad:?}");
        }
    }
}
