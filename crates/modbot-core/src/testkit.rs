//! In-memory collaborators for tests.
//!
//! Available in unit tests and, through the `test-utils` feature, in
//! integration tests of dependent crates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

use crate::error::{BotError, Result};
use crate::fetch::RemoteFetcher;
use crate::platform::{ChannelInfo, ChannelKind, Member, Message, MessageEdit, Platform, Role};

/// A call observed by [`MockPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    FetchChannel(String),
    FetchMessage { channel_id: String, message_id: String },
    Send { channel_id: String, content: String },
    Edit {
        channel_id: String,
        message_id: String,
        edit: MessageEdit,
    },
    ListGuild(String),
    FetchMember(String),
    AddRole { user_id: String, role_id: String },
    RemoveRole { user_id: String, role_id: String },
}

#[derive(Default)]
struct MockState {
    channels: HashMap<String, ChannelInfo>,
    messages: Vec<Message>,
    roles: Vec<Role>,
    members: Vec<Member>,
    calls: Vec<PlatformCall>,
    next_message_id: u64,
}

/// Platform double holding one guild in memory and recording every call.
pub struct MockPlatform {
    bot_id: String,
    state: Mutex<MockState>,
}

impl MockPlatform {
    pub fn new(bot_id: &str) -> Self {
        Self {
            bot_id: bot_id.to_string(),
            state: Mutex::new(MockState {
                next_message_id: 10_000,
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock platform state poisoned")
    }

    pub fn with_channel(self, channel: ChannelInfo) -> Self {
        self.state().channels.insert(channel.id.clone(), channel);
        self
    }

    pub fn with_text_channel(self, id: &str, name: &str, guild_id: &str) -> Self {
        self.with_channel(ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            guild_id: Some(guild_id.to_string()),
            kind: ChannelKind::Text,
        })
    }

    pub fn with_message(self, channel_id: &str, id: &str, author_id: &str, content: &str) -> Self {
        self.state().messages.push(Message {
            id: id.to_string(),
            channel_id: channel_id.to_string(),
            author_id: author_id.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn with_role(self, id: &str, name: &str) -> Self {
        self.state().roles.push(Role {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_member(self, user_id: &str, username: &str, role_ids: &[&str]) -> Self {
        self.state().members.push(Member {
            user_id: user_id.to_string(),
            username: username.to_string(),
            global_name: None,
            nick: None,
            role_ids: role_ids.iter().map(|id| id.to_string()).collect(),
        });
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state().calls.clone()
    }

    /// `(message_id, edit)` pairs in edit order.
    pub fn edits(&self) -> Vec<(String, MessageEdit)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Edit {
                    message_id, edit, ..
                } => Some((message_id.clone(), edit.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn fetched_message_ids(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::FetchMessage { message_id, .. } => Some(message_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(channel_id, content)` pairs of every sent message.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Send {
                    channel_id,
                    content,
                } => Some((channel_id.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn message(&self, channel_id: &str, message_id: &str) -> Option<Message> {
        self.state()
            .messages
            .iter()
            .find(|m| m.channel_id == channel_id && m.id == message_id)
            .cloned()
    }

    pub fn member(&self, user_id: &str) -> Option<Member> {
        self.state()
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned()
    }

    fn record(&self, call: PlatformCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn bot_user_id(&self) -> Result<String> {
        Ok(self.bot_id.clone())
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.record(PlatformCall::FetchChannel(channel_id.to_string()));
        self.state()
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| BotError::ChannelNotFound(channel_id.to_string()))
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Message> {
        self.record(PlatformCall::FetchMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        self.message(channel_id, message_id)
            .ok_or_else(|| BotError::MessageNotFound(message_id.to_string()))
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message> {
        self.record(PlatformCall::Send {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        });
        let mut state = self.state();
        if !state.channels.contains_key(channel_id) {
            return Err(BotError::ChannelNotFound(channel_id.to_string()));
        }
        state.next_message_id += 1;
        let message = Message {
            id: state.next_message_id.to_string(),
            channel_id: channel_id.to_string(),
            author_id: self.bot_id.clone(),
            content: content.to_string(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        edit: &MessageEdit,
    ) -> Result<()> {
        self.record(PlatformCall::Edit {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            edit: edit.clone(),
        });
        let mut state = self.state();
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.channel_id == channel_id && m.id == message_id)
            .ok_or_else(|| BotError::MessageNotFound(message_id.to_string()))?;
        message.content = edit.content.clone();
        Ok(())
    }

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<ChannelInfo>> {
        self.record(PlatformCall::ListGuild(guild_id.to_string()));
        Ok(self
            .state()
            .channels
            .values()
            .filter(|channel| channel.guild_id.as_deref() == Some(guild_id))
            .cloned()
            .collect())
    }

    async fn list_roles(&self, _guild_id: &str) -> Result<Vec<Role>> {
        Ok(self.state().roles.clone())
    }

    async fn list_members(&self, _guild_id: &str) -> Result<Vec<Member>> {
        Ok(self.state().members.clone())
    }

    async fn fetch_member(&self, _guild_id: &str, user_id: &str) -> Result<Member> {
        self.record(PlatformCall::FetchMember(user_id.to_string()));
        self.member(user_id)
            .ok_or_else(|| BotError::MemberNotFound(user_id.to_string()))
    }

    async fn add_member_role(&self, _guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.record(PlatformCall::AddRole {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
        });
        let mut state = self.state();
        let member = state
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or_else(|| BotError::MemberNotFound(user_id.to_string()))?;
        if !member.has_role(role_id) {
            member.role_ids.push(role_id.to_string());
        }
        Ok(())
    }

    async fn remove_member_role(
        &self,
        _guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.record(PlatformCall::RemoveRole {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
        });
        let mut state = self.state();
        let member = state
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or_else(|| BotError::MemberNotFound(user_id.to_string()))?;
        member.role_ids.retain(|id| id != role_id);
        Ok(())
    }
}

/// Fetcher serving canned documents by URL.
#[derive(Default)]
pub struct MockFetcher {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("mock fetcher state poisoned")
            .clone()
    }
}

#[async_trait]
impl RemoteFetcher for MockFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        self.requests
            .lock()
            .expect("mock fetcher state poisoned")
            .push(url.to_string());
        self.documents
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| BotError::Upstream(format!("{url} returned 404 Not Found")))
    }
}
