//! Discord REST implementation of [`Platform`].

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use urlencoding::encode;

use super::{ChannelInfo, ChannelKind, Member, Message, MessageEdit, Platform, Role};
use crate::error::{BotError, Result};
use crate::http_client::build_http_client;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const MEMBER_PAGE_SIZE: usize = 1000;

/// Discord client configuration.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl DiscordConfig {
    pub fn with_token(token: &str) -> Self {
        Self {
            bot_token: token.to_string(),
            api_base: DISCORD_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Discord client speaking the REST API with a bot token.
pub struct DiscordClient {
    config: DiscordConfig,
    client: Client,
    bot_user_id: OnceCell<String>,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(BotError::Config("Discord bot token is empty".into()));
        }
        let client = build_http_client(config.request_timeout)?;
        Ok(Self {
            config,
            client,
            bot_user_id: OnceCell::new(),
        })
    }

    /// Send a request and return the decoded JSON body (`Null` for 204).
    ///
    /// A 404 is reported through `not_found` so each call site can name
    /// the missing entity.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        not_found: impl FnOnce() -> BotError,
    ) -> Result<Value> {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        debug!("Discord {} {}", method, path);

        let mut request = self
            .client
            .request(method, url)
            .header("Authorization", format!("Bot {}", self.config.bot_token));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Discord request {} failed ({}): {}", path, status, body);
            return Err(BotError::Upstream(format!(
                "Discord returned {status} for {path}"
            )));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(resp.json().await?)
    }

    async fn get(
        &self,
        path: &str,
        not_found: impl FnOnce() -> BotError,
    ) -> Result<Value> {
        self.request(Method::GET, path, None, not_found).await
    }
}

fn str_field(value: &Value, field: &str) -> Result<String> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BotError::Upstream(format!("missing '{field}' in Discord response")))
}

fn parse_message(value: &Value) -> Result<Message> {
    Ok(Message {
        id: str_field(value, "id")?,
        channel_id: str_field(value, "channel_id")?,
        author_id: str_field(&value["author"], "id")?,
        content: value["content"].as_str().unwrap_or_default().to_string(),
    })
}

fn parse_channel(value: &Value) -> Result<ChannelInfo> {
    let kind = value["type"]
        .as_u64()
        .and_then(|kind| u8::try_from(kind).ok())
        .ok_or_else(|| BotError::Upstream("missing 'type' in Discord channel".into()))?;
    Ok(ChannelInfo {
        id: str_field(value, "id")?,
        name: value["name"].as_str().unwrap_or_default().to_string(),
        guild_id: value["guild_id"].as_str().map(str::to_string),
        kind: ChannelKind::from_discord(kind),
    })
}

fn parse_member(value: &Value) -> Result<Member> {
    let user = &value["user"];
    Ok(Member {
        user_id: str_field(user, "id")?,
        username: user["username"].as_str().unwrap_or_default().to_string(),
        global_name: user["global_name"].as_str().map(str::to_string),
        nick: value["nick"].as_str().map(str::to_string),
        role_ids: value["roles"]
            .as_array()
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(|role| role.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn parse_list<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| BotError::Upstream("expected a JSON array from Discord".into()))?
        .iter()
        .map(parse)
        .collect()
}

/// Path segments are percent-encoded so an id can never address another resource.
fn message_path(channel_id: &str, message_id: &str) -> String {
    format!("/channels/{}/messages/{}", encode(channel_id), encode(message_id))
}

fn member_role_path(guild_id: &str, user_id: &str, role_id: &str) -> String {
    format!(
        "/guilds/{}/members/{}/roles/{}",
        encode(guild_id),
        encode(user_id),
        encode(role_id)
    )
}

fn edit_body(edit: &MessageEdit) -> Value {
    let mut body = Map::new();
    body.insert("content".into(), json!(edit.content));
    if let Some(rows) = &edit.components {
        body.insert(
            "components".into(),
            Value::Array(rows.iter().map(|row| row.to_json()).collect()),
        );
    }
    Value::Object(body)
}

#[async_trait]
impl Platform for DiscordClient {
    async fn bot_user_id(&self) -> Result<String> {
        let id = self
            .bot_user_id
            .get_or_try_init(|| async {
                let me = self
                    .get("/users/@me", || {
                        BotError::Upstream("bot user not available".into())
                    })
                    .await?;
                str_field(&me, "id")
            })
            .await?;
        Ok(id.clone())
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        let value = self
            .get(&format!("/channels/{}", encode(channel_id)), || {
                BotError::ChannelNotFound(channel_id.to_string())
            })
            .await?;
        parse_channel(&value)
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Message> {
        let value = self
            .get(&message_path(channel_id, message_id), || {
                BotError::MessageNotFound(message_id.to_string())
            })
            .await?;
        parse_message(&value)
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message> {
        let value = self
            .request(
                Method::POST,
                &format!("/channels/{}/messages", encode(channel_id)),
                Some(json!({ "content": content })),
                || BotError::ChannelNotFound(channel_id.to_string()),
            )
            .await?;
        parse_message(&value)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        edit: &MessageEdit,
    ) -> Result<()> {
        self.request(
            Method::PATCH,
            &message_path(channel_id, message_id),
            Some(edit_body(edit)),
            || BotError::MessageNotFound(message_id.to_string()),
        )
        .await?;
        Ok(())
    }

    async fn list_channels(&self, guild_id: &str) -> Result<Vec<ChannelInfo>> {
        let value = self
            .get(&format!("/guilds/{}/channels", encode(guild_id)), || {
                BotError::Upstream(format!("guild {guild_id} not found"))
            })
            .await?;
        parse_list(&value, parse_channel)
    }

    async fn list_roles(&self, guild_id: &str) -> Result<Vec<Role>> {
        let value = self
            .get(&format!("/guilds/{}/roles", encode(guild_id)), || {
                BotError::Upstream(format!("guild {guild_id} not found"))
            })
            .await?;
        parse_list(&value, |role| {
            Ok(Role {
                id: str_field(role, "id")?,
                name: str_field(role, "name")?,
            })
        })
    }

    async fn list_members(&self, guild_id: &str) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut after = String::from("0");
        loop {
            let value = self
                .get(
                    &format!(
                        "/guilds/{}/members?limit={MEMBER_PAGE_SIZE}&after={}",
                        encode(guild_id),
                        encode(&after)
                    ),
                    || BotError::Upstream(format!("guild {guild_id} not found")),
                )
                .await?;
            let page = parse_list(&value, parse_member)?;
            let page_len = page.len();
            if let Some(last) = page.last() {
                after = last.user_id.clone();
            }
            members.extend(page);
            if page_len < MEMBER_PAGE_SIZE {
                break;
            }
        }
        debug!("Fetched {} members of guild {}", members.len(), guild_id);
        Ok(members)
    }

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Member> {
        let value = self
            .get(
                &format!("/guilds/{}/members/{}", encode(guild_id), encode(user_id)),
                || BotError::MemberNotFound(user_id.to_string()),
            )
            .await?;
        parse_member(&value)
    }

    async fn add_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<()> {
        self.request(
            Method::PUT,
            &member_role_path(guild_id, user_id, role_id),
            None,
            || BotError::MemberNotFound(user_id.to_string()),
        )
        .await?;
        Ok(())
    }

    async fn remove_member_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<()> {
        self.request(
            Method::DELETE,
            &member_role_path(guild_id, user_id, role_id),
            None,
            || BotError::MemberNotFound(user_id.to_string()),
        )
        .await?;
        Ok(())
    }
}
