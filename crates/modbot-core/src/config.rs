//! Bot configuration
//!
//! Loaded from `$MODBOT_CONFIG` or `./modbot.toml`; when neither exists the
//! configuration comes from environment variables. `DISCORD_TOKEN` always
//! overrides the token stored in the file.
//!
//! ```toml
//! [discord]
//! token = "..."
//! guild_id = "123"
//!
//! [roles]
//! Root = "111"
//! Moderator = "222"
//!
//! [moderation]
//! privileged_roles = ["Root", "Moderator"]
//!
//! [limits]
//! max_message_length = 2000
//! dropdown_option_cap = 24
//!
//! [templating]
//! unresolved = "keep"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::components::ComponentLimits;
use crate::error::{BotError, Result};
use crate::platform::DiscordConfig;
use crate::platform::discord::DISCORD_API_BASE;
use crate::template::UnresolvedTags;

pub const CONFIG_PATH_ENV: &str = "MODBOT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "modbot.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub discord: DiscordSection,
    #[serde(default)]
    pub roles: RoleTable,
    #[serde(default)]
    pub moderation: ModerationSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub templating: TemplatingSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordSection {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            token: String::new(),
            guild_id: None,
            api_base: default_api_base(),
        }
    }
}

/// Role name → role id table of the guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTable(HashMap<String, String>);

impl RoleTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(name, id)| (name.into(), id.into()))
                .collect(),
        )
    }

    pub fn id(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Like [`id`](Self::id), but a missing role is a configuration error.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.id(name)
            .ok_or_else(|| BotError::Config(format!("role '{name}' is not configured")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationSection {
    /// Role names allowed to run moderator commands.
    #[serde(default = "default_privileged_roles")]
    pub privileged_roles: Vec<String>,
}

impl Default for ModerationSection {
    fn default() -> Self {
        Self {
            privileged_roles: default_privileged_roles(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(flatten)]
    pub components: ComponentLimits,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            components: ComponentLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatingSection {
    #[serde(default)]
    pub unresolved: UnresolvedTags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    DISCORD_API_BASE.to_string()
}

fn default_privileged_roles() -> Vec<String> {
    vec!["Root".to_string(), "Moderator".to_string()]
}

fn default_max_message_length() -> usize {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::from_env(),
        };
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            config.discord.token = token;
        }
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| BotError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            config.discord.token = token;
        }
        config.discord.guild_id = env::var("DISCORD_GUILD_ID").ok();
        if let Ok(api_base) = env::var("DISCORD_API_BASE") {
            config.discord.api_base = api_base;
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn discord_client_config(&self) -> DiscordConfig {
        DiscordConfig {
            bot_token: self.discord.token.clone(),
            api_base: self.discord.api_base.clone(),
            request_timeout: self.request_timeout(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    local.exists().then(|| local.to_path_buf())
}
