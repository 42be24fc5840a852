use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modbot")]
#[command(version, about = "Modbot - manage the bot's messages in a Discord guild")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to $MODBOT_CONFIG or ./modbot.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Guild to operate on, overrides the configured guild
    #[arg(long, global = true, env = "DISCORD_GUILD_ID")]
    pub guild: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a /botmsg subcommand on behalf of a guild member
    Botmsg(BotmsgArgs),

    /// Render a template file against the guild and print the result
    Render {
        /// Template file containing {role:..}, {channel:..} and {mention:..} tags
        path: PathBuf,
    },

    /// Fetch and validate a message manifest without touching Discord
    Check {
        /// URL of the .json manifest
        url: String,
    },
}

#[derive(Args)]
pub struct BotmsgArgs {
    /// User the command runs as; their roles decide whether it is allowed
    #[arg(long, env = "MODBOT_AS_USER")]
    pub as_user: String,

    /// Channel the command is issued in
    #[arg(long)]
    pub channel: Option<String>,

    #[command(subcommand)]
    pub action: BotmsgAction,
}

#[derive(Subcommand)]
pub enum BotmsgAction {
    /// Post a new message
    Add { text: String },

    /// Replace the text of a bot message
    Edit { message_id: String, text: String },

    /// Replace a bot message with a rendered .md/.markdown/.txt document
    Fetch { message_id: String, url: String },

    /// Synchronize every message described by a .json manifest
    Load { url: String },
}
