mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use modbot_core::BotConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,modbot_core=debug,modbot=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => BotConfig::load_from_path(path)?,
        None => BotConfig::load()?,
    };
    if let Some(guild) = cli.guild {
        config.discord.guild_id = Some(guild);
    }

    match cli.command {
        Commands::Botmsg(args) => commands::botmsg::run(&config, args).await,
        Commands::Render { path } => commands::render::run(&config, &path).await,
        Commands::Check { url } => commands::check::run(&config, &url).await,
    }
}
