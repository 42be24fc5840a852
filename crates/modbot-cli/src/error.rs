use colored::Colorize;
use modbot_core::{BotError, ErrorKind};

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let Some(kind) = err.downcast_ref::<BotError>().map(BotError::kind) else {
        std::process::exit(1);
    };

    match kind {
        ErrorKind::Authorization => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Run the command as a member holding one of the privileged roles");
            eprintln!("  listed under [moderation] in your configuration.");
        }
        ErrorKind::Config => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Check modbot.toml or set {} and {}.", "DISCORD_TOKEN".bold(), "DISCORD_GUILD_ID".bold());
        }
        ErrorKind::Ownership => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Only messages posted by the bot can be edited. Create one with:");
            eprintln!("  {} modbot botmsg --as-user <id> --channel <id> add <text>", "$".dimmed());
        }
        ErrorKind::Upstream => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Check your internet connection and the URL, then try again.");
        }
        _ => {}
    }

    std::process::exit(1);
}
