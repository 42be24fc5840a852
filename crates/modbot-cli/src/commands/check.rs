use anyhow::Result;
use colored::Colorize;

use modbot_core::BotConfig;
use modbot_core::components::build_row;
use modbot_core::fetch::{HttpFetcher, MANIFEST_EXTENSIONS, fetch_manifest, parse_http_url_with_ext};

pub async fn run(config: &BotConfig, raw_url: &str) -> Result<()> {
    let url = parse_http_url_with_ext(raw_url, MANIFEST_EXTENSIONS)?;
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    let manifest = fetch_manifest(&fetcher, &url).await?;

    println!(
        "{} channel {} with {} message(s)",
        "Manifest".bold(),
        manifest.channel_id,
        manifest.messages.len()
    );
    for (index, message) in manifest.messages.iter().enumerate() {
        let row = build_row(message.components.as_ref(), &config.limits.components)?;
        let components = row.map_or(0, |row| row.components.len());
        println!(
            "  #{index} {}: {} line(s), {} component(s)",
            message.id.cyan(),
            message.content.len(),
            components
        );
    }
    println!("{} manifest is valid", "✓".green().bold());
    Ok(())
}
