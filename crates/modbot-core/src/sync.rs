//! Batch synchronizer
//!
//! Drives every message listed in a manifest to its described state. Messages
//! are processed strictly in manifest order, one at a time, and the first
//! failure stops the run. Messages edited before the failure stay edited;
//! re-running the same manifest converges to the same final state.

use tracing::{debug, info, warn};
use url::Url;

use crate::components::{ComponentLimits, build_row};
use crate::config::BotConfig;
use crate::error::{BotError, Result, SyncStep};
use crate::fetch::{RemoteFetcher, fetch_manifest};
use crate::manifest::{TextFile, TextFileMessage};
use crate::platform::{ChannelInfo, MessageEdit, Platform};
use crate::template::{ResolutionContext, UnresolvedTags, ensure_length, render};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub max_message_length: usize,
    pub components: ComponentLimits,
    pub unresolved: UnresolvedTags,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

impl From<&BotConfig> for SyncOptions {
    fn from(config: &BotConfig) -> Self {
        Self {
            max_message_length: config.limits.max_message_length,
            components: config.limits.components.clone(),
            unresolved: config.templating.unresolved,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub channel_id: String,
    /// Ids of the edited messages, in edit order.
    pub edited: Vec<String>,
}

pub struct BatchSynchronizer<'a> {
    platform: &'a dyn Platform,
    fetcher: &'a dyn RemoteFetcher,
    options: SyncOptions,
}

impl<'a> BatchSynchronizer<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        fetcher: &'a dyn RemoteFetcher,
        options: SyncOptions,
    ) -> Self {
        Self {
            platform,
            fetcher,
            options,
        }
    }

    /// Fetch the manifest at `url` and apply it to the guild.
    pub async fn synchronize(&self, url: &Url, guild_id: &str) -> Result<SyncReport> {
        info!("Synchronizing messages from {}", url);
        let manifest = fetch_manifest(self.fetcher, url).await?;
        self.apply(&manifest, guild_id).await
    }

    /// Apply an already parsed manifest.
    pub async fn apply(&self, manifest: &TextFile, guild_id: &str) -> Result<SyncReport> {
        manifest.validate()?;
        let channel = self.target_channel(&manifest.channel_id, guild_id).await?;
        let bot_id = self.platform.bot_user_id().await?;
        let context = self.platform.resolution_context(guild_id).await?;

        let mut report = SyncReport {
            channel_id: channel.id.clone(),
            edited: Vec::with_capacity(manifest.messages.len()),
        };
        for (index, descriptor) in manifest.messages.iter().enumerate() {
            if let Err(err) = self
                .apply_message(index, descriptor, &channel, &bot_id, &context)
                .await
            {
                warn!(
                    "Synchronization stopped after {} of {} message(s): {}",
                    report.edited.len(),
                    manifest.messages.len(),
                    err
                );
                return Err(err);
            }
            report.edited.push(descriptor.id.clone());
        }

        info!(
            "Synchronized {} message(s) in channel {}",
            report.edited.len(),
            channel.id
        );
        Ok(report)
    }

    async fn target_channel(&self, channel_id: &str, guild_id: &str) -> Result<ChannelInfo> {
        let channel = self.platform.fetch_channel(channel_id).await?;
        if channel.guild_id.as_deref() != Some(guild_id) {
            return Err(BotError::ChannelNotFound(channel_id.to_string()));
        }
        if !channel.kind.is_text_based() {
            return Err(BotError::NotTextChannel(channel_id.to_string()));
        }
        Ok(channel)
    }

    async fn apply_message(
        &self,
        index: usize,
        descriptor: &TextFileMessage,
        channel: &ChannelInfo,
        bot_id: &str,
        context: &ResolutionContext,
    ) -> Result<()> {
        let id = descriptor.id.as_str();
        let fail = |step: SyncStep| move |err: BotError| err.at_step(index, id, step);

        let message = self
            .platform
            .fetch_message(&channel.id, id)
            .await
            .map_err(fail(SyncStep::FetchMessage))?;
        if message.author_id != bot_id {
            return Err(BotError::NotOwnMessage.at_step(index, id, SyncStep::VerifyOwnership));
        }

        let row = build_row(descriptor.components.as_ref(), &self.options.components)
            .map_err(fail(SyncStep::BuildComponents))?;

        let content = render(&descriptor.joined_content(), context, self.options.unresolved)
            .and_then(|content| {
                ensure_length(&content, self.options.max_message_length)?;
                Ok(content)
            })
            .map_err(fail(SyncStep::Render))?;

        debug!(
            "Editing message {} ({} component(s))",
            id,
            row.as_ref().map_or(0, |row| row.components.len())
        );
        let edit = MessageEdit::content(content).with_rows_replaced(row);
        self.platform
            .edit_message(&channel.id, id, &edit)
            .await
            .map_err(fail(SyncStep::Edit))
    }
}
