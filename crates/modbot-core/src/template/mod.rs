//! Mention templating
//!
//! Authored text references guild entities with three fixed tags:
//!
//! ```text
//! {role:Moderator}   -> <@&role_id>
//! {channel:rules}    -> <#channel_id>
//! {mention:alice}    -> <@user_id>
//! ```
//!
//! Payloads are ids or names. Tags are substituted in the order role,
//! channel, mention. There are no loops or conditionals.

mod parser;
mod resolver;

pub use parser::{parse_by_tag, replace_tags};
pub use resolver::{Directory, DirectoryEntry, MentionKind, ResolutionContext, UnresolvedTags};

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{BotError, Result};

/// Render every mention tag in `text` into platform mention tokens.
///
/// Fails without substituting anything when any lookup table is missing.
pub fn render(text: &str, context: &ResolutionContext, policy: UnresolvedTags) -> Result<String> {
    for kind in MentionKind::RENDER_ORDER {
        if context.table(kind).is_none() {
            return Err(BotError::Templating(format!(
                "no {kind} lookup table available outside a guild"
            )));
        }
    }

    let mut rendered = text.to_string();
    for kind in MentionKind::RENDER_ORDER {
        let Some(table) = context.table(kind) else {
            continue;
        };

        let payloads = parse_by_tag(&rendered, kind.tag_name());
        if payloads.is_empty() {
            continue;
        }

        let mut replacements = HashMap::with_capacity(payloads.len());
        for payload in payloads {
            match table.find(&payload) {
                Some(entry) => {
                    replacements.insert(payload, kind.token(&entry.id));
                }
                None if policy == UnresolvedTags::Reject => {
                    return Err(BotError::Validation(format!(
                        "unknown {kind} '{payload}'"
                    )));
                }
                None => warn!("Leaving unresolved {} tag '{}' as is", kind, payload),
            }
        }

        debug!("Resolved {} {} tag(s)", replacements.len(), kind);
        rendered = replace_tags(&rendered, kind.tag_name(), &replacements);
    }

    Ok(rendered)
}

/// Reject text longer than `limit` characters.
pub fn ensure_length(text: &str, limit: usize) -> Result<()> {
    let length = text.chars().count();
    if length > limit {
        return Err(BotError::MessageTooLong { length, limit });
    }
    Ok(())
}
