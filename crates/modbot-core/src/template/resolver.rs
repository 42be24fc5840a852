use serde::{Deserialize, Serialize};

/// The fixed set of mention tags understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentionKind {
    Role,
    Channel,
    Member,
}

impl MentionKind {
    /// Substitution order used by [`render`](super::render).
    pub const RENDER_ORDER: [MentionKind; 3] = [Self::Role, Self::Channel, Self::Member];

    pub fn tag_name(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Channel => "channel",
            Self::Member => "mention",
        }
    }

    /// Platform mention token for an entity id.
    pub fn token(&self, id: &str) -> String {
        match self {
            Self::Role => format!("<@&{id}>"),
            Self::Channel => format!("<#{id}>"),
            Self::Member => format!("<@{id}>"),
        }
    }
}

impl std::fmt::Display for MentionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// What to do with a tag whose payload matches no entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedTags {
    /// Leave the tag text verbatim and log a warning.
    #[default]
    Keep,
    /// Fail the render with a validation error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: String,
    /// Names the entity can be referenced by (role/channel name, username, nickname...)
    pub names: Vec<String>,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            names: vec![name.into()],
        }
    }

    pub fn with_alias(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }
}

/// Name-or-id lookup table for one entity type of a guild.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look an entity up by id, then by exact name, then case-insensitively.
    pub fn find(&self, token: &str) -> Option<&DirectoryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.id == token)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|entry| entry.names.iter().any(|name| name == token))
            })
            .or_else(|| {
                let lowered = token.to_lowercase();
                self.entries.iter().find(|entry| {
                    entry
                        .names
                        .iter()
                        .any(|name| name.to_lowercase() == lowered)
                })
            })
    }
}

impl FromIterator<DirectoryEntry> for Directory {
    fn from_iter<I: IntoIterator<Item = DirectoryEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Lookup tables of a single guild. Any table may be missing, e.g. when a
/// command runs outside a guild; rendering then fails.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub channels: Option<Directory>,
    pub roles: Option<Directory>,
    pub members: Option<Directory>,
}

impl ResolutionContext {
    /// Context with no lookup tables at all.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn new(channels: Directory, roles: Directory, members: Directory) -> Self {
        Self {
            channels: Some(channels),
            roles: Some(roles),
            members: Some(members),
        }
    }

    pub fn table(&self, kind: MentionKind) -> Option<&Directory> {
        match kind {
            MentionKind::Role => self.roles.as_ref(),
            MentionKind::Channel => self.channels.as_ref(),
            MentionKind::Member => self.members.as_ref(),
        }
    }
}
