//! Message management for a moderated Discord guild.
//!
//! The crate renders mention templates, builds interactive components,
//! synchronizes bot messages from remote manifests and dispatches the
//! permission-gated commands that drive all of it.

pub mod command;
pub mod components;
pub mod config;
pub mod error;
pub mod fetch;
mod http_client;
pub mod manifest;
pub mod platform;
pub mod sync;
pub mod template;

#[cfg(any(test, feature = "test-utils"))]
pub mod testkit;

pub use config::BotConfig;
pub use error::{BotError, ErrorKind, Result};
pub use manifest::TextFile;
pub use sync::{BatchSynchronizer, SyncOptions, SyncReport};
