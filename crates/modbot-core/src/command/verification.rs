//! Student verification modal.
//!
//! A user submits the 6-character code they were sent; a valid, unexpired
//! code upgrades them from Guest to Student and is consumed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::department::{GUEST_ROLE, STUDENT_ROLE};
use super::{Command, CommandContext, CommandSpec, ModalFields, ModalHandler, Permission, Reply};
use crate::error::Result;

pub const NAME: &str = "verificationCodeStudentModal";
pub const CODE_FIELD: &str = "verificationCodeStudentInput";
pub const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub user_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Keyed store of pending verification codes.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn find(&self, user_id: &str, code: &str) -> Result<Option<VerificationRecord>>;

    async fn remove(&self, user_id: &str, code: &str) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryVerificationStore {
    records: RwLock<Vec<VerificationRecord>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: VerificationRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn find(&self, user_id: &str, code: &str) -> Result<Option<VerificationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.user_id == user_id && record.code == code)
            .cloned())
    }

    async fn remove(&self, user_id: &str, code: &str) -> Result<()> {
        self.records
            .write()
            .await
            .retain(|record| record.user_id != user_id || record.code != code);
        Ok(())
    }
}

pub fn command(store: Arc<dyn VerificationStore>) -> Command {
    Command::Modal(CommandSpec::new(
        NAME,
        Permission::Anyone,
        Arc::new(VerificationModal { store }),
    ))
}

pub struct VerificationModal {
    store: Arc<dyn VerificationStore>,
}

#[async_trait]
impl ModalHandler for VerificationModal {
    async fn execute(&self, ctx: &CommandContext<'_>, fields: &ModalFields) -> Result<Reply> {
        let user_id = ctx.invoker.user_id.as_str();
        let code = fields.get(CODE_FIELD).map(|code| code.trim()).unwrap_or_default();

        if code.is_empty() {
            return Ok(Reply::silent("No verification code was submitted."));
        }
        if code.chars().count() != CODE_LENGTH {
            return Ok(Reply::silent(format!(
                "The verification code must be exactly {CODE_LENGTH} characters long."
            )));
        }

        let Some(record) = self.store.find(user_id, code).await? else {
            return Ok(Reply::silent("The verification code is not valid."));
        };
        if record.expires_at <= Utc::now() {
            return Ok(Reply::silent("The verification code has expired."));
        }

        let guild_id = ctx.guild_id()?;
        let student_id = ctx.config.roles.require(STUDENT_ROLE)?;
        if ctx.has_role(GUEST_ROLE) {
            let guest_id = ctx.config.roles.require(GUEST_ROLE)?;
            ctx.platform
                .remove_member_role(guild_id, user_id, guest_id)
                .await?;
        }
        ctx.platform
            .add_member_role(guild_id, user_id, student_id)
            .await?;
        self.store.remove(user_id, code).await?;

        info!("User {} verified as student", user_id);
        Ok(Reply::silent("You have been verified successfully!"))
    }
}
