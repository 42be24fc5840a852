//! Department button: tells the presser who can grant them the Department role.

use async_trait::async_trait;
use std::sync::Arc;

use super::{ButtonHandler, Command, CommandContext, CommandSpec, Permission, Reply};
use crate::error::Result;

pub const NAME: &str = "bntDepartment";

pub const STUDENT_ROLE: &str = "Student";
pub const GUEST_ROLE: &str = "Guest";
pub const DEPARTMENT_ROLE: &str = "Department";
pub const ROOT_ROLE: &str = "Root";

pub fn command() -> Command {
    Command::Button(CommandSpec::new(NAME, Permission::Anyone, Arc::new(DepartmentButton)))
}

pub struct DepartmentButton;

#[async_trait]
impl ButtonHandler for DepartmentButton {
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        if ctx.has_role(STUDENT_ROLE) {
            return Ok(Reply::silent("Students cannot join the Department."));
        }
        if ctx.has_role(GUEST_ROLE) {
            return Ok(Reply::silent("Guests cannot join the Department."));
        }
        if ctx.has_role(DEPARTMENT_ROLE) {
            return Ok(Reply::silent("You are already a member of the Department."));
        }

        let guild_id = ctx.guild_id()?;
        let department_id = ctx.config.roles.require(DEPARTMENT_ROLE)?;
        let root_id = ctx.config.roles.require(ROOT_ROLE)?;

        let mut contacts: Vec<_> = ctx
            .platform
            .list_members(guild_id)
            .await?
            .into_iter()
            .filter(|member| member.has_role(department_id) || member.has_role(root_id))
            .collect();
        // Department members first, then root-only members
        contacts.sort_by_key(|member| !member.has_role(department_id));

        if contacts.is_empty() {
            return Ok(Reply::silent(
                "Nobody can assign this role right now, please try again later.",
            ));
        }

        let mentions: Vec<String> = contacts.iter().map(|member| member.mention()).collect();
        Ok(Reply::silent(format!(
            "To get this role, contact one of these users: {}.",
            mentions.join(", ")
        )))
    }
}
