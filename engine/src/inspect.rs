//! Permission inspection over an exported snapshot bundle.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::permissions::{
    highest_role, resolve_channel_permissions, resolve_guild_permissions, PermissionError,
    SnapshotBundle,
};

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Member {0} is not part of the snapshot")]
    UnknownMember(Uuid),

    #[error("Channel {0} is not part of the snapshot")]
    UnknownChannel(Uuid),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub position: i32,
}

/// Resolved permissions of one member.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub guild_id: Uuid,
    pub member_id: Uuid,
    pub channel_id: Option<Uuid>,
    pub is_owner: bool,
    pub raw: u64,
    pub permissions: Vec<&'static str>,
    pub highest_role: RoleSummary,
}

/// Read and validate a snapshot bundle from disk.
pub fn load_bundle(path: &Path) -> anyhow::Result<SnapshotBundle> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid snapshot file {}", path.display()))
}

/// Resolve a member's permissions at guild scope, or in `channel_id`.
#[tracing::instrument(skip(bundle), fields(guild_id = %bundle.guild.id()))]
pub fn inspect(
    bundle: &SnapshotBundle,
    member_id: Uuid,
    channel_id: Option<Uuid>,
) -> Result<InspectionReport, InspectError> {
    let guild = &bundle.guild;
    let member = bundle
        .member(member_id)
        .ok_or(InspectError::UnknownMember(member_id))?;

    let permissions = match channel_id {
        Some(id) => {
            let channel = bundle.channel(id).ok_or(InspectError::UnknownChannel(id))?;
            resolve_channel_permissions(guild, member, channel)?
        }
        None => resolve_guild_permissions(guild, member)?,
    };
    let top = highest_role(guild, member)?;

    Ok(InspectionReport {
        guild_id: guild.id(),
        member_id,
        channel_id,
        is_owner: guild.is_owner(member_id),
        raw: permissions.raw(),
        permissions: permissions.names(),
        highest_role: RoleSummary {
            id: top.id,
            name: top.name.clone(),
            position: top.position,
        },
    })
}
