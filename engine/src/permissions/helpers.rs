//! Permission helper functions for command handlers.
//!
//! Provides convenience functions to resolve and check permissions in a
//! single operation.

use uuid::Uuid;

use super::guild::GuildPermissions;
use super::hierarchy::highest_role;
use super::interaction::AccessError;
use super::models::{ChannelSnapshot, GuildSnapshot, MemberSnapshot};
use super::resolver::{resolve_channel_permissions, resolve_guild_permissions, PermissionError};

/// Pre-computed permission context for a guild member.
///
/// Contains everything needed for repeated guild-scope checks without
/// resolving again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPermissionContext {
    pub guild_id: Uuid,
    pub user_id: Uuid,

    /// Resolved guild-scope permissions.
    pub computed_permissions: GuildPermissions,

    /// The member's most senior role (the public role if they have none).
    pub highest_role_id: Uuid,

    /// Position of `highest_role_id`.
    pub highest_role_position: i32,

    /// Whether this member is the guild owner.
    pub is_owner: bool,
}

impl MemberPermissionContext {
    /// Resolve a member's context.
    #[tracing::instrument(skip_all, fields(guild_id = %guild.id(), user_id = %member.user_id()))]
    pub fn build(guild: &GuildSnapshot, member: &MemberSnapshot) -> Result<Self, PermissionError> {
        let computed_permissions = resolve_guild_permissions(guild, member)?;
        let top = highest_role(guild, member)?;

        Ok(Self {
            guild_id: guild.id(),
            user_id: member.user_id(),
            computed_permissions,
            highest_role_id: top.id,
            highest_role_position: top.position,
            is_owner: guild.is_owner(member.user_id()),
        })
    }

    /// Check if the member has the specified permission.
    #[must_use]
    pub const fn has_permission(&self, permission: GuildPermissions) -> bool {
        self.computed_permissions.has(permission)
    }

    /// Require that the member has the specified permission.
    pub const fn require_permission(&self, permission: GuildPermissions) -> Result<(), AccessError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AccessError::MissingPermission(permission))
        }
    }
}

/// Resolve channel permissions and require `required`.
///
/// Returns the full resolved mask on success.
pub fn require_channel_permission(
    guild: &GuildSnapshot,
    member: &MemberSnapshot,
    channel: &ChannelSnapshot,
    required: GuildPermissions,
) -> Result<GuildPermissions, AccessError> {
    let perms = resolve_channel_permissions(guild, member, channel)?;

    if perms.has(required) {
        Ok(perms)
    } else {
        Err(AccessError::MissingPermission(required - perms))
    }
}

/// Channels in which the member holds `VIEW_CHANNEL`.
pub fn filter_accessible_channels<'c>(
    guild: &GuildSnapshot,
    member: &MemberSnapshot,
    channels: &'c [ChannelSnapshot],
) -> Result<Vec<&'c ChannelSnapshot>, PermissionError> {
    let mut accessible = Vec::with_capacity(channels.len());

    for channel in channels {
        if resolve_channel_permissions(guild, member, channel)?.has(GuildPermissions::VIEW_CHANNEL) {
            accessible.push(channel);
        }
    }

    tracing::debug!(
        total = channels.len(),
        accessible = accessible.len(),
        "Filtered channels by VIEW_CHANNEL"
    );

    Ok(accessible)
}
