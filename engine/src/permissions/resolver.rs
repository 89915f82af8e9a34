//! Permission resolution logic.
//!
//! Computes effective permissions for a member in a guild/channel context.

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::guild::GuildPermissions;
use super::models::{ChannelSnapshot, GuildSnapshot, MemberSnapshot, Role};
use super::overrides::{CombinedOverride, OverrideHolder};

/// Structural misuse of the engine.
///
/// A legitimate "no" is never reported through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Snapshot belongs to guild {found}, expected guild {expected}")]
    GuildMismatch { expected: Uuid, found: Uuid },

    #[error("Role {role_id} does not exist in guild {guild_id}")]
    UnknownRole { guild_id: Uuid, role_id: Uuid },

    #[error("Role {role_id} belongs to guild {guild_id}")]
    ForeignRole { role_id: Uuid, guild_id: Uuid },

    #[error("Guild {0} has no public role")]
    MissingPublicRole(Uuid),

    #[error("Guild {0} has more than one public role")]
    MultiplePublicRoles(Uuid),

    #[error("Public role {role_id} must share the id of guild {guild_id}")]
    PublicRoleIdMismatch { guild_id: Uuid, role_id: Uuid },

    #[error("Role {0} appears more than once")]
    DuplicateRole(Uuid),

    #[error("Channel {channel_id} has more than one override for {holder:?}")]
    DuplicateOverride {
        channel_id: Uuid,
        holder: OverrideHolder,
    },

    #[error("Override for {holder:?} both allows and denies {overlap:?}")]
    OverlappingOverride {
        holder: OverrideHolder,
        overlap: GuildPermissions,
    },
}

/// Base permissions: the public role OR'ed with every explicit role.
fn base_permissions(guild: &GuildSnapshot, roles: &[&Role]) -> GuildPermissions {
    roles
        .iter()
        .fold(guild.public_role().permissions, |acc, role| acc | role.permissions)
}

/// Compute guild-scope permissions for a member.
///
/// Resolution order:
/// 1. Guild owner has all permissions
/// 2. Start with the public role's permissions
/// 3. Add permissions from every assigned role
/// 4. `ADMINISTRATOR` in the result grants all permissions
#[tracing::instrument(skip_all, fields(guild_id = %guild.id(), user_id = %member.user_id()))]
pub fn resolve_guild_permissions(
    guild: &GuildSnapshot,
    member: &MemberSnapshot,
) -> Result<GuildPermissions, PermissionError> {
    let roles = guild.member_roles(member)?;

    // Guild owner has everything
    if guild.is_owner(member.user_id()) {
        return Ok(GuildPermissions::all());
    }

    let perms = base_permissions(guild, &roles);
    if perms.has(GuildPermissions::ADMINISTRATOR) {
        return Ok(GuildPermissions::all());
    }

    Ok(perms)
}

/// Compute channel-scope permissions for a member.
///
/// Starting from the base permissions, overrides are applied in tiers,
/// each as deny-then-allow:
/// 1. The public role's override
/// 2. The union of overrides for the member's explicit roles (allow wins
///    over deny across roles)
/// 3. The member's own override
///
/// Owners and holders of `ADMINISTRATOR` skip overrides entirely.
#[tracing::instrument(
    skip_all,
    fields(guild_id = %guild.id(), user_id = %member.user_id(), channel_id = %channel.id())
)]
pub fn resolve_channel_permissions(
    guild: &GuildSnapshot,
    member: &MemberSnapshot,
    channel: &ChannelSnapshot,
) -> Result<GuildPermissions, PermissionError> {
    if let Err(e) = guild.ensure_guild(channel.guild_id()) {
        tracing::warn!(error = %e, "Channel resolved against the wrong guild");
        return Err(e);
    }

    // Role overrides must point at roles of this guild
    for ovr in channel.overrides() {
        if let OverrideHolder::Role(role_id) = ovr.holder() {
            if guild.role(role_id).is_none() {
                return Err(PermissionError::UnknownRole {
                    guild_id: guild.id(),
                    role_id,
                });
            }
        }
    }

    let roles = guild.member_roles(member)?;

    if guild.is_owner(member.user_id()) {
        return Ok(GuildPermissions::all());
    }

    let base = base_permissions(guild, &roles);
    if base.has(GuildPermissions::ADMINISTRATOR) {
        debug!("Administrator bypasses channel overrides");
        return Ok(GuildPermissions::all());
    }

    let mut perms = base;

    let public_holder = OverrideHolder::Role(guild.public_role().id);
    if let Some(ovr) = channel.override_for(public_holder) {
        perms = ovr.apply(perms);
        debug!(
            allowed = ovr.allowed().raw(),
            denied = ovr.denied().raw(),
            "Applied public role override"
        );
    }

    let role_overrides = CombinedOverride::combine(channel.overrides().iter().filter(|o| {
        matches!(o.holder(), OverrideHolder::Role(id) if member.has_role(id))
    }));
    if !role_overrides.is_empty() {
        perms = role_overrides.apply(perms);
        debug!(
            allowed = role_overrides.allowed.raw(),
            denied = role_overrides.denied.raw(),
            "Applied role overrides"
        );
    }

    if let Some(ovr) = channel.override_for(OverrideHolder::Member(member.user_id())) {
        perms = ovr.apply(perms);
        debug!(
            allowed = ovr.allowed().raw(),
            denied = ovr.denied().raw(),
            "Applied member override"
        );
    }

    Ok(perms)
}
