//! Hierarchy-sensitive interaction checks.
//!
//! Decides whether one holder (role or member) may act on another: kick,
//! ban, time out or move a member, or edit, delete or reorder a role.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::guild::GuildPermissions;
use super::hierarchy::{highest_role, precedence};
use super::models::{GuildSnapshot, MemberSnapshot, Role};
use super::resolver::{resolve_guild_permissions, PermissionError};

/// Anything permissions or overrides attach to.
#[derive(Debug, Clone, Copy)]
pub enum Holder<'a> {
    Role(&'a Role),
    Member(&'a MemberSnapshot),
}

impl Holder<'_> {
    #[must_use]
    pub const fn guild_id(&self) -> Uuid {
        match self {
            Self::Role(role) => role.guild_id,
            Self::Member(member) => member.guild_id(),
        }
    }

    fn is_owner(&self, guild: &GuildSnapshot) -> bool {
        match self {
            Self::Role(_) => false,
            Self::Member(member) => guild.is_owner(member.user_id()),
        }
    }

    /// The snapshot's role this holder ranks as.
    ///
    /// Role holders are looked up by id, so only what the snapshot vouches
    /// for decides the outcome.
    fn rank<'g>(&self, guild: &'g GuildSnapshot) -> Result<&'g Role, PermissionError> {
        match *self {
            Self::Role(role) => known_role(guild, role),
            Self::Member(member) => highest_role(guild, member),
        }
    }
}

/// Look `role` up in `guild` by id.
fn known_role<'g>(guild: &'g GuildSnapshot, role: &Role) -> Result<&'g Role, PermissionError> {
    guild.role(role.id).ok_or(PermissionError::UnknownRole {
        guild_id: guild.id(),
        role_id: role.id,
    })
}

impl<'a> From<&'a Role> for Holder<'a> {
    fn from(role: &'a Role) -> Self {
        Self::Role(role)
    }
}

impl<'a> From<&'a MemberSnapshot> for Holder<'a> {
    fn from(member: &'a MemberSnapshot) -> Self {
        Self::Member(member)
    }
}

/// Check if `actor` may perform a hierarchy-sensitive action on `target`.
///
/// Rules, first match wins:
/// 1. Holders from another guild, or roles the snapshot does not hold, are
///    rejected with an error
/// 2. The guild owner may act on anything
/// 3. Nobody else may act on the owner
/// 4. Managed roles cannot be acted on
/// 5. The actor's top role must be strictly senior to the target's
pub fn can_interact(
    guild: &GuildSnapshot,
    actor: Holder<'_>,
    target: Holder<'_>,
) -> Result<bool, PermissionError> {
    for holder in [&actor, &target] {
        if let Err(e) = guild.ensure_guild(holder.guild_id()) {
            tracing::warn!(error = %e, "Interaction check across guilds");
            return Err(e);
        }
    }

    let actor_rank = actor.rank(guild)?;
    let target_rank = target.rank(guild)?;

    if actor.is_owner(guild) {
        return Ok(true);
    }
    if target.is_owner(guild) {
        return Ok(false);
    }
    if matches!(target, Holder::Role(_)) && target_rank.managed {
        return Ok(false);
    }

    Ok(precedence(actor_rank, target_rank) == Ordering::Greater)
}

/// Moderation actions against a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Kick,
    Ban,
    Timeout,
    /// Move between voice channels
    Move,
}

impl ModerationAction {
    /// Permission the actor must hold.
    #[must_use]
    pub const fn required_permission(&self) -> GuildPermissions {
        match self {
            Self::Kick => GuildPermissions::KICK_MEMBERS,
            Self::Ban => GuildPermissions::BAN_MEMBERS,
            Self::Timeout => GuildPermissions::MODERATE_MEMBERS,
            Self::Move => GuildPermissions::MOVE_MEMBERS,
        }
    }

    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Ban => "ban",
            Self::Timeout => "timeout",
            Self::Move => "move",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Kick, Self::Ban, Self::Timeout, Self::Move]
    }
}

/// Reasons an administrative action is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Missing permission: {0:?}")]
    MissingPermission(GuildPermissions),

    #[error("Cannot act on position {target_position} (your position: {actor_position})")]
    RoleHierarchy {
        actor_position: i32,
        target_position: i32,
    },

    #[error("Role {0} is managed by an integration")]
    ManagedRole(Uuid),

    #[error("Cannot grant permissions you don't have: {0:?}")]
    CannotEscalate(GuildPermissions),

    #[error("Permissions not allowed on the public role: {0:?}")]
    ForbiddenForPublicRole(GuildPermissions),

    #[error("Cannot moderate guild owner")]
    CannotModerateOwner,

    #[error(transparent)]
    Invalid(#[from] PermissionError),
}

/// Check if a member can edit (or delete, or reorder) a role.
///
/// Rules:
/// 1. Must have `MANAGE_ROLES`
/// 2. Must be able to interact with the role
/// 3. Cannot grant permissions you don't have
/// 4. The public role never receives `PUBLIC_FORBIDDEN` permissions
#[tracing::instrument(skip_all, fields(guild_id = %guild.id(), user_id = %actor.user_id(), role_id = %target.id))]
pub fn can_manage_role(
    guild: &GuildSnapshot,
    actor: &MemberSnapshot,
    target: &Role,
    new_permissions: Option<GuildPermissions>,
) -> Result<(), AccessError> {
    let actor_perms = resolve_guild_permissions(guild, actor)?;
    guild.ensure_guild(target.guild_id)?;
    let target = known_role(guild, target)?;

    if !actor_perms.has(GuildPermissions::MANAGE_ROLES) {
        return Err(AccessError::MissingPermission(
            GuildPermissions::MANAGE_ROLES,
        ));
    }

    if !can_interact(guild, actor.into(), target.into())? {
        if target.managed {
            return Err(AccessError::ManagedRole(target.id));
        }
        return Err(AccessError::RoleHierarchy {
            actor_position: highest_role(guild, actor)?.position,
            target_position: target.position,
        });
    }

    if let Some(new_perms) = new_permissions {
        let escalation = new_perms - actor_perms;
        if !escalation.is_empty() {
            return Err(AccessError::CannotEscalate(escalation));
        }

        if target.is_public && !new_perms.validate_for_public() {
            return Err(AccessError::ForbiddenForPublicRole(
                new_perms & GuildPermissions::PUBLIC_FORBIDDEN,
            ));
        }
    }

    Ok(())
}

/// Check if a member can moderate another member.
///
/// Rules:
/// 1. Must hold the action's permission
/// 2. Cannot moderate the guild owner
/// 3. Cannot moderate someone with a higher or equal top role
#[tracing::instrument(
    skip_all,
    fields(guild_id = %guild.id(), user_id = %actor.user_id(), target_id = %target.user_id(), action = action.action_name())
)]
pub fn can_moderate_member(
    guild: &GuildSnapshot,
    actor: &MemberSnapshot,
    target: &MemberSnapshot,
    action: ModerationAction,
) -> Result<(), AccessError> {
    let actor_perms = resolve_guild_permissions(guild, actor)?;

    let required = action.required_permission();
    if !actor_perms.has(required) {
        return Err(AccessError::MissingPermission(required));
    }

    if can_interact(guild, actor.into(), target.into())? {
        return Ok(());
    }

    if guild.is_owner(target.user_id()) {
        return Err(AccessError::CannotModerateOwner);
    }

    Err(AccessError::RoleHierarchy {
        actor_position: highest_role(guild, actor)?.position,
        target_position: highest_role(guild, target)?.position,
    })
}
